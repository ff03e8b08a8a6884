//! Lightmap executors
//!
//! One contract, several backends: the CPU reference executor, the wgpu
//! compute executor and a fallback decorator that composes the two. Call
//! sites hold a `Box<dyn LightingExecutor>` and never branch on the backend.

pub mod cpu;
pub mod fallback;
pub mod gpu;

pub use cpu::CpuLightingExecutor;
pub use fallback::{FallbackStats, WithFallback};
pub use gpu::GpuLightingExecutor;

use crate::config::LightingConfig;
use crate::error::{computation_error, LightingResult};
use crate::lighting::daylight::apply_sky_spillover;
use crate::lighting::light_map::{clamp_light_map, LightMap};
use crate::lighting::light_source::LightSource;
use crate::lighting::scene::LightingScene;
use crate::lighting::shadows::apply_shadows;
use crate::lighting::tile::Viewport;

/// Universal lightmap interface
pub trait LightingExecutor: Send {
    /// Advance elapsed time by one frame
    fn update(&mut self, delta_time: f32);

    /// Compute the finished light map for `viewport`
    ///
    /// The returned map is `viewport.width * viewport.height` RGB triples,
    /// every channel in [0, 1].
    fn compute_lightmap(
        &mut self,
        scene: &LightingScene<'_>,
        viewport: Viewport,
    ) -> LightingResult<LightMap>;

    fn on_light_added(&mut self, light: &LightSource);

    fn on_light_removed(&mut self, light: &LightSource);

    fn on_light_moved(&mut self, light: &LightSource);

    /// Time of day, region exposure edits and other global changes
    fn on_global_light_changed(&mut self);

    /// Monotonic structural revision
    fn revision(&self) -> u64;

    /// Seconds accumulated through `update`
    fn elapsed_time(&self) -> f64;

    /// Check if this executor runs on an accelerator
    fn is_accelerated(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Shadows, sky spillover and the final clamp
///
/// Every executor finishes its composited map through this pass so the
/// post-processing is identical across backends.
pub fn finish_lightmap(
    light_map: &mut LightMap,
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
) {
    apply_shadows(light_map, scene, viewport, config);
    apply_sky_spillover(light_map, scene, viewport, config);
    clamp_light_map(light_map);
}

/// Reject a map holding NaN or infinite values
pub fn ensure_finite(light_map: &LightMap, backend: &str) -> LightingResult<()> {
    let width = light_map.width().max(1) as usize;
    match light_map.as_slice().iter().position(|v| !v.is_finite()) {
        Some(index) => {
            let tile = index / 3;
            Err(computation_error(
                backend,
                format!(
                    "non-finite light value at tile ({}, {})",
                    tile % width,
                    tile / width
                ),
            ))
        }
        None => Ok(()),
    }
}

/// Validate an accelerator's output buffer
///
/// Non-finite values reject the whole map. Finite values outside [0, 1] are
/// clamped in place.
pub fn validate_lightmap(light_map: &mut LightMap, backend: &str) -> LightingResult<()> {
    ensure_finite(light_map, backend)?;

    let mut clamped = 0usize;
    for value in light_map.as_mut_slice() {
        if !(0.0..=1.0).contains(value) {
            *value = value.clamp(0.0, 1.0);
            clamped += 1;
        }
    }
    if clamped > 0 {
        log::debug!("[{}] Clamped {} out-of-range light values", backend, clamped);
    }
    Ok(())
}

/// Turn a failed frame into "no lighting this frame"
///
/// For callers without a fallback executor: the failure is logged and the
/// frame renders unlit instead of aborting the loop.
pub fn lightmap_or_skip(result: LightingResult<LightMap>) -> Option<LightMap> {
    match result {
        Ok(light_map) => Some(light_map),
        Err(e) => {
            log::warn!("[Lighting] Skipping lighting for this frame: {}", e);
            None
        }
    }
}

/// Build the executor the config asks for
///
/// With `prefer_gpu` the wgpu executor is tried first and wrapped with the
/// CPU executor as fallback; a missing adapter degrades to CPU-only frames.
pub fn create_executor(config: &LightingConfig) -> Box<dyn LightingExecutor> {
    let cpu = Box::new(CpuLightingExecutor::new(config.clone()));
    if !config.prefer_gpu {
        log::info!("[Lighting] Using CPU lighting executor");
        return cpu;
    }

    let gpu = GpuLightingExecutor::new(config.clone())
        .map(|executor| Box::new(executor) as Box<dyn LightingExecutor>);
    Box::new(WithFallback::from_construction(gpu, cpu))
}
