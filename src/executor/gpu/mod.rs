//! wgpu compute lightmap executor
//!
//! The per-tile composition (ambient, sunlight, static and dynamic point
//! lights) runs in a compute pass. Flicker and daylight attenuation are
//! evaluated on the host and baked into each uploaded light color, and the
//! result is finished with the same shadow and spillover pass as the CPU
//! executor, so both produce the same map.

pub mod types;

pub use types::{CompositeParams, GpuPointLight};

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::config::LightingConfig;
use crate::constants::gpu::{OUTPUT_TEXEL_BYTES, WORKGROUP_SIZE};
use crate::error::{computation_error, init_error, LightingErrorContext, LightingResult};
use crate::lighting::daylight::sun_factor;
use crate::lighting::dynamic_layer::prepare_dynamic_lights;
use crate::lighting::flicker::FlickerNoise;
use crate::lighting::light_map::LightMap;
use crate::lighting::light_source::LightSource;
use crate::lighting::revision::RevisionCoordinator;
use crate::lighting::scene::LightingScene;
use crate::lighting::tile::Viewport;

use super::{ensure_finite, finish_lightmap, validate_lightmap, LightingExecutor};

const BACKEND: &str = "gpu";

/// GPU-accelerated lighting executor
pub struct GpuLightingExecutor {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    /// Composition pipeline
    pipeline: wgpu::ComputePipeline,

    /// Bind group layout: params, lights, sun factors, output
    bind_group_layout: wgpu::BindGroupLayout,

    config: LightingConfig,
    elapsed_time: f64,
    noise: FlickerNoise,
    revisions: RevisionCoordinator,
}

impl GpuLightingExecutor {
    /// Acquire an adapter and device and build the pipeline
    pub fn new(config: LightingConfig) -> LightingResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| init_error(BACKEND, "no compatible adapter"))?;

        let info = adapter.get_info();
        log::info!(
            "[GpuLighting] Using adapter {} ({:?})",
            info.name,
            info.backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Lighting Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| init_error(BACKEND, format!("device request failed: {}", e)))?;

        Self::with_device(Arc::new(device), Arc::new(queue), config)
    }

    /// Build on an existing device, e.g. the renderer's
    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: LightingConfig,
    ) -> LightingResult<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Light Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/light_composite.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Light Composite Bind Group Layout"),
            entries: &[
                // Composite params
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Point lights
                storage_entry(1, true),
                // Sun factors
                storage_entry(2, true),
                // Output texels
                storage_entry(3, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Light Composite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Light Composite Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "composite_lights",
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(init_error(BACKEND, format!("pipeline creation failed: {}", error)));
        }

        let noise = FlickerNoise::new(config.flicker_seed);
        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            config,
            elapsed_time: 0.0,
            noise,
            revisions: RevisionCoordinator::new(),
        })
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Reject viewports the device cannot hold in one dispatch
    fn check_limits(&self, viewport: Viewport) -> LightingResult<()> {
        let limits = self.device.limits();
        let output_bytes = viewport.tile_count() as u64 * OUTPUT_TEXEL_BYTES;
        let max_binding = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        if output_bytes > max_binding {
            return Err(computation_error(
                BACKEND,
                format!(
                    "viewport {}x{} needs {} bytes, device allows {}",
                    viewport.width, viewport.height, output_bytes, max_binding
                ),
            ));
        }

        let (groups_x, groups_y) = workgroup_counts(viewport);
        let max_groups = limits.max_compute_workgroups_per_dimension;
        if groups_x > max_groups || groups_y > max_groups {
            return Err(computation_error(
                BACKEND,
                format!("viewport {}x{} exceeds dispatch limits", viewport.width, viewport.height),
            ));
        }
        Ok(())
    }

    /// Upload, dispatch and read back the composited map
    fn composite(&self, scene: &LightingScene<'_>, viewport: Viewport) -> LightingResult<LightMap> {
        self.check_limits(viewport)?;

        let mut lights: Vec<GpuPointLight> = scene
            .static_lights()
            .filter(|l| {
                l.point()
                    .map(|p| p.radius > 0.0 && viewport.intersects_circle(p.position, p.radius))
                    .unwrap_or(false)
            })
            .filter_map(|l| GpuPointLight::from_static(l, viewport))
            .collect();
        let static_count = lights.len() as u32;
        lights.extend(
            prepare_dynamic_lights(scene, viewport, &self.noise, self.elapsed_time, &self.config)
                .iter()
                .map(|l| GpuPointLight::from_prepared(l, viewport)),
        );
        let light_count = lights.len() as u32;
        if lights.is_empty() {
            // Storage bindings cannot be empty
            lights.push(GpuPointLight::default());
        }

        let power = self.config.sky_exposure_power;
        let sun_factors: Vec<f32> = (0..viewport.height)
            .flat_map(|y| (0..viewport.width).map(move |x| (x, y)))
            .map(|(x, y)| sun_factor(scene.tiles, viewport.to_world(x, y), power))
            .collect();

        let params = CompositeParams {
            sun_color: scene.sun_color().extend(0.0).to_array(),
            ambient: self.config.ambient_light,
            width: viewport.width,
            height: viewport.height,
            static_count,
            light_count,
            _padding: [0; 3],
        };

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let params_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Composite Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let lights_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Composite Lights"),
            contents: bytemuck::cast_slice(&lights),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let sun_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Composite Sun Factors"),
            contents: bytemuck::cast_slice(&sun_factors),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let output_size = viewport.tile_count() as u64 * OUTPUT_TEXEL_BYTES;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Composite Output"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let download_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Composite Download"),
            size: output_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Light Composite Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: sun_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Light Composite Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Light Composite Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            let (groups_x, groups_y) = workgroup_counts(viewport);
            compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        encoder.copy_buffer_to_buffer(&output_buffer, 0, &download_buffer, 0, output_size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            return Err(computation_error(BACKEND, format!("dispatch failed: {}", error)));
        }

        let buffer_slice = download_buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            if tx.send(result).is_err() {
                log::error!("[GpuLighting] Failed to send map_async result - receiver dropped");
            }
        });

        self.device.poll(wgpu::Maintain::Wait);

        pollster::block_on(rx)
            .computation_context(BACKEND, "map_async callback dropped")?
            .computation_context(BACKEND, "readback mapping failed")?;

        let data = buffer_slice.get_mapped_range();
        let texels: &[[f32; 4]] = bytemuck::cast_slice(&data);
        let rgb: Vec<f32> = texels.iter().flat_map(|t| [t[0], t[1], t[2]]).collect();
        drop(data);
        download_buffer.unmap();

        LightMap::from_raw(viewport.width, viewport.height, rgb)
            .computation_context(BACKEND, "readback size mismatch")
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Workgroups needed to cover `viewport`
pub fn workgroup_counts(viewport: Viewport) -> (u32, u32) {
    (
        viewport.width.div_ceil(WORKGROUP_SIZE),
        viewport.height.div_ceil(WORKGROUP_SIZE),
    )
}

impl LightingExecutor for GpuLightingExecutor {
    fn update(&mut self, delta_time: f32) {
        self.elapsed_time += delta_time.max(0.0) as f64;
    }

    fn compute_lightmap(
        &mut self,
        scene: &LightingScene<'_>,
        viewport: Viewport,
    ) -> LightingResult<LightMap> {
        if viewport.is_empty() {
            return Ok(LightMap::filled(viewport.width, viewport.height, 0.0));
        }

        let mut light_map = self.composite(scene, viewport)?;
        // Checked before post-processing, max-blending would hide a NaN
        ensure_finite(&light_map, BACKEND)?;
        finish_lightmap(&mut light_map, scene, viewport, &self.config);
        validate_lightmap(&mut light_map, BACKEND)?;
        Ok(light_map)
    }

    fn on_light_added(&mut self, light: &LightSource) {
        self.revisions.on_light_added(light);
    }

    fn on_light_removed(&mut self, light: &LightSource) {
        self.revisions.on_light_removed(light);
    }

    fn on_light_moved(&mut self, light: &LightSource) {
        self.revisions.on_light_moved(light);
    }

    fn on_global_light_changed(&mut self) {
        self.revisions.on_global_light_changed();
    }

    fn revision(&self) -> u64 {
        self.revisions.revision()
    }

    fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    fn is_accelerated(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "gpu"
    }
}
