//! Fallback decorator
//!
//! Wraps an accelerated primary executor and a reference secondary. Both
//! executors see every update and notification, so switching between them
//! for a single frame never leaves either one with stale state.

use crate::error::LightingResult;
use crate::lighting::light_map::LightMap;
use crate::lighting::light_source::LightSource;
use crate::lighting::scene::LightingScene;
use crate::lighting::tile::Viewport;

use super::LightingExecutor;

/// Frame counts by the executor that produced them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackStats {
    /// Frames the primary produced
    pub primary_frames: u64,
    /// Frames the primary failed and the secondary produced
    pub fallback_frames: u64,
    /// Frames served by the secondary because the primary never initialized
    pub primary_missing_frames: u64,
}

/// Executor that falls back to `secondary` whenever `primary` cannot deliver
pub struct WithFallback {
    primary: Option<Box<dyn LightingExecutor>>,
    secondary: Box<dyn LightingExecutor>,
    stats: FallbackStats,
}

impl WithFallback {
    pub fn new(primary: Box<dyn LightingExecutor>, secondary: Box<dyn LightingExecutor>) -> Self {
        log::info!(
            "[WithFallback] Using {} with {} fallback",
            primary.name(),
            secondary.name()
        );
        Self {
            primary: Some(primary),
            secondary,
            stats: FallbackStats::default(),
        }
    }

    /// Build from the outcome of constructing the primary
    ///
    /// A failed construction is logged and every frame goes to `secondary`.
    pub fn from_construction(
        primary: LightingResult<Box<dyn LightingExecutor>>,
        secondary: Box<dyn LightingExecutor>,
    ) -> Self {
        match primary {
            Ok(primary) => Self::new(primary, secondary),
            Err(e) => {
                log::warn!(
                    "[WithFallback] Primary executor unavailable, using {}: {}",
                    secondary.name(),
                    e
                );
                Self {
                    primary: None,
                    secondary,
                    stats: FallbackStats::default(),
                }
            }
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn stats(&self) -> FallbackStats {
        self.stats
    }

    fn for_each(&mut self, mut f: impl FnMut(&mut dyn LightingExecutor)) {
        if let Some(primary) = self.primary.as_deref_mut() {
            f(primary);
        }
        f(self.secondary.as_mut());
    }
}

impl LightingExecutor for WithFallback {
    fn update(&mut self, delta_time: f32) {
        self.for_each(|executor| executor.update(delta_time));
    }

    fn compute_lightmap(
        &mut self,
        scene: &LightingScene<'_>,
        viewport: Viewport,
    ) -> LightingResult<LightMap> {
        match self.primary.as_deref_mut() {
            Some(primary) => match primary.compute_lightmap(scene, viewport) {
                Ok(light_map) => {
                    self.stats.primary_frames += 1;
                    return Ok(light_map);
                }
                Err(e) if e.is_recoverable() => {
                    self.stats.fallback_frames += 1;
                    log::warn!(
                        "[WithFallback] {} failed, computing this frame on {}: {}",
                        primary.name(),
                        self.secondary.name(),
                        e
                    );
                }
                Err(e) => return Err(e),
            },
            None => self.stats.primary_missing_frames += 1,
        }

        self.secondary.compute_lightmap(scene, viewport)
    }

    fn on_light_added(&mut self, light: &LightSource) {
        self.for_each(|executor| executor.on_light_added(light));
    }

    fn on_light_removed(&mut self, light: &LightSource) {
        self.for_each(|executor| executor.on_light_removed(light));
    }

    fn on_light_moved(&mut self, light: &LightSource) {
        self.for_each(|executor| executor.on_light_moved(light));
    }

    fn on_global_light_changed(&mut self) {
        self.for_each(|executor| executor.on_global_light_changed());
    }

    fn revision(&self) -> u64 {
        self.secondary.revision()
    }

    fn elapsed_time(&self) -> f64 {
        self.secondary.elapsed_time()
    }

    fn is_accelerated(&self) -> bool {
        self.primary
            .as_ref()
            .map(|primary| primary.is_accelerated())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        match &self.primary {
            Some(primary) => primary.name(),
            None => self.secondary.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightingConfig;
    use crate::error::{computation_error, init_error, LightingError};
    use crate::executor::CpuLightingExecutor;
    use crate::lighting::scene::GridMap;

    /// Fails every frame listed in `fail_on` (zero-based)
    struct Flaky {
        frame: u64,
        fail_on: Vec<u64>,
        updates: u32,
        notifications: u32,
        fatal: bool,
    }

    impl Flaky {
        fn new(fail_on: Vec<u64>) -> Self {
            Self {
                frame: 0,
                fail_on,
                updates: 0,
                notifications: 0,
                fatal: false,
            }
        }
    }

    impl LightingExecutor for Flaky {
        fn update(&mut self, _delta_time: f32) {
            self.updates += 1;
        }

        fn compute_lightmap(
            &mut self,
            _scene: &LightingScene<'_>,
            viewport: Viewport,
        ) -> LightingResult<LightMap> {
            let frame = self.frame;
            self.frame += 1;
            if self.fail_on.contains(&frame) {
                if self.fatal {
                    return Err(LightingError::ConfigParse("bad".to_string()));
                }
                return Err(computation_error("flaky", "NaN in output"));
            }
            Ok(LightMap::filled(viewport.width, viewport.height, 0.9))
        }

        fn on_light_added(&mut self, _light: &LightSource) {
            self.notifications += 1;
        }

        fn on_light_removed(&mut self, _light: &LightSource) {
            self.notifications += 1;
        }

        fn on_light_moved(&mut self, _light: &LightSource) {
            self.notifications += 1;
        }

        fn on_global_light_changed(&mut self) {
            self.notifications += 1;
        }

        fn revision(&self) -> u64 {
            self.notifications as u64
        }

        fn elapsed_time(&self) -> f64 {
            0.0
        }

        fn is_accelerated(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn cpu() -> Box<dyn LightingExecutor> {
        Box::new(CpuLightingExecutor::new(LightingConfig::default()))
    }

    #[test]
    fn test_fallback_on_single_frame() {
        let map = GridMap::new(4, 4);
        let scene = LightingScene::new(&[], &map, &map);
        let viewport = Viewport::new(0, 0, 4, 4);
        let mut executor = WithFallback::new(Box::new(Flaky::new(vec![1])), cpu());

        let first = executor.compute_lightmap(&scene, viewport).unwrap();
        let second = executor.compute_lightmap(&scene, viewport).unwrap();
        let third = executor.compute_lightmap(&scene, viewport).unwrap();

        assert_eq!(first.get(0, 0).x, 0.9);
        // Secondary renders the ambient level
        assert!((second.get(0, 0).x - 0.1).abs() < 1e-6);
        assert_eq!(third.get(0, 0).x, 0.9);

        let stats = executor.stats();
        assert_eq!(stats.primary_frames, 2);
        assert_eq!(stats.fallback_frames, 1);
        assert_eq!(stats.primary_missing_frames, 0);
        assert!(executor.is_accelerated());
    }

    #[test]
    fn test_missing_primary() {
        let map = GridMap::new(4, 4);
        let scene = LightingScene::new(&[], &map, &map);
        let mut executor = WithFallback::from_construction(Err(init_error("gpu", "no adapter")), cpu());

        assert!(!executor.has_primary());
        assert!(!executor.is_accelerated());
        assert_eq!(executor.name(), "cpu");
        executor.compute_lightmap(&scene, Viewport::new(0, 0, 4, 4)).unwrap();
        assert_eq!(executor.stats().primary_missing_frames, 1);
    }

    #[test]
    fn test_non_recoverable_errors_propagate() {
        let map = GridMap::new(4, 4);
        let scene = LightingScene::new(&[], &map, &map);
        let mut flaky = Flaky::new(vec![0]);
        flaky.fatal = true;
        let mut executor = WithFallback::new(Box::new(flaky), cpu());

        let result = executor.compute_lightmap(&scene, Viewport::new(0, 0, 4, 4));
        assert!(matches!(result, Err(LightingError::ConfigParse(_))));
        assert_eq!(executor.stats().fallback_frames, 0);
    }

    #[test]
    fn test_notifications_reach_both_executors() {
        let mut executor = WithFallback::new(Box::new(Flaky::new(vec![])), cpu());
        executor.update(0.5);
        executor.on_global_light_changed();
        executor.on_global_light_changed();

        assert_eq!(executor.revision(), 2);
        assert_eq!(executor.elapsed_time(), 0.5);
    }
}
