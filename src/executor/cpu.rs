//! Reference CPU executor
//!
//! Runs the full pipeline on the host: cached static layer, dynamic lights,
//! shadows, spillover, clamp. It has no recoverable failure path.

use crate::config::LightingConfig;
use crate::error::LightingResult;
use crate::lighting::dynamic_layer::compute_dynamic_layer;
use crate::lighting::flicker::FlickerNoise;
use crate::lighting::layer_cache::CacheStats;
use crate::lighting::light_map::{is_finite_light_map, LightMap};
use crate::lighting::light_source::LightSource;
use crate::lighting::revision::{MutationCounts, RevisionCoordinator};
use crate::lighting::scene::LightingScene;
use crate::lighting::static_layer::StaticLayerCompositor;
use crate::lighting::tile::Viewport;

use super::{finish_lightmap, LightingExecutor};

/// CPU-based lighting for reference output and fallback
pub struct CpuLightingExecutor {
    config: LightingConfig,
    elapsed_time: f64,
    noise: FlickerNoise,
    revisions: RevisionCoordinator,
    static_layer: StaticLayerCompositor,
}

impl CpuLightingExecutor {
    pub fn new(config: LightingConfig) -> Self {
        let noise = FlickerNoise::new(config.flicker_seed);
        let static_layer = StaticLayerCompositor::new(config.cache_capacity);
        Self {
            config,
            elapsed_time: 0.0,
            noise,
            revisions: RevisionCoordinator::new(),
            static_layer,
        }
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.static_layer.stats()
    }

    pub fn mutation_counts(&self) -> MutationCounts {
        self.revisions.counts()
    }

    /// Static layer for `viewport`, dropping the cache first if invalidated
    pub fn static_layer(&mut self, scene: &LightingScene<'_>, viewport: Viewport) -> LightMap {
        if self.revisions.take_invalidation() {
            log::debug!(
                "[CpuLighting] Static cache invalidated (generation {})",
                self.revisions.static_generation()
            );
            self.static_layer.invalidate();
        }
        self.static_layer.layer(
            scene,
            viewport,
            &self.config,
            self.revisions.static_generation(),
        )
    }
}

impl LightingExecutor for CpuLightingExecutor {
    fn update(&mut self, delta_time: f32) {
        self.elapsed_time += delta_time.max(0.0) as f64;
    }

    fn compute_lightmap(
        &mut self,
        scene: &LightingScene<'_>,
        viewport: Viewport,
    ) -> LightingResult<LightMap> {
        let base = self.static_layer(scene, viewport);
        let mut light_map = compute_dynamic_layer(
            scene,
            viewport,
            &base,
            &self.noise,
            self.elapsed_time,
            &self.config,
        );
        finish_lightmap(&mut light_map, scene, viewport, &self.config);

        debug_assert!(
            is_finite_light_map(&light_map),
            "reference lightmap produced a non-finite value"
        );
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
        false
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::light_source::{Flicker, LightId};
    use crate::lighting::scene::GridMap;
    use crate::lighting::tile::TilePos;
    use glam::Vec3;

    fn executor() -> CpuLightingExecutor {
        CpuLightingExecutor::new(LightingConfig::default())
    }

    #[test]
    fn test_update_accumulates_time() {
        let mut executor = executor();
        executor.update(0.5);
        executor.update(0.25);
        executor.update(-1.0);
        assert_eq!(executor.elapsed_time(), 0.75);
    }

    #[test]
    fn test_second_frame_hits_cache() {
        let map = GridMap::new(16, 16);
        let lights = vec![LightSource::new_static(LightId(1), TilePos::new(8, 8), 4.0, Vec3::ONE)];
        let scene = LightingScene::new(&lights, &map, &map);
        let viewport = Viewport::new(0, 0, 16, 16);
        let mut executor = executor();

        let first = executor.compute_lightmap(&scene, viewport).unwrap();
        let second = executor.compute_lightmap(&scene, viewport).unwrap();
        assert_eq!(first, second);

        let stats = executor.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_static_notification_clears_cache() {
        let map = GridMap::new(16, 16);
        let mut lights = vec![LightSource::new_static(LightId(1), TilePos::new(8, 8), 4.0, Vec3::ONE)];
        let viewport = Viewport::new(0, 0, 16, 16);
        let mut executor = executor();

        executor
            .compute_lightmap(&LightingScene::new(&lights, &map, &map), viewport)
            .unwrap();

        lights.push(LightSource::new_static(LightId(2), TilePos::new(2, 2), 2.0, Vec3::X));
        executor.on_light_added(&lights[1]);
        executor
            .compute_lightmap(&LightingScene::new(&lights, &map, &map), viewport)
            .unwrap();

        let stats = executor.cache_stats();
        assert_eq!(stats.clears, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(executor.revision(), 1);
    }

    #[test]
    fn test_dynamic_move_keeps_static_cache() {
        let map = GridMap::new(16, 16);
        let mut lights = vec![
            LightSource::new_static(LightId(1), TilePos::new(8, 8), 4.0, Vec3::ONE),
            LightSource::new_dynamic(LightId(2), TilePos::new(3, 3), 2.0, Vec3::Y, Flicker::none(), None),
        ];
        let viewport = Viewport::new(0, 0, 16, 16);
        let mut executor = executor();

        let before = executor
            .compute_lightmap(&LightingScene::new(&lights, &map, &map), viewport)
            .unwrap();

        lights[1].set_position(TilePos::new(12, 3));
        executor.on_light_moved(&lights[1]);
        let after = executor
            .compute_lightmap(&LightingScene::new(&lights, &map, &map), viewport)
            .unwrap();

        assert_ne!(before.get(12, 3), after.get(12, 3));
        assert_eq!(executor.cache_stats().hits, 1);
        assert_eq!(executor.mutation_counts().lights_moved, 1);
    }

    #[test]
    fn test_empty_viewport() {
        let map = GridMap::new(4, 4);
        let scene = LightingScene::new(&[], &map, &map);
        let light_map = executor()
            .compute_lightmap(&scene, Viewport::new(0, 0, 0, 0))
            .unwrap();
        assert!(light_map.as_slice().is_empty());
    }
}
