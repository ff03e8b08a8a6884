//! Static layer composition
//!
//! Ambient + directional + static point lights for one viewport. The result
//! only changes when a static or directional light, a global lighting
//! parameter or the map geometry changes, so it is cached by signature.

use std::hash::{Hash, Hasher};

use glam::Vec3;
use rustc_hash::FxHasher;

use crate::config::LightingConfig;

use super::daylight::sun_factor;
use super::layer_cache::{CacheStats, LayerCache};
use super::light_map::{add_to_tile, clamp_light_map, max_blend_tile, LightMap};
use super::light_source::{LightKind, LightSource};
use super::scene::LightingScene;
use super::tile::{TilePos, Viewport};

/// Max-blend one point light's falloff into `light_map`
///
/// Tiles within `radius` receive `(1 - distance / radius) * color`, combined
/// per channel with the current value by maximum.
pub fn blend_point_light(
    light_map: &mut LightMap,
    viewport: Viewport,
    position: TilePos,
    radius: f32,
    color: Vec3,
) {
    if radius <= 0.0 {
        return;
    }
    let Some((min, max)) = viewport.clip_square(position, radius) else {
        return;
    };

    let radius_sq = radius * radius;
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            let distance_sq = position.distance_squared(TilePos::new(x, y)) as f32;
            if distance_sq > radius_sq {
                continue;
            }
            let falloff = 1.0 - distance_sq.sqrt() / radius;
            max_blend_tile(
                light_map,
                (x - viewport.x1) as u32,
                (y - viewport.y1) as u32,
                color * falloff,
            );
        }
    }
}

/// Add sunlight to every tile of the viewport
pub fn apply_directional_light(
    light_map: &mut LightMap,
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
) {
    let sun_color = scene.sun_color();
    if sun_color == Vec3::ZERO {
        return;
    }

    for local_y in 0..viewport.height {
        for local_x in 0..viewport.width {
            let pos = viewport.to_world(local_x, local_y);
            let factor = sun_factor(scene.tiles, pos, config.sky_exposure_power);
            if factor > 0.0 {
                add_to_tile(light_map, local_x, local_y, sun_color * factor);
            }
        }
    }
}

/// Compute the static layer from scratch
///
/// Ambient everywhere, sunlight added on top, then static point lights
/// max-blended so overlapping torches never overexpose. Clamped to [0, 1].
pub fn compute_static_layer(
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
) -> LightMap {
    let mut light_map = LightMap::filled(viewport.width, viewport.height, config.ambient_light);

    apply_directional_light(&mut light_map, scene, viewport, config);

    for light in scene.static_lights() {
        if let Some(point) = light.point() {
            blend_point_light(&mut light_map, viewport, point.position, point.radius, light.color);
        }
    }

    clamp_light_map(&mut light_map);
    light_map
}

fn hash_vec3<H: Hasher>(state: &mut H, v: Vec3) {
    v.x.to_bits().hash(state);
    v.y.to_bits().hash(state);
    v.z.to_bits().hash(state);
}

fn hash_light<H: Hasher>(state: &mut H, light: &LightSource) {
    match &light.kind {
        LightKind::Static(point) => {
            0u8.hash(state);
            light.id.hash(state);
            point.position.hash(state);
            point.radius.to_bits().hash(state);
            hash_vec3(state, light.color);
        }
        LightKind::Directional {
            direction,
            intensity,
        } => {
            1u8.hash(state);
            light.id.hash(state);
            direction.x.to_bits().hash(state);
            direction.y.to_bits().hash(state);
            intensity.to_bits().hash(state);
            hash_vec3(state, light.color);
        }
        // Dynamic lights never reach the static layer
        LightKind::Dynamic { .. } => {}
    }
}

/// Signature of everything the static layer depends on
///
/// Covers the viewport bounds, every static and directional light, the
/// global parameters (as exact bit patterns) and the map's structural
/// revision. `generation` is the coordinator's invalidation count.
pub fn static_layer_signature(
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
    generation: u64,
) -> u64 {
    let mut state = FxHasher::default();
    viewport.hash(&mut state);
    generation.hash(&mut state);
    config.ambient_light.to_bits().hash(&mut state);
    config.sky_exposure_power.to_bits().hash(&mut state);
    scene.tiles.dimensions().hash(&mut state);
    scene.tiles.structural_revision().hash(&mut state);

    for light in scene.lights.iter().filter(|l| !l.is_dynamic()) {
        hash_light(&mut state, light);
    }
    state.finish()
}

/// Cached static layer compositor
pub struct StaticLayerCompositor {
    cache: LayerCache,
}

impl StaticLayerCompositor {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LayerCache::new(capacity),
        }
    }

    /// Static layer for `viewport`, from cache when the signature matches
    pub fn layer(
        &mut self,
        scene: &LightingScene<'_>,
        viewport: Viewport,
        config: &LightingConfig,
        generation: u64,
    ) -> LightMap {
        let key = static_layer_signature(scene, viewport, config, generation);
        if let Some(light_map) = self.cache.get(key) {
            log::debug!("[StaticLayer] Cache hit for {:?}", viewport);
            return light_map;
        }

        log::debug!("[StaticLayer] Recomputing {:?}", viewport);
        let light_map = compute_static_layer(scene, viewport, config);
        self.cache.put(key, light_map.clone());
        light_map
    }

    /// Drop every cached layer
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
