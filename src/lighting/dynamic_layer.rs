//! Dynamic layer composition
//!
//! Moving and flickering lights are blended onto a copy of the static layer
//! every frame. Nothing here is cached.

use glam::Vec3;

use crate::config::LightingConfig;

use super::daylight::attenuation_at;
use super::flicker::FlickerNoise;
use super::light_map::LightMap;
use super::scene::LightingScene;
use super::static_layer::blend_point_light;
use super::tile::{TilePos, Viewport};

/// A dynamic light with flicker and daylight already folded into its color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedLight {
    pub position: TilePos,
    pub radius: f32,
    /// `color * brightness * attenuation`
    pub color: Vec3,
    /// Daylight attenuation at the light's own tile
    pub attenuation: f32,
}

/// Resolve every dynamic light touching `viewport` for this frame
///
/// Daylight attenuation is sampled once at the light's source tile and
/// applied uniformly over its whole radius.
pub fn prepare_dynamic_lights(
    scene: &LightingScene<'_>,
    viewport: Viewport,
    noise: &FlickerNoise,
    elapsed_time: f64,
    config: &LightingConfig,
) -> Vec<PreparedLight> {
    scene
        .dynamic_lights()
        .filter_map(|light| {
            let point = light.point()?;
            if point.radius <= 0.0 || !viewport.intersects_circle(point.position, point.radius) {
                return None;
            }

            let brightness = light
                .flicker()
                .map(|f| noise.brightness(f, elapsed_time))
                .unwrap_or(1.0);
            let attenuation = attenuation_at(
                scene,
                point.position,
                scene.is_player_light(light),
                config,
            );

            Some(PreparedLight {
                position: point.position,
                radius: point.radius,
                color: light.color * (brightness * attenuation),
                attenuation,
            })
        })
        .collect()
}

/// Max-blend prepared lights onto a copy of `static_base`
pub fn blend_dynamic_lights(
    static_base: &LightMap,
    viewport: Viewport,
    lights: &[PreparedLight],
) -> LightMap {
    let mut light_map = static_base.clone();
    for light in lights {
        blend_point_light(&mut light_map, viewport, light.position, light.radius, light.color);
    }
    light_map
}

/// Compose this frame's dynamic lights over the static layer
pub fn compute_dynamic_layer(
    scene: &LightingScene<'_>,
    viewport: Viewport,
    static_base: &LightMap,
    noise: &FlickerNoise,
    elapsed_time: f64,
    config: &LightingConfig,
) -> LightMap {
    let lights = prepare_dynamic_lights(scene, viewport, noise, elapsed_time, config);
    blend_dynamic_lights(static_base, viewport, &lights)
}
