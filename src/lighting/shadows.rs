//! Shadow casting
//!
//! A multiplicative post-process over the composited map. Every occluder
//! inside a point light's radius throws a short gradual shadow directly away
//! from the light; outdoor occluders also throw one sun shadow along the
//! global shadow direction.

use glam::Vec2;

use crate::config::LightingConfig;
use crate::constants::shadows::{EDGE_FACTOR, EDGE_STEPS, SHADOW_SKIP_ATTENUATION};

use super::daylight::{attenuation_at, is_outdoors};
use super::light_map::{scale_tile, LightMap};
use super::light_source::LightSource;
use super::scene::LightingScene;
use super::tile::{TilePos, Viewport};

/// One shadowed tile and the darkening it receives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowTile {
    pub pos: TilePos,
    pub intensity: f32,
}

/// Shadow length and shape settings for one pass
#[derive(Debug, Clone, Copy)]
pub struct ShadowParams {
    pub intensity: f32,
    pub max_length: u32,
    pub falloff: bool,
}

impl ShadowParams {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            intensity: config.shadows.intensity,
            max_length: config.shadows.point_length(),
            falloff: config.shadows.falloff,
        }
    }
}

/// Round a direction to one of the eight grid steps
fn grid_step(direction: Vec2) -> Option<(i32, i32)> {
    let unit = direction.normalize_or_zero();
    let step = (unit.x.round() as i32, unit.y.round() as i32);
    if step == (0, 0) {
        None
    } else {
        Some(step)
    }
}

/// Walk `steps` tiles from `origin` along `step`, with a soft penumbra
///
/// The first `EDGE_STEPS` steps also shade their eight neighbours, except the
/// next core tile, at `EDGE_FACTOR` of the step intensity. On the first step
/// that includes the occluder tile itself.
fn shadow_ray(origin: TilePos, step: (i32, i32), steps: u32, params: &ShadowParams) -> Vec<ShadowTile> {
    let mut tiles = Vec::with_capacity(steps as usize * 3);
    for i in 1..=steps {
        let core = origin.offset(step.0 * i as i32, step.1 * i as i32);
        let intensity = if params.falloff {
            params.intensity * (1.0 - (i - 1) as f32 / steps as f32)
        } else {
            params.intensity
        };
        tiles.push(ShadowTile {
            pos: core,
            intensity,
        });

        if i <= EDGE_STEPS {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx, dy) == (0, 0) || (dx, dy) == step {
                        continue;
                    }
                    tiles.push(ShadowTile {
                        pos: core.offset(dx, dy),
                        intensity: intensity * EDGE_FACTOR,
                    });
                }
            }
        }
    }
    tiles
}

/// Gradual shadow thrown by `occluder_pos` away from `light_pos`
///
/// Runs for `min(max_length, remaining distance to max_distance + 2)` steps
/// along the rounded unit direction.
pub fn cast_gradual_shadow(
    light_pos: TilePos,
    occluder_pos: TilePos,
    max_distance: f32,
    params: &ShadowParams,
) -> Vec<ShadowTile> {
    let direction = Vec2::new(
        (occluder_pos.x - light_pos.x) as f32,
        (occluder_pos.y - light_pos.y) as f32,
    );
    let Some(step) = grid_step(direction) else {
        return Vec::new();
    };

    let remaining = (max_distance - direction.length()).max(0.0) as u32;
    let steps = params.max_length.min(remaining.saturating_add(2));
    shadow_ray(occluder_pos, step, steps, params)
}

/// Sun shadow thrown by `occluder_pos` along `shadow_direction`
pub fn cast_directional_shadow(
    occluder_pos: TilePos,
    shadow_direction: Vec2,
    length: u32,
    params: &ShadowParams,
) -> Vec<ShadowTile> {
    match grid_step(shadow_direction) {
        Some(step) => shadow_ray(occluder_pos, step, length, params),
        None => Vec::new(),
    }
}

/// Occluders inside a point light's radius: blocking actors and
/// shadow-casting tiles, excluding the light's own tile and owner
pub fn gather_occluders(scene: &LightingScene<'_>, light: &LightSource) -> Vec<TilePos> {
    let Some(point) = light.point() else {
        return Vec::new();
    };
    let owner = light.owner();
    let radius_sq = point.radius * point.radius;

    let mut occluders: Vec<TilePos> = scene
        .actors
        .actors_in_radius(point.position, point.radius)
        .into_iter()
        .filter(|a| a.blocks_light && Some(a.id) != owner && a.position != point.position)
        .map(|a| a.position)
        .collect();

    // Only the part of the light's box that lies on the map can hold casters
    let (width, height) = scene.tiles.dimensions();
    let map_area = Viewport::new(0, 0, width, height);
    let Some((min, max)) = map_area.clip_square(point.position, point.radius) else {
        return occluders;
    };
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            let pos = TilePos::new(x, y);
            if pos == point.position || point.position.distance_squared(pos) as f32 > radius_sq {
                continue;
            }
            if scene.tiles.is_shadow_caster(pos) {
                occluders.push(pos);
            }
        }
    }
    occluders
}

/// Darken the map with every point light's occluder shadows
pub fn apply_point_shadows(
    light_map: &mut LightMap,
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
) {
    let params = ShadowParams::from_config(config);
    // Shadows run up to `max_length` steps past an occluder, plus one
    // penumbra tile, so lights just outside the window still reach it
    let reach = viewport.expanded(params.max_length + 1);

    for light in scene.point_lights() {
        let Some(point) = light.point() else {
            continue;
        };
        if point.radius <= 0.0 || !reach.intersects_circle(point.position, point.radius) {
            continue;
        }

        let player_owned = scene.is_player_light(light);
        // An effectively invisible light must not cast a visible shadow
        if attenuation_at(scene, point.position, player_owned, config) < SHADOW_SKIP_ATTENUATION {
            continue;
        }

        for occluder in gather_occluders(scene, light) {
            for shadow in cast_gradual_shadow(point.position, occluder, point.radius, &params) {
                let Some((x, y)) = viewport.to_local(shadow.pos) else {
                    continue;
                };
                let reduced = shadow.intensity * attenuation_at(scene, shadow.pos, player_owned, config);
                scale_tile(light_map, x, y, (1.0 - reduced).clamp(0.0, 1.0));
            }
        }
    }
}

/// Darken outdoor tiles behind outdoor occluders along the sun direction
pub fn apply_directional_shadows(
    light_map: &mut LightMap,
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
) {
    let length = config.shadows.directional_shadow_length();
    if length == 0 {
        return;
    }

    // Occluders just outside the viewport can still shade its edge
    let area = viewport.expanded(length + 1);
    let center = TilePos::new(
        area.x1 + area.width as i32 / 2,
        area.y1 + area.height as i32 / 2,
    );
    let half_diagonal = ((area.width as f32).powi(2) + (area.height as f32).powi(2)).sqrt() * 0.5;

    let mut occluders: Vec<TilePos> = area
        .tiles()
        .filter(|&pos| scene.tiles.is_shadow_caster(pos))
        .collect();
    occluders.extend(
        scene
            .actors
            .actors_in_radius(center, half_diagonal)
            .into_iter()
            .filter(|a| a.blocks_light && area.contains(a.position))
            .map(|a| a.position),
    );
    occluders.retain(|&pos| is_outdoors(scene.tiles, pos));
    if occluders.is_empty() {
        return;
    }

    for light in scene.directional_lights() {
        let Some((direction, intensity)) = light.directional() else {
            continue;
        };
        let params = ShadowParams {
            intensity: config.shadows.intensity * intensity.min(1.0),
            max_length: length,
            falloff: config.shadows.falloff,
        };
        if params.intensity <= 0.0 {
            continue;
        }

        for &occluder in &occluders {
            for shadow in cast_directional_shadow(occluder, -direction, length, &params) {
                if !is_outdoors(scene.tiles, shadow.pos) {
                    continue;
                }
                if let Some((x, y)) = viewport.to_local(shadow.pos) {
                    scale_tile(light_map, x, y, (1.0 - shadow.intensity).clamp(0.0, 1.0));
                }
            }
        }
    }
}

/// Full shadow pass: point-light shadows, then sun shadows
pub fn apply_shadows(
    light_map: &mut LightMap,
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
) {
    if !config.shadows.enabled {
        return;
    }
    apply_point_shadows(light_map, scene, viewport, config);
    apply_directional_shadows(light_map, scene, viewport, config);
}
