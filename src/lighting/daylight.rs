//! Sky exposure, sunlight and daylight attenuation
//!
//! Sunlight reaches a tile in proportion to its region's sky exposure raised
//! to the configured exposure curve. Artificial lights lose effectiveness as
//! daylight rises, down to a floor that depends on who owns the light.

use glam::Vec3;

use crate::config::LightingConfig;
use crate::constants::composition::OPAQUE_OCCLUSION;
use crate::constants::daylight::{LIGHT_FLOOR, OUTDOOR_EXPOSURE_THRESHOLD, PLAYER_LIGHT_FLOOR};

use super::light_map::{max_blend_tile, LightMap};
use super::scene::{LightingScene, TileSampler};
use super::tile::{TilePos, Viewport};

/// Sky exposure after applying the exposure curve
pub fn curved_exposure(sky_exposure: f32, power: f32) -> f32 {
    sky_exposure.clamp(0.0, 1.0).powf(power)
}

/// Fraction of sunlight reaching a tile: curved exposure times occlusion
pub fn sun_factor(tiles: &dyn TileSampler, pos: TilePos, power: f32) -> f32 {
    let occlusion = if tiles.is_transparent(pos) {
        1.0
    } else {
        OPAQUE_OCCLUSION
    };
    curved_exposure(tiles.sky_exposure(pos), power) * occlusion
}

/// Whether a tile counts as outdoors for sun shadows and spillover
pub fn is_outdoors(tiles: &dyn TileSampler, pos: TilePos) -> bool {
    tiles.sky_exposure(pos) > OUTDOOR_EXPOSURE_THRESHOLD
}

/// Effectiveness of an artificial light under daylight
///
/// Decays exponentially with `sky_exposure * sun_intensity` and never drops
/// below the owner's floor.
pub fn daylight_attenuation(
    sky_exposure: f32,
    sun_intensity: f32,
    player_owned: bool,
    decay_rate: f32,
) -> f32 {
    let floor = if player_owned {
        PLAYER_LIGHT_FLOOR
    } else {
        LIGHT_FLOOR
    };
    let daylight = sky_exposure.clamp(0.0, 1.0) * sun_intensity.clamp(0.0, 1.0);
    (-decay_rate * daylight).exp().clamp(floor, 1.0)
}

/// Daylight attenuation of a light, evaluated at `pos`
pub fn attenuation_at(
    scene: &LightingScene<'_>,
    pos: TilePos,
    player_owned: bool,
    config: &LightingConfig,
) -> f32 {
    daylight_attenuation(
        scene.tiles.sky_exposure(pos),
        scene.sun_intensity(),
        player_owned,
        config.daylight_decay,
    )
}

/// Leak sunlight from outdoor tiles into adjacent indoor tiles
///
/// Each indoor transparent tile takes the brightest sunlight among its eight
/// outdoor neighbours, scaled by `spillover_factor`, and max-blends it in.
pub fn apply_sky_spillover(
    light_map: &mut LightMap,
    scene: &LightingScene<'_>,
    viewport: Viewport,
    config: &LightingConfig,
) {
    if config.spillover_factor <= 0.0 {
        return;
    }
    let sun_color = scene.sun_color();
    if sun_color == Vec3::ZERO {
        return;
    }

    let tiles = scene.tiles;
    let mut spill = Vec::new();
    for local_y in 0..viewport.height {
        for local_x in 0..viewport.width {
            let pos = viewport.to_world(local_x, local_y);
            if is_outdoors(tiles, pos) || !tiles.is_transparent(pos) {
                continue;
            }

            let mut brightest = 0.0f32;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let neighbor = pos.offset(dx, dy);
                    if is_outdoors(tiles, neighbor) {
                        brightest = brightest.max(sun_factor(tiles, neighbor, config.sky_exposure_power));
                    }
                }
            }

            if brightest > 0.0 {
                let leaked = Vec3::splat(config.ambient_light) + sun_color * brightest * config.spillover_factor;
                spill.push((local_x, local_y, leaked));
            }
        }
    }

    for (x, y, color) in spill {
        max_blend_tile(light_map, x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::light_source::{LightId, LightSource};
    use crate::lighting::scene::{GridMap, Region};
    use glam::Vec2;

    #[test]
    fn test_attenuation_floors() {
        for step in 0..=20 {
            let exposure = step as f32 / 20.0;
            let player = daylight_attenuation(exposure, 1.0, true, 10.0);
            let other = daylight_attenuation(exposure, 1.0, false, 10.0);
            assert!(player >= PLAYER_LIGHT_FLOOR, "player {} at {}", player, exposure);
            assert!(other >= LIGHT_FLOOR, "other {} at {}", other, exposure);
            assert!(player <= 1.0 && other <= 1.0);
        }
    }

    #[test]
    fn test_attenuation_without_sun_is_full() {
        assert_eq!(daylight_attenuation(1.0, 0.0, false, 3.0), 1.0);
        assert_eq!(daylight_attenuation(0.0, 1.0, false, 3.0), 1.0);
    }

    #[test]
    fn test_attenuation_decreases_with_exposure() {
        let shade = daylight_attenuation(0.2, 1.0, false, 3.0);
        let open = daylight_attenuation(0.4, 1.0, false, 3.0);
        assert!(open < shade);
    }

    #[test]
    fn test_sun_factor_occlusion() {
        let mut map = GridMap::with_uniform_exposure(4, 4, 1.0);
        map.set_wall(TilePos::new(1, 1));
        assert_eq!(sun_factor(&map, TilePos::new(0, 0), 1.0), 1.0);
        assert!((sun_factor(&map, TilePos::new(1, 1), 1.0) - OPAQUE_OCCLUSION).abs() < 1e-6);
        assert!((curved_exposure(0.5, 2.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_spillover_lights_doorway() {
        let mut map = GridMap::new(6, 3);
        let indoor = map.add_region(Region::indoors());
        let outdoor = map.add_region(Region::outdoors());
        map.fill_region(0, 0, 3, 3, indoor);
        map.fill_region(3, 0, 3, 3, outdoor);

        let lights = vec![LightSource::new_directional(
            LightId(1),
            Vec2::new(1.0, 0.0),
            1.0,
            Vec3::ONE,
        )];
        let scene = LightingScene::new(&lights, &map, &map);
        let config = LightingConfig::default();
        let viewport = Viewport::new(0, 0, 6, 3);
        let mut light_map = LightMap::filled(6, 3, config.ambient_light);

        apply_sky_spillover(&mut light_map, &scene, viewport, &config);

        let expected = config.ambient_light + config.spillover_factor;
        assert!((light_map.get(2, 1).x - expected).abs() < 1e-6);
        // Two tiles from the doorway stays at ambient
        assert_eq!(light_map.get(1, 1).x, config.ambient_light);
    }
}
