/// Lighting demo
///
/// Runs a small village through a few in-game hours: a lit house with a
/// doorway, torches along a path, a wandering lantern bearer and a player
/// carrying a flickering torch. Prints per-second lighting statistics.
///
/// Usage: lighting_demo [config.toml|config.json]
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec3;
use hearth_lighting::{
    create_executor, lightmap_or_skip, ActorId, DayNightCycle, Flicker, GridMap, LightId,
    LightSource, LightingConfig, LightingScene, Occluder, Region, TilePos, TimeOfDay, Viewport,
};
use hearth_lighting::lighting::light_map::average_brightness;
use hearth_lighting::lighting::light_source::color_from_rgb8;

const MAP_WIDTH: u32 = 96;
const MAP_HEIGHT: u32 = 64;
const FRAMES: u32 = 600;
const FRAME_TIME: f32 = 1.0 / 60.0;

const PLAYER: ActorId = ActorId(1);
const VILLAGER: ActorId = ActorId(2);
const SUN: LightId = LightId(0);

fn build_village() -> GridMap {
    let mut map = GridMap::with_uniform_exposure(MAP_WIDTH, MAP_HEIGHT, 1.0);

    // House interior
    let indoors = map.add_region(Region::indoors());
    map.fill_region(20, 20, 16, 10, indoors);
    for x in 19..=36 {
        map.set_wall(TilePos::new(x, 19));
        map.set_wall(TilePos::new(x, 30));
    }
    for y in 19..=30 {
        map.set_wall(TilePos::new(19, y));
        map.set_wall(TilePos::new(36, y));
    }
    // Doorway
    map.set_tile(TilePos::new(27, 30), true, false);

    // Covered market stall, half open to the sky
    let stall = map.add_region(Region::new(0.4));
    map.fill_region(50, 35, 8, 5, stall);

    // Trees along the path
    for x in (10..90).step_by(9) {
        map.set_wall(TilePos::new(x, 40));
    }

    map.add_actor(Occluder {
        id: PLAYER,
        position: TilePos::new(27, 34),
        blocks_light: true,
    });
    map.add_actor(Occluder {
        id: VILLAGER,
        position: TilePos::new(60, 44),
        blocks_light: true,
    });
    map
}

fn build_lights(time: TimeOfDay) -> Vec<LightSource> {
    let torch_color = color_from_rgb8([255, 170, 90]);
    let mut lights = vec![
        time.directional_light(SUN),
        // Hearth inside the house
        LightSource::new_static(LightId(1), TilePos::new(24, 23), 6.0, color_from_rgb8([255, 140, 60])),
        // Player torch
        LightSource::new_dynamic(
            LightId(2),
            TilePos::new(27, 34),
            5.0,
            torch_color,
            Flicker::torch(4.0, 0.75, 1.0),
            Some(PLAYER),
        ),
        // Villager lantern
        LightSource::new_dynamic(
            LightId(3),
            TilePos::new(60, 44),
            4.0,
            Vec3::new(0.9, 0.9, 0.7),
            Flicker::none(),
            Some(VILLAGER),
        ),
    ];
    for (i, x) in (14..90).step_by(12).enumerate() {
        lights.push(LightSource::new_static(
            LightId(10 + i as u32),
            TilePos::new(x, 42),
            3.5,
            torch_color,
        ));
    }
    lights
}

fn load_config() -> Result<LightingConfig> {
    match std::env::args().nth(1) {
        Some(path) => LightingConfig::load(&path)
            .with_context(|| format!("Failed to load lighting config from {}", path)),
        None => Ok(LightingConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = load_config()?;
    log::info!("Starting lighting demo with {:?}", config);

    let mut map = build_village();
    let mut cycle = DayNightCycle::new(TimeOfDay::new(16.0), 120.0);
    let mut lights = build_lights(cycle.quantized_time());

    let mut executor = create_executor(&config);
    for light in &lights {
        executor.on_light_added(light);
    }
    log::info!(
        "Executor: {} (accelerated: {})",
        executor.name(),
        executor.is_accelerated()
    );

    let viewport = Viewport::new(8, 8, 80, 48);
    let mut skipped = 0u32;
    let mut brightness_sum = 0.0f32;
    let mut last_revision = executor.revision();
    let start = Instant::now();

    for frame in 0..FRAMES {
        executor.update(FRAME_TIME);

        if cycle.update(FRAME_TIME) {
            let time = cycle.quantized_time();
            lights[0] = time.directional_light(SUN);
            executor.on_global_light_changed();
        }

        // Villager paces along the path
        if frame % 30 == 0 {
            let x = 60 + ((frame / 30) % 8) as i32;
            map.move_actor(VILLAGER, TilePos::new(x, 44));
            lights[3].set_position(TilePos::new(x, 44));
            executor.on_light_moved(&lights[3]);
        }

        let scene = LightingScene::new(&lights, &map, &map).with_player(PLAYER);
        match lightmap_or_skip(executor.compute_lightmap(&scene, viewport)) {
            Some(light_map) => brightness_sum += average_brightness(&light_map),
            None => skipped += 1,
        }

        if (frame + 1) % 60 == 0 {
            let revision = executor.revision();
            log::info!(
                "t={:>5.2}h avg brightness {:.3} revision {}{}",
                cycle.time.hours,
                brightness_sum / 60.0,
                revision,
                if revision != last_revision { " (changed)" } else { "" }
            );
            last_revision = revision;
            brightness_sum = 0.0;
        }
    }

    let elapsed = start.elapsed();
    log::info!(
        "{} frames in {:.2}s ({:.2} ms/frame), {} skipped",
        FRAMES,
        elapsed.as_secs_f32(),
        elapsed.as_secs_f32() * 1000.0 / FRAMES as f32,
        skipped
    );
    Ok(())
}
