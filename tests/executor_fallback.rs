/// Executor selection tests
///
/// Fallback behaviour under failing primaries, and GPU/CPU parity when an
/// adapter is available.
use glam::{Vec2, Vec3};
use hearth_lighting::error::computation_error;
use hearth_lighting::{
    create_executor, lightmap_or_skip, ActorId, CpuLightingExecutor, Flicker, GpuLightingExecutor,
    GridMap, LightId, LightMap, LightSource, LightingConfig, LightingExecutor, LightingResult,
    LightingScene, Occluder, Region, TilePos, Viewport, WithFallback,
};

/// Tolerance for GPU float comparisons
const FLOAT_TOLERANCE: f32 = 1e-4;

/// Primary that reports a NaN readback on every frame
struct AlwaysFails {
    elapsed: f64,
}

impl LightingExecutor for AlwaysFails {
    fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time as f64;
    }

    fn compute_lightmap(
        &mut self,
        _scene: &LightingScene<'_>,
        _viewport: Viewport,
    ) -> LightingResult<LightMap> {
        Err(computation_error("mock", "non-finite light value"))
    }

    fn on_light_added(&mut self, _light: &LightSource) {}

    fn on_light_removed(&mut self, _light: &LightSource) {}

    fn on_light_moved(&mut self, _light: &LightSource) {}

    fn on_global_light_changed(&mut self) {}

    fn revision(&self) -> u64 {
        0
    }

    fn elapsed_time(&self) -> f64 {
        self.elapsed
    }

    fn is_accelerated(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn village() -> (GridMap, Vec<LightSource>) {
    let mut map = GridMap::with_uniform_exposure(40, 30, 1.0);
    let indoors = map.add_region(Region::indoors());
    map.fill_region(10, 10, 12, 8, indoors);
    for x in 9..=22 {
        map.set_wall(TilePos::new(x, 9));
        map.set_wall(TilePos::new(x, 18));
    }
    map.set_tile(TilePos::new(15, 18), true, false);
    map.add_actor(Occluder {
        id: ActorId(1),
        position: TilePos::new(15, 21),
        blocks_light: true,
    });
    map.add_actor(Occluder {
        id: ActorId(2),
        position: TilePos::new(30, 12),
        blocks_light: true,
    });

    let lights = vec![
        LightSource::new_directional(LightId(0), Vec2::new(-0.6, 0.5), 0.35, Vec3::new(1.0, 0.7, 0.4)),
        LightSource::new_static(LightId(1), TilePos::new(14, 13), 5.0, Vec3::new(1.0, 0.55, 0.25)),
        LightSource::new_static(LightId(2), TilePos::new(28, 20), 3.5, Vec3::new(1.0, 0.67, 0.35)),
        LightSource::new_dynamic(
            LightId(3),
            TilePos::new(15, 21),
            5.0,
            Vec3::new(1.0, 0.67, 0.35),
            Flicker::torch(4.0, 0.75, 1.0),
            Some(ActorId(1)),
        ),
        LightSource::new_dynamic(
            LightId(4),
            TilePos::new(31, 12),
            4.0,
            Vec3::new(0.9, 0.9, 0.7),
            Flicker::none(),
            Some(ActorId(2)),
        ),
    ];
    (map, lights)
}

fn cpu() -> Box<dyn LightingExecutor> {
    Box::new(CpuLightingExecutor::new(LightingConfig::default()))
}

fn assert_maps_close(a: &LightMap, b: &LightMap) {
    assert_eq!(a.width(), b.width());
    assert_eq!(a.height(), b.height());
    for (i, (x, y)) in a.as_slice().iter().zip(b.as_slice()).enumerate() {
        assert!(
            (x - y).abs() < FLOAT_TOLERANCE,
            "mismatch at value {}: {} vs {}",
            i,
            x,
            y
        );
    }
}

#[test]
fn test_failing_primary_matches_reference() {
    let (map, lights) = village();
    let scene = LightingScene::new(&lights, &map, &map).with_player(ActorId(1));
    let viewport = Viewport::new(0, 0, 40, 30);

    let mut fallback = WithFallback::new(Box::new(AlwaysFails { elapsed: 0.0 }), cpu());
    let mut reference = CpuLightingExecutor::new(LightingConfig::default());

    for _ in 0..5 {
        fallback.update(0.05);
        reference.update(0.05);
        let from_fallback = fallback.compute_lightmap(&scene, viewport).unwrap();
        let from_reference = reference.compute_lightmap(&scene, viewport).unwrap();
        assert_eq!(from_fallback, from_reference);
    }

    let stats = fallback.stats();
    assert_eq!(stats.fallback_frames, 5);
    assert_eq!(stats.primary_frames, 0);
}

#[test]
fn test_no_fallback_skips_frame() {
    let (map, lights) = village();
    let scene = LightingScene::new(&lights, &map, &map);
    let mut executor = AlwaysFails { elapsed: 0.0 };

    let frame = lightmap_or_skip(executor.compute_lightmap(&scene, Viewport::new(0, 0, 8, 8)));
    assert!(frame.is_none());
}

#[test]
fn test_cpu_only_config() {
    let config = LightingConfig {
        prefer_gpu: false,
        ..Default::default()
    };
    let executor = create_executor(&config);
    assert_eq!(executor.name(), "cpu");
    assert!(!executor.is_accelerated());
}

#[test]
fn test_created_executor_always_produces_frames() {
    let (map, lights) = village();
    let scene = LightingScene::new(&lights, &map, &map).with_player(ActorId(1));
    let viewport = Viewport::new(4, 4, 24, 20);

    // GPU with CPU fallback, or CPU alone when no adapter exists
    let mut executor = create_executor(&LightingConfig::default());
    let mut reference = CpuLightingExecutor::new(LightingConfig::default());
    executor.update(0.25);
    reference.update(0.25);

    let light_map = executor.compute_lightmap(&scene, viewport).unwrap();
    let expected = reference.compute_lightmap(&scene, viewport).unwrap();
    assert_maps_close(&light_map, &expected);
}

#[test]
fn test_gpu_matches_cpu() {
    let mut gpu = match GpuLightingExecutor::new(LightingConfig::default()) {
        Ok(gpu) => gpu,
        Err(e) => {
            println!("Skipping GPU test - no GPU available: {}", e);
            return;
        }
    };
    let mut cpu = CpuLightingExecutor::new(LightingConfig::default());

    let (map, mut lights) = village();
    let viewports = [
        Viewport::new(0, 0, 40, 30),
        Viewport::new(7, 3, 19, 13),
        Viewport::new(-5, -5, 12, 12),
    ];

    for frame in 0..6 {
        gpu.update(1.0 / 30.0);
        cpu.update(1.0 / 30.0);

        if frame == 3 {
            lights[3].set_position(TilePos::new(18, 22));
            gpu.on_light_moved(&lights[3]);
            cpu.on_light_moved(&lights[3]);
        }

        let scene = LightingScene::new(&lights, &map, &map).with_player(ActorId(1));
        for viewport in viewports {
            let from_gpu = gpu.compute_lightmap(&scene, viewport).unwrap();
            let from_cpu = cpu.compute_lightmap(&scene, viewport).unwrap();
            assert_maps_close(&from_gpu, &from_cpu);
        }
    }
    assert_eq!(gpu.revision(), cpu.revision());
}

#[test]
fn test_gpu_rejects_oversized_viewport() {
    let mut gpu = match GpuLightingExecutor::new(LightingConfig::default()) {
        Ok(gpu) => gpu,
        Err(_) => {
            println!("Skipping GPU test - no GPU available");
            return;
        }
    };
    let map = GridMap::new(4, 4);
    let scene = LightingScene::new(&[], &map, &map);

    // 2^16 x 2^16 tiles of 16 bytes is far beyond any binding limit
    let result = gpu.compute_lightmap(&scene, Viewport::new(0, 0, 1 << 16, 1 << 16));
    let err = result.unwrap_err();
    assert!(err.is_recoverable());

    // A failed frame leaves the executor usable
    assert!(gpu.compute_lightmap(&scene, Viewport::new(0, 0, 4, 4)).is_ok());
}
