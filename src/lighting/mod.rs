pub mod daylight;
pub mod dynamic_layer;
pub mod flicker;
pub mod layer_cache;
pub mod light_map;
pub mod light_source;
pub mod revision;
pub mod scene;
pub mod shadows;
pub mod static_layer;
pub mod tile;
pub mod time_of_day;

pub use daylight::{apply_sky_spillover, attenuation_at, daylight_attenuation, sun_factor};
pub use dynamic_layer::{compute_dynamic_layer, prepare_dynamic_lights, PreparedLight};
pub use flicker::FlickerNoise;
pub use layer_cache::{CacheStats, LayerCache};
pub use light_map::{clamp_light_map, is_finite_light_map, LightMap};
pub use light_source::{ActorId, Flicker, LightId, LightKind, LightSource, PointLight};
pub use revision::{CacheState, MutationCounts, RevisionCoordinator};
pub use scene::{ActorIndex, GridMap, LightingScene, Occluder, Region, TileSampler};
pub use shadows::{apply_shadows, cast_gradual_shadow, ShadowParams, ShadowTile};
pub use static_layer::{compute_static_layer, StaticLayerCompositor};
pub use tile::{TilePos, Viewport};
pub use time_of_day::{DayNightCycle, TimeOfDay};

