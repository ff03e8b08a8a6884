//! Hearth lighting
//!
//! Tile-based dynamic illumination. Each frame an executor composes a cached
//! static layer (ambient, sunlight, static lights), blends moving and
//! flickering lights on top, casts occluder shadows and returns a clamped
//! RGB light map for the viewport.

pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod lighting;

pub use config::{ConfigFormat, LightingConfig, ShadowConfig};
pub use error::{LightingError, LightingResult};
pub use executor::{
    create_executor, lightmap_or_skip, validate_lightmap, CpuLightingExecutor, FallbackStats,
    GpuLightingExecutor, LightingExecutor, WithFallback,
};
pub use lighting::{
    ActorId, ActorIndex, DayNightCycle, Flicker, GridMap, LightId, LightKind, LightMap,
    LightSource, LightingScene, Occluder, Region, TileSampler, TilePos, TimeOfDay, Viewport,
};
