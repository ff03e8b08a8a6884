// Hearth Lighting Constants - SINGLE SOURCE OF TRUTH
//
// This file contains ALL tuning constants used by the lighting executors.
// The CPU reference path and the GPU path both read from here so their
// outputs stay interchangeable.
//
// CRITICAL: Do NOT define lighting constants anywhere else in the crate!

/// Composition constants shared by the static and dynamic layers
pub mod composition {
    /// Default ambient scalar broadcast to every tile
    pub const DEFAULT_AMBIENT_LIGHT: f32 = 0.1;

    /// Directional light multiplier applied to opaque tiles
    pub const OPAQUE_OCCLUSION: f32 = 0.1;

    /// Default exponent of the sky exposure curve
    pub const DEFAULT_SKY_EXPOSURE_POWER: f32 = 1.0;

    /// Fraction of a neighbour's sunlight that leaks into an indoor tile
    pub const DEFAULT_SPILLOVER_FACTOR: f32 = 0.35;
}

/// Daylight attenuation of artificial lights
pub mod daylight {
    /// Attenuation floor for lights owned by the player
    pub const PLAYER_LIGHT_FLOOR: f32 = 0.25;

    /// Attenuation floor for every other light
    pub const LIGHT_FLOOR: f32 = 0.15;

    /// Default decay rate of `exp(-rate * daylight)`
    pub const DEFAULT_DECAY_RATE: f32 = 3.0;

    /// Regions at or below this exposure count as indoors
    pub const OUTDOOR_EXPOSURE_THRESHOLD: f32 = 0.1;
}

/// Shadow casting constants
pub mod shadows {
    /// Maximum number of steps a point-light shadow extends past its occluder
    pub const SHADOW_MAX_LENGTH: u32 = 4;

    /// Default darkening of a full-strength shadow step
    pub const DEFAULT_SHADOW_INTENSITY: f32 = 0.6;

    /// Penumbra strength relative to the core step
    pub const EDGE_FACTOR: f32 = 0.4;

    /// Number of leading steps that emit penumbra tiles
    pub const EDGE_STEPS: u32 = 2;

    /// Hard cap on directional (sun) shadow length
    pub const DIRECTIONAL_SHADOW_MAX_LENGTH: u32 = 8;

    /// Default directional shadow length
    pub const DEFAULT_DIRECTIONAL_SHADOW_LENGTH: u32 = 6;

    /// Lights attenuated below this by daylight cast no shadows at all
    pub const SHADOW_SKIP_ATTENUATION: f32 = 0.3;
}

/// Static layer cache
pub mod cache {
    /// Default number of viewports kept in the static layer cache
    pub const DEFAULT_CACHE_CAPACITY: usize = 4;
}

/// GPU executor limits
pub mod gpu {
    /// Workgroup edge length of the composite shader (must match the WGSL)
    pub const WORKGROUP_SIZE: u32 = 8;

    /// Bytes per output texel (rgb + padding)
    pub const OUTPUT_TEXEL_BYTES: u64 = 16;
}

// Re-export commonly used constants at the top level for convenience
pub use composition::{DEFAULT_AMBIENT_LIGHT, OPAQUE_OCCLUSION};
pub use shadows::{DIRECTIONAL_SHADOW_MAX_LENGTH, SHADOW_MAX_LENGTH};
