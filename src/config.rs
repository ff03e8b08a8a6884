//! Lighting configuration
//!
//! `LightingConfig` is shared by every executor. It can be built in code,
//! or loaded from TOML or JSON. Missing fields fall back to the defaults in
//! `constants`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{cache, composition, daylight, shadows};
use crate::error::{LightingError, LightingResult};

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(ConfigFormat::Json),
            Some("toml") => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Shadow casting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub enabled: bool,
    /// Darkening of a full-strength shadow step (0 = none, 1 = black)
    pub intensity: f32,
    /// Maximum point-light shadow length in tiles, capped at `SHADOW_MAX_LENGTH`
    pub max_length: u32,
    /// Linear decay of intensity along the shadow
    pub falloff: bool,
    /// Length of sun shadows, capped at `DIRECTIONAL_SHADOW_MAX_LENGTH`
    pub directional_length: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: shadows::DEFAULT_SHADOW_INTENSITY,
            max_length: shadows::SHADOW_MAX_LENGTH,
            falloff: true,
            directional_length: shadows::DEFAULT_DIRECTIONAL_SHADOW_LENGTH,
        }
    }
}

impl ShadowConfig {
    /// Point-light shadow length with the hard cap applied
    pub fn point_length(&self) -> u32 {
        self.max_length.min(shadows::SHADOW_MAX_LENGTH)
    }

    /// Sun shadow length with the hard cap applied
    pub fn directional_shadow_length(&self) -> u32 {
        self.directional_length.min(shadows::DIRECTIONAL_SHADOW_MAX_LENGTH)
    }
}

/// Lighting engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Ambient scalar every tile starts from
    pub ambient_light: f32,
    /// Exponent applied to sky exposure before scaling sunlight
    pub sky_exposure_power: f32,
    /// Rate of the exponential daylight attenuation of artificial lights
    pub daylight_decay: f32,
    /// Fraction of outdoor sunlight leaking into adjacent indoor tiles
    pub spillover_factor: f32,
    /// Seed of the flicker noise
    pub flicker_seed: u32,
    /// Viewports kept in the static layer cache
    pub cache_capacity: usize,
    /// Try the GPU executor before the CPU reference
    pub prefer_gpu: bool,
    pub shadows: ShadowConfig,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_light: composition::DEFAULT_AMBIENT_LIGHT,
            sky_exposure_power: composition::DEFAULT_SKY_EXPOSURE_POWER,
            daylight_decay: daylight::DEFAULT_DECAY_RATE,
            spillover_factor: composition::DEFAULT_SPILLOVER_FACTOR,
            flicker_seed: 0x5EED,
            cache_capacity: cache::DEFAULT_CACHE_CAPACITY,
            prefer_gpu: true,
            shadows: ShadowConfig::default(),
        }
    }
}

impl LightingConfig {
    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> LightingResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(raw: &str) -> LightingResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> LightingResult<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| LightingError::InvalidConfig {
            field: "path".to_string(),
            reason: format!("unknown config format for {:?}", path),
        })?;

        let raw = std::fs::read_to_string(path).map_err(|source| LightingError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("[LightingConfig] Loading {:?} config from {:?}", format, path);
        match format {
            ConfigFormat::Json => Self::from_json_str(&raw),
            ConfigFormat::Toml => Self::from_toml_str(&raw),
        }
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> LightingResult<String> {
        toml::to_string_pretty(self).map_err(|e| LightingError::ConfigParse(e.to_string()))
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> LightingResult<()> {
        check_unit("ambient_light", self.ambient_light)?;
        check_unit("spillover_factor", self.spillover_factor)?;
        check_unit("shadows.intensity", self.shadows.intensity)?;

        if !(self.sky_exposure_power.is_finite() && self.sky_exposure_power > 0.0) {
            return Err(invalid("sky_exposure_power", "must be a positive number"));
        }
        if !(self.daylight_decay.is_finite() && self.daylight_decay >= 0.0) {
            return Err(invalid("daylight_decay", "must be a non-negative number"));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("cache_capacity", "must hold at least one viewport"));
        }
        if self.shadows.max_length > shadows::SHADOW_MAX_LENGTH {
            return Err(invalid(
                "shadows.max_length",
                format!("must be at most {}", shadows::SHADOW_MAX_LENGTH),
            ));
        }
        if self.shadows.directional_length > shadows::DIRECTIONAL_SHADOW_MAX_LENGTH {
            return Err(invalid(
                "shadows.directional_length",
                format!("must be at most {}", shadows::DIRECTIONAL_SHADOW_MAX_LENGTH),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> LightingError {
    LightingError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check_unit(field: &str, value: f32) -> LightingResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{} is outside [0, 1]", value)))
    }
}
