use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::tile::TilePos;

/// Stable identifier of a light, assigned by game logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(pub u32);

/// Identifier of an actor in the occluder index
///
/// Lights only ever look an owner up by id; they never keep the actor alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Position and reach shared by static and dynamic lights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: TilePos,
    /// Reach in tiles, never negative
    pub radius: f32,
}

impl PointLight {
    pub fn new(position: TilePos, radius: f32) -> Self {
        Self {
            position,
            radius: radius.max(0.0),
        }
    }
}

/// Brightness modulation of a dynamic light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flicker {
    pub enabled: bool,
    /// Noise samples per second
    pub speed: f32,
    pub min_brightness: f32,
    pub max_brightness: f32,
}

impl Flicker {
    /// Steady light, brightness always 1
    pub fn none() -> Self {
        Self {
            enabled: false,
            speed: 0.0,
            min_brightness: 1.0,
            max_brightness: 1.0,
        }
    }

    /// Torch-like flicker between `min` and `max`
    pub fn torch(speed: f32, min_brightness: f32, max_brightness: f32) -> Self {
        Self {
            enabled: true,
            speed,
            min_brightness: min_brightness.min(max_brightness),
            max_brightness: max_brightness.max(min_brightness),
        }
    }
}

impl Default for Flicker {
    fn default() -> Self {
        Self::none()
    }
}

/// Variant-specific light data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Fixed light baked into the cached static layer
    Static(PointLight),
    /// Moving or flickering light composited every frame
    Dynamic {
        point: PointLight,
        flicker: Flicker,
        owner: Option<ActorId>,
    },
    /// Global light such as the sun or moon
    Directional { direction: Vec2, intensity: f32 },
}

/// A light source as seen by the lighting engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub id: LightId,
    /// RGB, each channel in [0, 1]
    pub color: Vec3,
    pub kind: LightKind,
}

/// Clamp every channel into [0, 1]
pub fn normalize_color(color: Vec3) -> Vec3 {
    color.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Convert an 8-bit RGB triple into a normalized color
pub fn color_from_rgb8(rgb: [u8; 3]) -> Vec3 {
    Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32) / 255.0
}

impl LightSource {
    pub fn new_static(id: LightId, position: TilePos, radius: f32, color: Vec3) -> Self {
        Self {
            id,
            color: normalize_color(color),
            kind: LightKind::Static(PointLight::new(position, radius)),
        }
    }

    pub fn new_dynamic(
        id: LightId,
        position: TilePos,
        radius: f32,
        color: Vec3,
        flicker: Flicker,
        owner: Option<ActorId>,
    ) -> Self {
        Self {
            id,
            color: normalize_color(color),
            kind: LightKind::Dynamic {
                point: PointLight::new(position, radius),
                flicker,
                owner,
            },
        }
    }

    /// Directional light; a zero direction is kept as zero (sun overhead)
    pub fn new_directional(id: LightId, direction: Vec2, intensity: f32, color: Vec3) -> Self {
        Self {
            id,
            color: normalize_color(color),
            kind: LightKind::Directional {
                direction: direction.normalize_or_zero(),
                intensity: intensity.max(0.0),
            },
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, LightKind::Static(_))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, LightKind::Dynamic { .. })
    }

    pub fn is_directional(&self) -> bool {
        matches!(self.kind, LightKind::Directional { .. })
    }

    /// Position and radius, for point lights only
    pub fn point(&self) -> Option<&PointLight> {
        match &self.kind {
            LightKind::Static(point) => Some(point),
            LightKind::Dynamic { point, .. } => Some(point),
            LightKind::Directional { .. } => None,
        }
    }

    pub fn position(&self) -> Option<TilePos> {
        self.point().map(|p| p.position)
    }

    pub fn radius(&self) -> Option<f32> {
        self.point().map(|p| p.radius)
    }

    pub fn flicker(&self) -> Option<&Flicker> {
        match &self.kind {
            LightKind::Dynamic { flicker, .. } => Some(flicker),
            _ => None,
        }
    }

    pub fn owner(&self) -> Option<ActorId> {
        match &self.kind {
            LightKind::Dynamic { owner, .. } => *owner,
            _ => None,
        }
    }

    /// Direction and intensity, for directional lights only
    pub fn directional(&self) -> Option<(Vec2, f32)> {
        match &self.kind {
            LightKind::Directional {
                direction,
                intensity,
            } => Some((*direction, *intensity)),
            _ => None,
        }
    }

    /// Move a point light; directional lights are left untouched
    pub fn set_position(&mut self, position: TilePos) {
        match &mut self.kind {
            LightKind::Static(point) => point.position = position,
            LightKind::Dynamic { point, .. } => point.position = position,
            LightKind::Directional { .. } => {}
        }
    }
}
