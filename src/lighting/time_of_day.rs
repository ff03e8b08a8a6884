use glam::{Vec2, Vec3};

use super::light_source::{LightId, LightSource};

/// Time of day represented as hours (0-24)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeOfDay {
    /// Current time in hours (0.0 - 24.0)
    pub hours: f32,
}

impl TimeOfDay {
    pub fn new(hours: f32) -> Self {
        Self {
            hours: hours.rem_euclid(24.0),
        }
    }

    /// Create noon time
    pub fn noon() -> Self {
        Self { hours: 12.0 }
    }

    /// Create midnight time
    pub fn midnight() -> Self {
        Self { hours: 0.0 }
    }

    /// Get the sun angle in radians (0 at sunrise, PI at sunset)
    pub fn sun_angle(&self) -> f32 {
        // Sun rises at 6:00 and sets at 18:00
        let day_progress = (self.hours - 6.0) / 12.0;
        day_progress.clamp(0.0, 1.0) * std::f32::consts::PI
    }

    /// Direction sunlight travels across the tile plane
    ///
    /// Light comes from the east in the morning and from the west in the
    /// evening, always with a southward component so noon shadows fall north.
    pub fn sun_direction(&self) -> Vec2 {
        let angle = self.sun_angle();
        Vec2::new(-angle.cos(), 0.5).normalize()
    }

    /// Is it daytime?
    pub fn is_day(&self) -> bool {
        self.hours >= 6.0 && self.hours < 18.0
    }

    /// Is it nighttime?
    pub fn is_night(&self) -> bool {
        !self.is_day()
    }

    /// Directional intensity: sun by day, faint moon by night
    pub fn sun_intensity(&self) -> f32 {
        if self.is_day() {
            0.3 + 0.7 * self.sun_angle().sin()
        } else {
            0.12
        }
    }

    /// Get sun color based on time
    pub fn sun_color(&self) -> Vec3 {
        if self.is_night() {
            // Cool moonlight
            Vec3::new(0.6, 0.65, 0.9)
        } else if self.hours < 7.0 || self.hours > 17.0 {
            // Sunrise/sunset - orange
            Vec3::new(1.0, 0.7, 0.4)
        } else {
            // Midday - white/yellow
            Vec3::new(1.0, 0.95, 0.8)
        }
    }

    /// Ambient scalar for the lighting config
    pub fn ambient_light(&self) -> f32 {
        if self.is_day() {
            0.1 + 0.1 * self.sun_angle().sin()
        } else {
            0.03
        }
    }

    /// The global directional light for this time
    pub fn directional_light(&self, id: LightId) -> LightSource {
        LightSource::new_directional(id, self.sun_direction(), self.sun_intensity(), self.sun_color())
    }

    /// Advance time by delta seconds
    pub fn advance(&mut self, delta_seconds: f32, day_length_seconds: f32) {
        // Convert delta to hours based on day length
        let hours_per_second = 24.0 / day_length_seconds;
        self.hours = (self.hours + delta_seconds * hours_per_second).rem_euclid(24.0);
    }
}

/// Manages the day/night cycle
///
/// Lighting only follows the clock in fixed steps: `update` reports a change
/// when the quantized hour moves, which is when the caller should notify the
/// lighting executor with `on_global_light_changed`.
pub struct DayNightCycle {
    /// Current time of day
    pub time: TimeOfDay,
    /// Length of a full day in seconds
    pub day_length_seconds: f32,
    /// Speed multiplier for time progression
    pub time_scale: f32,
    /// Width of a lighting step in hours
    pub step_hours: f32,
}

impl DayNightCycle {
    pub fn new(starting_time: TimeOfDay, day_length_seconds: f32) -> Self {
        Self {
            time: starting_time,
            day_length_seconds,
            time_scale: 1.0,
            step_hours: 0.25,
        }
    }

    /// 20 minute days starting at noon, lighting updated every quarter hour
    pub fn standard() -> Self {
        Self::new(TimeOfDay::noon(), 20.0 * 60.0)
    }

    fn bucket(&self) -> u32 {
        (self.time.hours / self.step_hours).floor() as u32
    }

    /// Update the time of day; true when the lighting step changed
    pub fn update(&mut self, delta_time: f32) -> bool {
        let before = self.bucket();
        self.time
            .advance(delta_time * self.time_scale, self.day_length_seconds);
        before != self.bucket()
    }

    /// Time snapped to the current lighting step
    pub fn quantized_time(&self) -> TimeOfDay {
        TimeOfDay::new(self.bucket() as f32 * self.step_hours)
    }

    /// Set time scale (for debugging or gameplay features)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}
