use noise::{NoiseFn, Perlin};

use super::light_source::Flicker;

/// Deterministic flicker source
///
/// The same `(flicker, elapsed_time)` pair always produces the same
/// brightness, so frames can be replayed exactly.
pub struct FlickerNoise {
    perlin: Perlin,
}

impl FlickerNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    /// Raw noise sample at `(elapsed_time * speed, 0)`, in [-1, 1]
    pub fn sample(&self, elapsed_time: f64, speed: f32) -> f64 {
        self.perlin
            .get([elapsed_time * speed as f64, 0.0])
            .clamp(-1.0, 1.0)
    }

    /// Brightness multiplier of a light at `elapsed_time`
    pub fn brightness(&self, flicker: &Flicker, elapsed_time: f64) -> f32 {
        if !flicker.enabled {
            return 1.0;
        }
        let t = ((self.sample(elapsed_time, flicker.speed) + 1.0) * 0.5) as f32;
        flicker.min_brightness + (flicker.max_brightness - flicker.min_brightness) * t
    }
}
