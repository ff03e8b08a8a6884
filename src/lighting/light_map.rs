use glam::Vec3;

/// RGB intensity buffer for one viewport
///
/// Values may exceed [0, 1] while layers are composed; `clamp_light_map`
/// runs before a map leaves the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LightMap {
    width: u32,
    height: u32,
    /// Row-major, three floats per tile
    data: Vec<f32>,
}

impl LightMap {
    /// Create a map with every tile set to `value` on all channels
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize * 3],
        }
    }

    /// Wrap raw channel data; `None` if the length does not match
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        if data.len() == width as usize * height as usize * 3 {
            Some(Self {
                width,
                height,
                data,
            })
        } else {
            None
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<f32> {
        self.data
    }

    /// Color at local coordinates; black outside the map
    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        match self.index(x, y) {
            Some(i) => Vec3::new(self.data[i], self.data[i + 1], self.data[i + 2]),
            None => Vec3::ZERO,
        }
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = color.x;
            self.data[i + 1] = color.y;
            self.data[i + 2] = color.z;
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 3)
    }
}

/// Add `color` to a tile
/// Function - transforms one tile additively
pub fn add_to_tile(light_map: &mut LightMap, x: u32, y: u32, color: Vec3) {
    let current = light_map.get(x, y);
    light_map.set(x, y, current + color);
}

/// Per-channel maximum of a tile and `color`
/// Function - overlapping lights never sum
pub fn max_blend_tile(light_map: &mut LightMap, x: u32, y: u32, color: Vec3) {
    let current = light_map.get(x, y);
    light_map.set(x, y, current.max(color));
}

/// Multiply a tile by `factor` on every channel
/// Function - used by the shadow pass
pub fn scale_tile(light_map: &mut LightMap, x: u32, y: u32, factor: f32) {
    let current = light_map.get(x, y);
    light_map.set(x, y, current * factor);
}

/// Clamp every channel into [0, 1]
/// Function - transforms the map in place
pub fn clamp_light_map(light_map: &mut LightMap) {
    for value in light_map.data.iter_mut() {
        *value = value.clamp(0.0, 1.0);
    }
}

/// Whether every channel is a finite number
/// Pure function - reads the map
pub fn is_finite_light_map(light_map: &LightMap) -> bool {
    light_map.data.iter().all(|v| v.is_finite())
}

/// Mean intensity over all channels
/// Pure function - reads the map
pub fn average_brightness(light_map: &LightMap) -> f32 {
    if light_map.data.is_empty() {
        return 0.0;
    }
    light_map.data.iter().sum::<f32>() / light_map.data.len() as f32
}
