use bytemuck::{Pod, Zeroable};

use crate::lighting::dynamic_layer::PreparedLight;
use crate::lighting::light_source::LightSource;
use crate::lighting::tile::Viewport;

/// Point light as uploaded to the GPU (32 bytes, matches WGSL `PointLight`)
///
/// Static and dynamic lights share one buffer; `CompositeParams::static_count`
/// marks where the dynamic lights start.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// Position relative to the viewport origin
    pub position: [i32; 2],
    pub radius: f32,
    pub _padding: u32,
    /// Final RGB, flicker and daylight already applied; alpha unused
    pub color: [f32; 4],
}

impl GpuPointLight {
    /// Upload form of a static light, `None` for non-point lights
    pub fn from_static(light: &LightSource, viewport: Viewport) -> Option<Self> {
        let point = light.point()?;
        Some(Self {
            position: [point.position.x - viewport.x1, point.position.y - viewport.y1],
            radius: point.radius,
            _padding: 0,
            color: light.color.extend(0.0).to_array(),
        })
    }

    pub fn from_prepared(light: &PreparedLight, viewport: Viewport) -> Self {
        Self {
            position: [light.position.x - viewport.x1, light.position.y - viewport.y1],
            radius: light.radius,
            _padding: 0,
            color: light.color.extend(0.0).to_array(),
        }
    }
}

/// Per-dispatch uniform (48 bytes, matches WGSL `CompositeParams`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CompositeParams {
    /// Combined directional color; alpha unused
    pub sun_color: [f32; 4],
    pub ambient: f32,
    pub width: u32,
    pub height: u32,
    /// Lights `[0, static_count)` are static, the rest dynamic
    pub static_count: u32,
    pub light_count: u32,
    pub _padding: [u32; 3],
}
