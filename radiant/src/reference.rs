//! Host-side twins of the GPU passes.
//!
//! They share the algorithms from [`radiant_gpu`] with the shaders, but not
//! the plumbing, which makes them useful both for checking the GPU side and
//! for rendering on machines without a suitable adapter.

mod radiosity;
mod raster;
mod raytrace;

use glam::Vec3;
use radiant_gpu as gpu;

pub use self::radiosity::*;
pub use self::raster::*;
pub use self::raytrace::*;

/// Tonemaps an HDR image into tightly packed RGBA8 texels, exactly like the
/// tonemapping pass does.
pub fn tonemap(image: &[Vec3], exposure: f32) -> Vec<u8> {
    image
        .iter()
        .flat_map(|&color| {
            let color = gpu::tonemap(color, exposure);

            [
                (color.x * 255.0).round() as u8,
                (color.y * 255.0).round() as u8,
                (color.z * 255.0).round() as u8,
                255,
            ]
        })
        .collect()
}
