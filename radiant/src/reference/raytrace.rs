use glam::{vec2, UVec2, Vec3, Vec4};
use radiant_gpu as gpu;

use crate::{Bvh, Geometry};

/// Renders the scene by casting primary rays through the BVH, the way the
/// raytracing pass does.
///
/// Returns HDR colors, row after row, starting at the top-left corner.
pub fn raytrace(
    geometry: &Geometry,
    bvh: &Bvh,
    camera: &gpu::Camera,
    lightmap: &[Vec4],
    size: UVec2,
    samples_per_pixel: u32,
) -> Vec<Vec3> {
    let samples = gpu::pixel_samples(samples_per_pixel);
    let mut image = Vec::with_capacity((size.x * size.y) as usize);

    for y in 0..size.y {
        for x in 0..size.x {
            let mut color = Vec3::ZERO;

            for sample in samples {
                let pos = vec2(x as f32, y as f32) + *sample;
                let ray = camera.ray(gpu::Camera::screen_to_ndc(pos, size));
                let hit = ray.trace_nearest(&geometry.quads, bvh.view());

                if hit.is_some() {
                    color += gpu::shade(
                        &geometry.quads[hit.quad_id as usize],
                        hit.uv,
                        lightmap,
                    );
                }
            }

            image.push(color / samples.len() as f32);
        }
    }

    image
}
