use glam::{vec2, UVec2, Vec2, Vec3, Vec4};
use radiant_gpu as gpu;

use crate::{triangulate, Geometry};

/// Rasterizes the scene the way the raster pipeline does: back faces get
/// culled, each pixel is sampled at its center, attributes are interpolated
/// perspective-correctly, and the nearest fragment wins.
///
/// Returns HDR colors, row after row, starting at the top-left corner.
pub fn rasterize(
    geometry: &Geometry,
    camera: &gpu::Camera,
    lightmap: &[Vec4],
    size: UVec2,
) -> Vec<Vec3> {
    let (vertices, indices) = triangulate(&geometry.quads);
    let mut color = vec![Vec3::ZERO; (size.x * size.y) as usize];
    let mut depth = vec![f32::MAX; color.len()];

    for triangle in indices.chunks_exact(3) {
        let vertices = [
            vertices[triangle[0] as usize],
            vertices[triangle[1] as usize],
            vertices[triangle[2] as usize],
        ];

        let quad = &geometry.quads[vertices[0].quad_id as usize];

        if quad.normal().dot(camera.origin() - quad.center()) <= 0.0 {
            continue;
        }

        let clip = vertices.map(|vertex| {
            camera.world_to_clip(Vec3::from_array(vertex.position))
        });

        // Geometry behind the camera would need clipping; the orbit never
        // gets close enough to the room for that to happen
        if clip.iter().any(|clip| clip.w <= 0.0) {
            continue;
        }

        let screen = clip.map(|clip| gpu::Camera::clip_to_screen(clip, size));
        let depths = clip.map(|clip| clip.z / clip.w);
        let inv_w = clip.map(|clip| 1.0 / clip.w);
        let uvs = vertices.map(|vertex| Vec2::from_array(vertex.uv));

        let area = edge(screen[0], screen[1], screen[2]);

        if area.abs() < f32::EPSILON {
            continue;
        }

        let min = screen[0].min(screen[1]).min(screen[2]).floor().max(Vec2::ZERO);

        let max = screen[0]
            .max(screen[1])
            .max(screen[2])
            .ceil()
            .min(size.as_vec2());

        for y in (min.y as u32)..(max.y as u32) {
            for x in (min.x as u32)..(max.x as u32) {
                let pos = vec2(x as f32 + 0.5, y as f32 + 0.5);

                let weights = [
                    edge(screen[1], screen[2], pos) / area,
                    edge(screen[2], screen[0], pos) / area,
                    edge(screen[0], screen[1], pos) / area,
                ];

                if weights.iter().any(|weight| *weight < 0.0) {
                    continue;
                }

                let z = weights[0] * depths[0]
                    + weights[1] * depths[1]
                    + weights[2] * depths[2];

                let idx = (y * size.x + x) as usize;

                if !(0.0..=1.0).contains(&z) || z >= depth[idx] {
                    continue;
                }

                let w = weights[0] * inv_w[0]
                    + weights[1] * inv_w[1]
                    + weights[2] * inv_w[2];

                let uv = (weights[0] * inv_w[0] * uvs[0]
                    + weights[1] * inv_w[1] * uvs[1]
                    + weights[2] * inv_w[2] * uvs[2])
                    / w;

                depth[idx] = z;
                color[idx] = gpu::shade(quad, uv, lightmap);
            }
        }
    }

    color
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, Mat4};

    use super::*;
    use crate::{QuadDesc, Scene};

    fn camera() -> gpu::Camera {
        let projection = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            0.5,
            100.0,
        );

        let view = Mat4::look_at_rh(vec3(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);

        gpu::Camera::new(projection * view, vec3(0.0, 0.0, 5.0), 1.0, 0)
    }

    #[test]
    fn culling_and_depth() {
        let scene = Scene::builder()
            // Far quad, facing the camera
            .quad(
                QuadDesc::new(vec3(0.0, 0.0, -1.0), 2.0 * Vec3::X, 2.0 * Vec3::Y)
                    .with_emission(vec3(1.0, 0.0, 0.0)),
            )
            // Near quad, facing the camera, covering the left half
            .quad(
                QuadDesc::new(vec3(-1.0, 0.0, 0.0), Vec3::X, Vec3::Y)
                    .with_emission(vec3(0.0, 1.0, 0.0)),
            )
            // Nearest quad, facing away
            .quad(
                QuadDesc::new(vec3(0.0, 0.0, 1.0), Vec3::Y, Vec3::X)
                    .with_emission(vec3(0.0, 0.0, 1.0)),
            )
            .build()
            .unwrap();

        let geometry = scene.geometry(4.0, 16).unwrap();
        let lightmap = vec![Vec4::ZERO; geometry.patch_count()];
        let size = uvec2(32, 32);
        let image = rasterize(&geometry, &camera(), &lightmap, size);
        let at = |x: u32, y: u32| image[(y * size.x + x) as usize];

        assert_eq!(vec3(0.0, 1.0, 0.0), at(12, 16));
        assert_eq!(vec3(1.0, 0.0, 0.0), at(20, 16));
        assert_eq!(Vec3::ZERO, at(0, 0));
    }
}
