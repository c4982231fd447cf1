use glam::{uvec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::Quad;

/// Returns the reflected radiance stored in `lightmap` at given quad-local
/// point, bilinearly interpolated between centers of the neighbouring
/// patches.
///
/// Points closer to the quad's edge than half a patch get clamped to the
/// outermost patches.
pub fn sample_lightmap(quad: &Quad, uv: Vec2, lightmap: &[Vec4]) -> Vec3 {
    let resolution = quad.resolution();
    let max = (resolution - 1).as_vec2();

    let cell = ((uv * 0.5 + 0.5) * resolution.as_vec2() - 0.5)
        .clamp(Vec2::ZERO, max);

    let c0 = cell.floor();
    let t = cell - c0;
    let c0 = c0.as_uvec2();
    let c1 = (c0 + 1).min(resolution - 1);

    let get = |x: u32, y: u32| {
        lightmap[quad.patch_id(uvec2(x, y)).get() as usize].xyz()
    };

    let bottom = get(c0.x, c0.y).lerp(get(c1.x, c0.y), t.x);
    let top = get(c0.x, c1.y).lerp(get(c1.x, c1.y), t.x);

    bottom.lerp(top, t.y)
}

/// Returns the radiance leaving given point of the quad: its own emission
/// plus whatever it reflects.
pub fn shade(quad: &Quad, uv: Vec2, lightmap: &[Vec4]) -> Vec3 {
    quad.emission() + sample_lightmap(quad, uv, lightmap)
}
