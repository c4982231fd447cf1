use bytemuck::{Pod, Zeroable};
use glam::{vec2, Mat4, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::Ray;

/// Per-frame view state, shared by every pass that looks at the scene.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Camera {
    pub projection_view: Mat4,
    pub ndc_to_world: Mat4,

    /// x, y, z - position,
    /// w - aspect ratio
    pub origin: Vec4,

    /// x - frame index (as bits),
    /// y, z, w - unused
    pub data: Vec4,
}

impl Camera {
    pub fn new(
        projection_view: Mat4,
        origin: Vec3,
        aspect: f32,
        frame: u32,
    ) -> Self {
        Self {
            projection_view,
            ndc_to_world: projection_view.inverse(),
            origin: origin.extend(aspect),
            data: Vec4::new(f32::from_bits(frame), 0.0, 0.0, 0.0),
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin.xyz()
    }

    pub fn aspect(&self) -> f32 {
        self.origin.w
    }

    pub fn frame(&self) -> u32 {
        self.data.x.to_bits()
    }

    /// Given a point in world-coordinates, returns it in clip-coordinates.
    pub fn world_to_clip(&self, pos: Vec3) -> Vec4 {
        self.projection_view * pos.extend(1.0)
    }

    /// Given a (possibly fractional) pixel position, returns it in
    /// normalized device coordinates.
    pub fn screen_to_ndc(pos: Vec2, screen_size: UVec2) -> Vec2 {
        let ndc = pos * 2.0 / screen_size.as_vec2() - Vec2::ONE;

        vec2(ndc.x, -ndc.y)
    }

    /// Given a point in clip-coordinates, returns its (fractional) pixel
    /// position.
    pub fn clip_to_screen(pos: Vec4, screen_size: UVec2) -> Vec2 {
        let ndc = pos.xy() / pos.w;
        let ndc = vec2(ndc.x, -ndc.y);

        (0.5 * ndc + 0.5) * screen_size.as_vec2()
    }

    /// Casts a ray from the near plane through given point in normalized
    /// device coordinates.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let near_plane = self.ndc_to_world.project_point3(ndc.extend(0.0));
        let far_plane = self.ndc_to_world.project_point3(ndc.extend(1.0));

        Ray::new(near_plane, (far_plane - near_plane).normalize())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec3};

    use super::*;

    fn target() -> Camera {
        let projection = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_4,
            1.0,
            0.5,
            100.0,
        );

        let view = Mat4::look_at_rh(Vec3::ZERO, vec3(0.0, 0.0, -1.0), Vec3::Y);

        Camera::new(projection * view, Vec3::ZERO, 1.0, 7)
    }

    #[test]
    fn accessors() {
        let target = target();

        assert_eq!(Vec3::ZERO, target.origin());
        assert_eq!(1.0, target.aspect());
        assert_eq!(7, target.frame());
    }

    #[test]
    fn ray_through_center() {
        let ray = target().ray(Vec2::ZERO);

        assert_relative_eq!(0.0, ray.direction().x, epsilon = 1e-5);
        assert_relative_eq!(0.0, ray.direction().y, epsilon = 1e-5);
        assert_relative_eq!(-1.0, ray.direction().z, epsilon = 1e-5);
        assert_relative_eq!(-0.5, ray.origin().z, epsilon = 1e-4);
    }

    #[test]
    fn screen_round_trip() {
        let target = target();
        let screen_size = uvec2(64, 32);
        let point = vec3(0.3, -0.2, -4.0);

        let screen = Camera::clip_to_screen(target.world_to_clip(point), screen_size);
        let ray = target.ray(Camera::screen_to_ndc(screen, screen_size));
        let expected = (point - ray.origin()).normalize();

        assert_relative_eq!(expected.x, ray.direction().x, epsilon = 1e-4);
        assert_relative_eq!(expected.y, ray.direction().y, epsilon = 1e-4);
        assert_relative_eq!(expected.z, ray.direction().z, epsilon = 1e-4);
    }
}
