use bytemuck::{Pod, Zeroable};
use glam::{uvec2, vec2, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{Hit, PatchId, Ray};

/// Planar rectangle of the scene; the unit of geometry shared by all passes.
///
/// `right` and `up` are half-extents, so the quad spans
/// `center ± right ± up`; the surface is one-sided and faces
/// `right × up`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Quad {
    /// x, y, z - center,
    /// w - id of the quad's first patch (as bits)
    pub d0: Vec4,

    /// x, y, z - right half-extent,
    /// w - horizontal patch resolution (as bits)
    pub d1: Vec4,

    /// x, y, z - up half-extent,
    /// w - vertical patch resolution (as bits)
    pub d2: Vec4,

    /// r, g, b - albedo
    pub d3: Vec4,

    /// r, g, b - emission
    pub d4: Vec4,
}

impl Quad {
    pub fn new(
        center: Vec3,
        right: Vec3,
        up: Vec3,
        albedo: Vec3,
        emission: Vec3,
        first_patch: PatchId,
        resolution: UVec2,
    ) -> Self {
        Self {
            d0: center.extend(f32::from_bits(first_patch.get())),
            d1: right.extend(f32::from_bits(resolution.x)),
            d2: up.extend(f32::from_bits(resolution.y)),
            d3: albedo.extend(0.0),
            d4: emission.extend(0.0),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn right(&self) -> Vec3 {
        self.d1.xyz()
    }

    pub fn up(&self) -> Vec3 {
        self.d2.xyz()
    }

    pub fn albedo(&self) -> Vec3 {
        self.d3.xyz()
    }

    pub fn emission(&self) -> Vec3 {
        self.d4.xyz()
    }

    pub fn normal(&self) -> Vec3 {
        self.right().cross(self.up()).normalize()
    }

    pub fn area(&self) -> f32 {
        4.0 * self.right().cross(self.up()).length()
    }

    pub fn first_patch(&self) -> PatchId {
        PatchId::new(self.d0.w.to_bits())
    }

    pub fn resolution(&self) -> UVec2 {
        uvec2(self.d1.w.to_bits(), self.d2.w.to_bits())
    }

    pub fn patch_count(&self) -> u32 {
        let resolution = self.resolution();

        resolution.x * resolution.y
    }

    /// Corners in counter-clockwise order, when looking at the front face.
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.point_at(vec2(-1.0, -1.0)),
            self.point_at(vec2(1.0, -1.0)),
            self.point_at(vec2(1.0, 1.0)),
            self.point_at(vec2(-1.0, 1.0)),
        ]
    }

    /// Maps quad-local coordinates (`-1..=1` on both axes) into world space.
    pub fn point_at(&self, uv: Vec2) -> Vec3 {
        self.center() + self.right() * uv.x + self.up() * uv.y
    }

    /// Inverse of [`Self::point_at()`] for points lying on the quad's plane.
    pub fn uv_at(&self, point: Vec3) -> Vec2 {
        let local = point - self.center();

        vec2(
            local.dot(self.right()) / self.right().length_squared(),
            local.dot(self.up()) / self.up().length_squared(),
        )
    }

    /// Returns coordinates of the patch containing given quad-local point.
    pub fn patch_coords(&self, uv: Vec2) -> UVec2 {
        let resolution = self.resolution();
        let cell = (uv * 0.5 + 0.5) * resolution.as_vec2();

        cell.floor()
            .max(Vec2::ZERO)
            .as_uvec2()
            .min(resolution - UVec2::ONE)
    }

    /// Returns id of the patch containing given quad-local point.
    pub fn patch_at(&self, uv: Vec2) -> PatchId {
        self.patch_id(self.patch_coords(uv))
    }

    pub fn patch_id(&self, coords: UVec2) -> PatchId {
        PatchId::new(
            self.first_patch().get() + coords.y * self.resolution().x + coords.x,
        )
    }

    /// Returns the quad-local center of given patch.
    pub fn patch_center(&self, coords: UVec2) -> Vec2 {
        let resolution = self.resolution().as_vec2();

        (coords.as_vec2() + 0.5) / resolution * 2.0 - 1.0
    }

    /// Intersects this quad with given ray, updating `hit` if the quad is
    /// closer than whatever `hit` currently contains.
    ///
    /// When `two_sided` is false, back faces are ignored (that's what the
    /// rasterizer's culling does as well).
    pub fn hit(&self, ray: Ray, two_sided: bool, hit: &mut Hit) -> bool {
        let normal = self.normal();
        let cos = ray.direction().dot(normal);

        if cos.abs() < f32::EPSILON || (!two_sided && cos > 0.0) {
            return false;
        }

        let distance = (self.center() - ray.origin()).dot(normal) / cos;

        if distance <= 0.0 || distance >= hit.distance {
            return false;
        }

        let point = ray.at(distance);
        let uv = self.uv_at(point);

        if uv.x.abs() > 1.0 || uv.y.abs() > 1.0 {
            return false;
        }

        hit.distance = distance;
        hit.point = point;
        hit.normal = normal;
        hit.uv = uv;

        true
    }
}
