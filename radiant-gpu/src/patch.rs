use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};

/// Lightmap cell: a sub-rectangle of a [`crate::Quad`] that receives and
/// reflects light as a single unit.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Patch {
    /// x, y, z - center,
    /// w - id of the quad this patch belongs to (as bits)
    pub d0: Vec4,

    /// x, y, z - normal,
    /// w - area
    pub d1: Vec4,

    /// r, g, b - albedo
    pub d2: Vec4,

    /// r, g, b - emission
    pub d3: Vec4,
}

impl Patch {
    pub fn new(
        center: Vec3,
        normal: Vec3,
        area: f32,
        albedo: Vec3,
        emission: Vec3,
        quad_id: u32,
    ) -> Self {
        Self {
            d0: center.extend(f32::from_bits(quad_id)),
            d1: normal.extend(area),
            d2: albedo.extend(0.0),
            d3: emission.extend(0.0),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn quad_id(&self) -> u32 {
        self.d0.w.to_bits()
    }

    pub fn normal(&self) -> Vec3 {
        self.d1.xyz()
    }

    pub fn area(&self) -> f32 {
        self.d1.w
    }

    pub fn albedo(&self) -> Vec3 {
        self.d2.xyz()
    }

    pub fn emission(&self) -> Vec3 {
        self.d3.xyz()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatchId(u32);

impl PatchId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}
