use bytemuck::{Pod, Zeroable};
use glam::Vec2;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RaytracerPassParams {
    pub samples_per_pixel: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TonemapperPassParams {
    pub exposure: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

/// Sub-pixel offsets of the primary rays; four samples use a rotated grid.
pub fn pixel_samples(samples_per_pixel: u32) -> &'static [Vec2] {
    const SINGLE: [Vec2; 1] = [Vec2::new(0.5, 0.5)];

    const ROTATED_GRID: [Vec2; 4] = [
        Vec2::new(0.375, 0.125),
        Vec2::new(0.875, 0.375),
        Vec2::new(0.125, 0.625),
        Vec2::new(0.625, 0.875),
    ];

    if samples_per_pixel >= 4 {
        &ROTATED_GRID
    } else {
        &SINGLE
    }
}
