use bytemuck::{Pod, Zeroable};

/// Scene-wide constants, uploaded once.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct World {
    pub quad_count: u32,
    pub patch_count: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl World {
    pub fn new(quad_count: u32, patch_count: u32) -> Self {
        Self {
            quad_count,
            patch_count,
            _pad0: 0,
            _pad1: 0,
        }
    }
}
