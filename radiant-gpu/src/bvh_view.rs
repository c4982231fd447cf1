use glam::Vec4;

/// Read-only view over a serialized BVH, see `radiant::Bvh`.
#[derive(Clone, Copy, Debug)]
pub struct BvhView<'a> {
    buffer: &'a [Vec4],
}

impl<'a> BvhView<'a> {
    pub fn new(buffer: &'a [Vec4]) -> Self {
        Self { buffer }
    }

    pub fn get(&self, ptr: u32) -> Vec4 {
        self.buffer[ptr as usize]
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }
}
