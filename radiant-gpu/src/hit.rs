use glam::{Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub quad_id: u32,
}

impl Hit {
    /// How far to move a point away from its surface to avoid
    /// self-intersection when casting visibility rays
    pub const NUDGE_OFFSET: f32 = 0.001;

    pub fn none() -> Self {
        Self {
            distance: f32::MAX,
            point: Default::default(),
            normal: Default::default(),
            uv: Default::default(),
            quad_id: u32::MAX,
        }
    }

    pub fn is_some(&self) -> bool {
        self.distance < f32::MAX
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }
}

impl Default for Hit {
    fn default() -> Self {
        Self::none()
    }
}
