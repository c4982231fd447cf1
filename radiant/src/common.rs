use std::f32::consts::FRAC_PI_4;
use std::time::{Duration, Instant};

use glam::{vec3, Mat4, Vec3};
use log::trace;
use radiant_gpu as gpu;

use crate::MappedUniformBuffer;

/// Camera orbiting around the room's center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    /// Current angle, in radians.
    pub angle: f32,

    /// Angular speed when rotating, in radians per second.
    pub speed: f32,
}

impl Orbit {
    pub const DISTANCE: f32 = 15.0;
    pub const HEIGHT: f32 = 5.0;
    pub const FOV: f32 = FRAC_PI_4;
    pub const NEAR: f32 = 0.5;
    pub const FAR: f32 = 100.0;

    pub fn advance(&mut self, dt: Duration) {
        self.angle += self.speed * dt.as_secs_f32();
    }

    pub fn eye(&self) -> Vec3 {
        vec3(
            self.angle.sin() * Self::DISTANCE,
            Self::HEIGHT,
            self.angle.cos() * Self::DISTANCE,
        )
    }

    pub fn camera(&self, aspect: f32, frame: u32) -> gpu::Camera {
        let projection =
            Mat4::perspective_rh(Self::FOV, aspect, Self::NEAR, Self::FAR);

        let view = Mat4::look_at_rh(
            self.eye(),
            vec3(0.0, Self::HEIGHT, 0.0),
            Vec3::Y,
        );

        gpu::Camera::new(projection * view, self.eye(), aspect, frame)
    }
}

impl Default for Orbit {
    fn default() -> Self {
        Self {
            angle: 0.0,
            speed: 0.5,
        }
    }
}

/// Per-frame state shared by all the passes that look at the scene.
#[derive(Debug)]
pub struct Common {
    camera: MappedUniformBuffer<gpu::Camera>,
    orbit: Orbit,
    frame: u32,
    last_update: Option<Instant>,
}

impl Common {
    pub fn new(device: &wgpu::Device, aspect: f32) -> Self {
        let orbit = Orbit::default();

        Self {
            camera: MappedUniformBuffer::new(
                device,
                "radiant_camera",
                orbit.camera(aspect, 0),
            ),
            orbit,
            frame: 0,
            last_update: None,
        }
    }

    /// Recomputes the camera; when `rotate_camera` is set, the camera moves
    /// by however much wall-clock time passed since the previous update.
    pub fn update(&mut self, rotate_camera: bool, aspect: f32) {
        let now = Instant::now();

        let dt = self
            .last_update
            .map(|last_update| now - last_update)
            .unwrap_or_default();

        self.last_update = Some(now);
        self.update_with(rotate_camera, aspect, dt);
    }

    /// Like [`Self::update()`], but with the elapsed time provided by the
    /// caller.
    pub fn update_with(&mut self, rotate_camera: bool, aspect: f32, dt: Duration) {
        if rotate_camera {
            self.orbit.advance(dt);
        }

        self.frame = self.frame.wrapping_add(1);
        *self.camera = self.orbit.camera(aspect, self.frame);

        trace!(
            "Camera updated; frame={}, angle={}",
            self.frame,
            self.orbit.angle
        );
    }

    pub fn flush(&mut self, queue: &wgpu::Queue) {
        self.camera.flush(queue);
    }

    pub fn camera(&self) -> &gpu::Camera {
        &self.camera
    }

    pub fn camera_buffer(&self) -> &MappedUniformBuffer<gpu::Camera> {
        &self.camera
    }

    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut Orbit {
        &mut self.orbit
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec2;

    use super::*;

    #[test]
    fn orbit() {
        let mut target = Orbit::default();

        assert_eq!(vec3(0.0, 5.0, 15.0), target.eye());

        target.advance(Duration::from_secs(2));

        assert_relative_eq!(1.0, target.angle);

        // Camera always looks at the room's center
        let camera = target.camera(16.0 / 9.0, 3);
        let ray = camera.ray(Vec2::ZERO);
        let expected = (vec3(0.0, 5.0, 0.0) - target.eye()).normalize();

        assert_relative_eq!(expected.x, ray.direction().x, epsilon = 1e-4);
        assert_relative_eq!(expected.y, ray.direction().y, epsilon = 1e-4);
        assert_relative_eq!(expected.z, ray.direction().z, epsilon = 1e-4);
        assert_eq!(3, camera.frame());
        assert_relative_eq!(16.0 / 9.0, camera.aspect());
    }

    #[test]
    fn orbit_is_deterministic() {
        let mut a = Orbit::default();
        let mut b = Orbit::default();

        for _ in 0..10 {
            a.advance(Duration::from_millis(100));
        }

        b.advance(Duration::from_secs(1));

        assert_relative_eq!(a.angle, b.angle, epsilon = 1e-5);
    }
}
