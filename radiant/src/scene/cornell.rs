use glam::{vec3, Vec3};

use super::{QuadDesc, Scene};

const WHITE: Vec3 = Vec3::new(0.725, 0.71, 0.68);
const RED: Vec3 = Vec3::new(0.63, 0.065, 0.05);
const GREEN: Vec3 = Vec3::new(0.14, 0.45, 0.091);
const LIGHT: Vec3 = Vec3::new(5.0, 5.0, 5.0);

impl Scene {
    /// The classic Cornell box: a 10×10×10 room open towards +Z, with a
    /// red wall on the left, a green wall on the right, a square light on the
    /// ceiling and two boxes on the floor.
    pub fn cornell_box() -> Self {
        let room = [
            // Floor
            QuadDesc::new(Vec3::ZERO, 5.0 * Vec3::Z, 5.0 * Vec3::X)
                .with_albedo(WHITE),
            // Ceiling
            QuadDesc::new(vec3(0.0, 10.0, 0.0), 5.0 * Vec3::X, 5.0 * Vec3::Z)
                .with_albedo(WHITE),
            // Back wall
            QuadDesc::new(vec3(0.0, 5.0, -5.0), 5.0 * Vec3::X, 5.0 * Vec3::Y)
                .with_albedo(WHITE),
            // Left wall
            QuadDesc::new(vec3(-5.0, 5.0, 0.0), -5.0 * Vec3::Z, 5.0 * Vec3::Y)
                .with_albedo(RED),
            // Right wall
            QuadDesc::new(vec3(5.0, 5.0, 0.0), 5.0 * Vec3::Z, 5.0 * Vec3::Y)
                .with_albedo(GREEN),
            // Light
            QuadDesc::new(vec3(0.0, 9.95, 0.0), Vec3::X, Vec3::Z)
                .with_albedo(Vec3::splat(0.78))
                .with_emission(LIGHT),
        ];

        room.into_iter()
            .fold(Scene::builder(), |scene, quad| scene.quad(quad))
            .cuboid(vec3(1.5, 1.5, 1.0), vec3(3.0, 3.0, 3.0), 0.3, WHITE)
            .cuboid(vec3(-2.0, 3.0, -2.0), vec3(3.0, 6.0, 3.0), -0.4, WHITE)
            .build()
            .expect("the stock scene is valid")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cornell_box() {
        let scene = Scene::cornell_box();

        assert_eq!(6 + 5 + 5, scene.quads().len());
        assert_eq!(1, scene.quads().iter().filter(|q| q.is_emitter()).count());

        // Walls face the inside of the room
        for quad in &scene.quads()[0..5] {
            let inwards = (vec3(0.0, 5.0, 0.0) - quad.center).normalize();

            assert_relative_eq!(1.0, quad.normal().dot(inwards), epsilon = 1e-5);
        }

        // Light faces the floor
        assert_eq!(-Vec3::Y, scene.quads()[5].normal());

        let geometry = scene.geometry(1.0, 4096).unwrap();

        // 5 walls of 10×10 patches, a 2×2 light, the short box (4 sides
        // and top, each 3×3) and the tall box (4 sides of 3×6 plus a 3×3
        // top)
        assert_eq!(500 + 4 + 45 + 81, geometry.patch_count());
    }
}
