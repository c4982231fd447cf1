mod builder;
mod node;
mod serializer;

use glam::Vec4;
use log::info;
use radiant_gpu as gpu;
use thiserror::Error;

pub use self::node::*;
use crate::utils;

/// Bounding volume hierarchy over the scene's quads, serialized into the
/// layout understood by `radiant_gpu::Ray::trace_*()` and the raytracing
/// shader.
///
/// Internal node occupies four `Vec4`s:
///
/// - `d0.xyz` = left child's min, `d0.w` = opcode,
/// - `d1.xyz` = left child's max, `d1.w` = pointer to the right child,
/// - `d2.xyz` = right child's min,
/// - `d3.xyz` = right child's max,
///
/// with the left child stored right after it; leaf occupies one `Vec4` per
/// quad (`x` = has-more flag, `y` = quad id, `w` = opcode).
#[derive(Clone, Debug)]
pub struct Bvh {
    nodes: BvhNodes,
    buffer: Vec<Vec4>,
    depth: usize,
}

impl Bvh {
    pub fn build(quads: &[gpu::Quad]) -> Result<Self, BvhError> {
        let (nodes, depth) =
            utils::measure("bvh", || builder::run(quads))?;

        if depth > gpu::BVH_STACK_SIZE {
            return Err(BvhError::TooDeep {
                depth,
                max: gpu::BVH_STACK_SIZE,
            });
        }

        let buffer = serializer::run(&nodes);

        info!(
            "BVH built; nodes={}, depth={depth}, size={} bytes",
            nodes.len(),
            buffer.len() * std::mem::size_of::<Vec4>(),
        );

        Ok(Self {
            nodes,
            buffer,
            depth,
        })
    }

    pub fn nodes(&self) -> &BvhNodes {
        &self.nodes
    }

    pub fn buffer(&self) -> &[Vec4] {
        &self.buffer
    }

    pub fn view(&self) -> gpu::BvhView<'_> {
        gpu::BvhView::new(&self.buffer)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BvhError {
    #[error("there's nothing to build the BVH from")]
    Empty,

    #[error("quad #{quad} has non-finite bounds")]
    NonFiniteBounds { quad: usize },

    #[error("BVH is {depth} levels deep, but traversal supports at most {max}")]
    TooDeep { depth: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::Scene;

    /// Finds the nearest front-facing hit by checking every quad.
    fn brute_force(quads: &[gpu::Quad], ray: gpu::Ray) -> gpu::Hit {
        let mut hit = gpu::Hit::none();

        for (quad_id, quad) in quads.iter().enumerate() {
            if quad.hit(ray, false, &mut hit) {
                hit.quad_id = quad_id as u32;
            }
        }

        hit
    }

    #[test]
    fn empty() {
        assert_eq!(Some(BvhError::Empty), Bvh::build(&[]).err());
    }

    #[test]
    fn non_finite() {
        let mut quads = Scene::cornell_box().geometry(2.0, 4096).unwrap().quads;

        quads[3].d0.x = f32::INFINITY;

        assert_eq!(
            Some(BvhError::NonFiniteBounds { quad: 3 }),
            Bvh::build(&quads).err()
        );
    }

    #[test]
    fn too_deep() {
        // Quads spaced exponentially along each axis, so that every split can
        // peel off only a handful of them
        let quads: Vec<_> = (0..=50)
            .flat_map(|i| {
                [Vec3::X, Vec3::Y, Vec3::Z].map(|axis| axis * 2.0f32.powi(i))
            })
            .map(|center| {
                gpu::Quad::new(
                    center,
                    0.01 * Vec3::X,
                    0.01 * Vec3::Y,
                    Vec3::splat(0.5),
                    Vec3::ZERO,
                    gpu::PatchId::new(0),
                    uvec2(1, 1),
                )
            })
            .collect();

        match Bvh::build(&quads) {
            Err(BvhError::TooDeep { depth, max }) => {
                assert_eq!(gpu::BVH_STACK_SIZE, max);
                assert!(depth > max);
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn single_quad() {
        let quad = gpu::Quad::new(
            vec3(0.0, 0.0, -3.0),
            Vec3::X,
            Vec3::Y,
            Vec3::splat(0.5),
            Vec3::ZERO,
            gpu::PatchId::new(0),
            uvec2(1, 1),
        );

        let bvh = Bvh::build(&[quad]).unwrap();

        assert_eq!(1, bvh.buffer().len());

        let hit = gpu::Ray::new(Vec3::ZERO, -Vec3::Z)
            .trace_nearest(&[quad], bvh.view());

        assert_eq!(0, hit.quad_id);
    }

    #[test]
    fn matches_brute_force() {
        let quads = Scene::cornell_box().geometry(2.0, 4096).unwrap().quads;
        let bvh = Bvh::build(&quads).unwrap();
        let mut rng = StdRng::seed_from_u64(1234);

        assert!(bvh.depth() <= gpu::BVH_STACK_SIZE);

        for _ in 0..2000 {
            let origin = vec3(
                rng.gen_range(-4.9..4.9),
                rng.gen_range(0.1..9.9),
                rng.gen_range(-4.9..12.0),
            );

            let direction = vec3(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize();

            let ray = gpu::Ray::new(origin, direction);
            let expected = brute_force(&quads, ray);
            let actual = ray.trace_nearest(&quads, bvh.view());

            assert_eq!(expected.quad_id, actual.quad_id);
            assert_eq!(expected.distance, actual.distance);

            // ---

            if expected.is_some() {
                let max_distance = expected.distance;

                assert!(ray.trace_any(&quads, bvh.view(), max_distance + 0.01));
            }
        }
    }
}
