use core::mem;

use glam::{Vec3, Vec4Swizzles};

use crate::{BvhView, Hit, Quad, BVH_STACK_SIZE};

/// Tag stored in `w` of a node's first vector, telling internal nodes apart
/// from leaves.
pub const BVH_OP_INTERNAL: u32 = 0;
pub const BVH_OP_LEAF: u32 = 1;

#[derive(Copy, Clone, Debug, Default)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Traces this ray and returns its nearest hit, ignoring back faces.
    pub fn trace_nearest(self, quads: &[Quad], bvh: BvhView) -> Hit {
        let mut hit = Hit::none();

        self.trace(quads, bvh, TracingMode::Nearest, &mut hit);

        hit
    }

    /// Traces this ray and returns whether it hits anything (from either
    /// side) up to the given distance.
    pub fn trace_any(
        self,
        quads: &[Quad],
        bvh: BvhView,
        max_distance: f32,
    ) -> bool {
        let mut hit = Hit {
            distance: max_distance,
            ..Hit::none()
        };

        self.trace(quads, bvh, TracingMode::Any, &mut hit);

        hit.distance < max_distance
    }

    fn trace(
        self,
        quads: &[Quad],
        bvh: BvhView,
        mode: TracingMode,
        hit: &mut Hit,
    ) {
        if bvh.len() == 0 {
            return;
        }

        // Index into the `bvh` array; points at the currently processed node
        let mut bvh_ptr = 0;

        let mut stack = [0u32; BVH_STACK_SIZE];
        let mut stack_ptr = 0;

        loop {
            let d0 = bvh.get(bvh_ptr);

            if d0.w.to_bits() == BVH_OP_INTERNAL {
                let d1 = bvh.get(bvh_ptr + 1);
                let d2 = bvh.get(bvh_ptr + 2);
                let d3 = bvh.get(bvh_ptr + 3);

                let mut near_ptr = bvh_ptr + 4;
                let mut far_ptr = d1.w.to_bits();

                let mut near_distance =
                    self.distance_to_node(d0.xyz(), d1.xyz());

                let mut far_distance =
                    self.distance_to_node(d2.xyz(), d3.xyz());

                if far_distance < near_distance {
                    mem::swap(&mut near_ptr, &mut far_ptr);
                    mem::swap(&mut near_distance, &mut far_distance);
                }

                // Visit the closer child first and save the other one for
                // later, but only if either of them can beat the current hit
                if far_distance < hit.distance && stack_ptr < BVH_STACK_SIZE {
                    stack[stack_ptr] = far_ptr;
                    stack_ptr += 1;
                }

                if near_distance < hit.distance {
                    bvh_ptr = near_ptr;
                    continue;
                }
            } else {
                let has_more_quads = d0.x.to_bits() & 1 == 1;
                let quad_id = d0.y.to_bits();
                let two_sided = mode == TracingMode::Any;

                if quads[quad_id as usize].hit(self, two_sided, hit) {
                    hit.quad_id = quad_id;

                    if two_sided {
                        break;
                    }
                }

                if has_more_quads {
                    bvh_ptr += 1;
                    continue;
                }
            }

            if stack_ptr > 0 {
                stack_ptr -= 1;
                bvh_ptr = stack[stack_ptr];
            } else {
                break;
            }
        }
    }

    fn distance_to_node(self, aabb_min: Vec3, aabb_max: Vec3) -> f32 {
        let hit_min = (aabb_min - self.origin) * self.inv_direction;
        let hit_max = (aabb_max - self.origin) * self.inv_direction;

        let tmin = hit_min.min(hit_max).max_element();
        let tmax = hit_min.max(hit_max).min_element();

        if tmax >= tmin && tmax >= 0.0 {
            tmin
        } else {
            f32::MAX
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TracingMode {
    Nearest,
    Any,
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, vec4, Vec4};

    use super::*;
    use crate::PatchId;

    fn quads() -> Vec<Quad> {
        let quad = |z: f32| {
            Quad::new(
                vec3(0.0, 0.0, z),
                vec3(1.0, 0.0, 0.0),
                vec3(0.0, 1.0, 0.0),
                Vec3::splat(0.5),
                Vec3::ZERO,
                PatchId::new(0),
                uvec2(1, 1),
            )
        };

        vec![quad(-2.0), quad(-4.0)]
    }

    fn leaf(quad_id: u32, has_more: bool) -> Vec4 {
        vec4(
            f32::from_bits(has_more as u32),
            f32::from_bits(quad_id),
            0.0,
            f32::from_bits(BVH_OP_LEAF),
        )
    }

    /// Root node with quad #1 on the left and quad #0 on the right, so that
    /// the traversal has to pick the right child first.
    fn bvh() -> Vec<Vec4> {
        vec![
            vec4(-1.0, -1.0, -4.0, f32::from_bits(BVH_OP_INTERNAL)),
            vec4(1.0, 1.0, -4.0, f32::from_bits(5)),
            vec4(-1.0, -1.0, -2.0, 0.0),
            vec4(1.0, 1.0, -2.0, 0.0),
            leaf(1, false),
            leaf(0, false),
        ]
    }

    #[test]
    fn trace_nearest() {
        let quads = quads();
        let bvh = bvh();
        let bvh = BvhView::new(&bvh);

        // Case 1: Both quads are in front, the closer one wins
        let hit = Ray::new(Vec3::ZERO, vec3(0.0, 0.0, -1.0))
            .trace_nearest(&quads, bvh);

        assert_eq!(0, hit.quad_id);
        assert_eq!(2.0, hit.distance);

        // Case 2: Looking from behind - back faces are skipped
        let hit = Ray::new(vec3(0.0, 0.0, -10.0), vec3(0.0, 0.0, 1.0))
            .trace_nearest(&quads, bvh);

        assert!(hit.is_none());

        // Case 3: Looking away
        let hit = Ray::new(Vec3::ZERO, vec3(0.0, 0.0, 1.0))
            .trace_nearest(&quads, bvh);

        assert!(hit.is_none());
    }

    #[test]
    fn trace_any() {
        let quads = quads();
        let bvh = bvh();
        let bvh = BvhView::new(&bvh);

        let ray = Ray::new(vec3(0.0, 0.0, -10.0), vec3(0.0, 0.0, 1.0));

        assert!(ray.trace_any(&quads, bvh, 100.0));
        assert!(ray.trace_any(&quads, bvh, 6.5));
        assert!(!ray.trace_any(&quads, bvh, 5.5));
    }

    #[test]
    fn trace_empty_bvh() {
        let ray = Ray::new(Vec3::ZERO, vec3(0.0, 0.0, -1.0));

        assert!(ray.trace_nearest(&[], BvhView::new(&[])).is_none());
        assert!(!ray.trace_any(&[], BvhView::new(&[]), 100.0));
    }
}
