use glam::{vec4, Vec4};
use radiant_gpu::{BVH_OP_INTERNAL, BVH_OP_LEAF};

use super::{BvhNode, BvhNodeId, BvhNodes};

pub fn run(nodes: &BvhNodes) -> Vec<Vec4> {
    let mut buffer = Vec::new();

    walk(nodes, &mut buffer, BvhNodeId::root());

    buffer
}

fn walk(nodes: &BvhNodes, buffer: &mut Vec<Vec4>, id: BvhNodeId) -> u32 {
    let ptr = buffer.len();

    match nodes[id] {
        BvhNode::Internal {
            left_id, right_id, ..
        } => {
            buffer.push(Default::default());
            buffer.push(Default::default());
            buffer.push(Default::default());
            buffer.push(Default::default());

            let _left_ptr = walk(nodes, buffer, left_id);
            let right_ptr = walk(nodes, buffer, right_id);

            serialize_internal_node(
                nodes,
                &mut buffer[ptr..],
                left_id,
                right_id,
                right_ptr,
            );
        }

        BvhNode::Leaf { primitives_ref, .. } => {
            let primitives = nodes.primitives(primitives_ref);

            for (primitive_idx, primitive) in primitives.iter().enumerate() {
                let has_more = primitive_idx + 1 < primitives.len();

                buffer.push(vec4(
                    f32::from_bits(has_more as u32),
                    f32::from_bits(primitive.quad_id),
                    Default::default(),
                    f32::from_bits(BVH_OP_LEAF),
                ));
            }
        }
    }

    ptr as u32
}

fn serialize_internal_node(
    nodes: &BvhNodes,
    buffer: &mut [Vec4],
    left_id: BvhNodeId,
    right_id: BvhNodeId,
    right_ptr: u32,
) {
    let left_bb = nodes[left_id].bounds();
    let right_bb = nodes[right_id].bounds();

    buffer[0] = left_bb.min().extend(f32::from_bits(BVH_OP_INTERNAL));
    buffer[1] = left_bb.max().extend(f32::from_bits(right_ptr));
    buffer[2] = right_bb.min().extend(Default::default());
    buffer[3] = right_bb.max().extend(Default::default());
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, Vec3};
    use radiant_gpu as gpu;

    use super::*;
    use crate::Bvh;

    #[test]
    fn layout() {
        let quad = |x: f32| {
            gpu::Quad::new(
                vec3(x, 0.0, 0.0),
                Vec3::X * 0.5,
                Vec3::Y * 0.5,
                Vec3::splat(0.5),
                Vec3::ZERO,
                gpu::PatchId::new(0),
                uvec2(1, 1),
            )
        };

        let bvh = Bvh::build(&[quad(-10.0), quad(10.0)]).unwrap();
        let buffer = bvh.buffer();

        // Root with two single-quad leaves
        assert_eq!(6, buffer.len());
        assert_eq!(BVH_OP_INTERNAL, buffer[0].w.to_bits());
        assert_eq!(5, buffer[1].w.to_bits());

        for ptr in [4, 5] {
            assert_eq!(BVH_OP_LEAF, buffer[ptr].w.to_bits());
            assert_eq!(0, buffer[ptr].x.to_bits());
        }

        // Left child's bounds must match the quad stored right after the
        // internal node
        let left_quad = buffer[4].y.to_bits();
        let expected_x = if left_quad == 0 { -10.0 } else { 10.0 };

        assert!((buffer[0].x - (expected_x - 0.5)).abs() < 1e-3);
    }
}
