use std::collections::VecDeque;

use radiant_gpu as gpu;

use super::{BvhError, BvhNode, BvhNodeId, BvhNodes, BvhPrimitive, BvhPrimitivesRef};
use crate::{Axis, BoundingBox};

const BINS: usize = 12;

/// Quads are flat, so their boxes get a bit of thickness to keep the slab
/// test well-behaved.
const BOUNDS_MARGIN: f32 = 1e-4;

/// Builds BVH using binned SAH; returns the nodes together with the tree's
/// depth.
pub fn run(quads: &[gpu::Quad]) -> Result<(BvhNodes, usize), BvhError> {
    if quads.is_empty() {
        return Err(BvhError::Empty);
    }

    let primitives = quads
        .iter()
        .enumerate()
        .map(|(quad_id, quad)| {
            let corners = quad.corners();

            if corners.iter().any(|corner| !corner.is_finite()) {
                return Err(BvhError::NonFiniteBounds { quad: quad_id });
            }

            let bounds = corners
                .into_iter()
                .collect::<BoundingBox>()
                .inflated(BOUNDS_MARGIN);

            Ok(BvhPrimitive {
                quad_id: quad_id as u32,
                bounds,
                center: bounds.center(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut nodes = BvhNodes::new(primitives);
    let primitives_ref = nodes.all_primitives();

    let root = nodes.push(BvhNode::Leaf {
        bounds: bounds_of(&nodes, primitives_ref),
        primitives_ref,
    });

    let mut stack = VecDeque::from_iter([(root, 1)]);
    let mut depth = 1;

    while let Some((node_id, node_depth)) = stack.pop_front() {
        depth = depth.max(node_depth);

        if let Some((left_id, right_id)) = balance(&mut nodes, node_id) {
            stack.push_back((left_id, node_depth + 1));
            stack.push_back((right_id, node_depth + 1));
        }
    }

    Ok((nodes, depth))
}

fn balance(
    nodes: &mut BvhNodes,
    node_id: BvhNodeId,
) -> Option<(BvhNodeId, BvhNodeId)> {
    let BvhNode::Leaf {
        bounds,
        primitives_ref,
    } = nodes[node_id]
    else {
        unreachable!();
    };

    if primitives_ref.len() <= 1 {
        return None;
    }

    let plane = find_splitting_plane(nodes.primitives(primitives_ref))?;

    if plane.split_cost >= nodes[node_id].sah_cost() {
        return None;
    }

    // Partition primitives in place, left side first
    let primitives = nodes.primitives_mut(primitives_ref);
    let mut mid = 0;

    for idx in 0..primitives.len() {
        if primitives[idx].center[plane.split_by] < plane.split_at {
            primitives.swap(idx, mid);
            mid += 1;
        }
    }

    if mid == 0 || mid == primitives.len() {
        return None;
    }

    let left_ref = BvhPrimitivesRef::new(
        primitives_ref.start(),
        primitives_ref.start() + mid,
    );

    let right_ref =
        BvhPrimitivesRef::new(primitives_ref.start() + mid, primitives_ref.end());

    let left_id = nodes.push(BvhNode::Leaf {
        bounds: bounds_of(nodes, left_ref),
        primitives_ref: left_ref,
    });

    let right_id = nodes.push(BvhNode::Leaf {
        bounds: bounds_of(nodes, right_ref),
        primitives_ref: right_ref,
    });

    nodes[node_id] = BvhNode::Internal {
        bounds,
        left_id,
        right_id,
    };

    Some((left_id, right_id))
}

fn find_splitting_plane(primitives: &[BvhPrimitive]) -> Option<SplittingPlane> {
    let centroid_bb: BoundingBox =
        primitives.iter().map(|primitive| primitive.center).collect();

    let extent = centroid_bb.extent();
    let mut best: Option<SplittingPlane> = None;

    for split_by in Axis::all() {
        if extent[split_by] <= 0.0 {
            continue;
        }

        let mut bins = [Bin::default(); BINS];
        let scale = (BINS as f32) / extent[split_by];

        for primitive in primitives {
            let bin_idx = scale
                * (primitive.center[split_by] - centroid_bb.min()[split_by]);

            let bin_idx = (bin_idx as usize).min(BINS - 1);

            bins[bin_idx].count += 1;
            bins[bin_idx].bounds += primitive.bounds;
        }

        // ---

        let mut left_areas = [0.0; BINS - 1];
        let mut right_areas = [0.0; BINS - 1];
        let mut left_counts = [0; BINS - 1];
        let mut right_counts = [0; BINS - 1];
        let mut left_bb = BoundingBox::default();
        let mut right_bb = BoundingBox::default();
        let mut left_count = 0;
        let mut right_count = 0;

        for i in 0..(BINS - 1) {
            let left_bin = bins[i];

            left_count += left_bin.count;
            left_counts[i] = left_count;

            if left_bin.bounds.is_set() {
                left_bb += left_bin.bounds;
            }

            left_areas[i] = left_bb.half_area();

            // ---

            let right_bin = bins[BINS - 1 - i];

            right_count += right_bin.count;
            right_counts[BINS - 2 - i] = right_count;

            if right_bin.bounds.is_set() {
                right_bb += right_bin.bounds;
            }

            right_areas[BINS - 2 - i] = right_bb.half_area();
        }

        // ---

        for i in 0..(BINS - 1) {
            if left_counts[i] == 0 || right_counts[i] == 0 {
                continue;
            }

            let split_cost = (left_counts[i] as f32) * left_areas[i]
                + (right_counts[i] as f32) * right_areas[i];

            let is_current_bin_better =
                best.map_or(true, |best| split_cost < best.split_cost);

            if is_current_bin_better {
                let split_at = centroid_bb.min()[split_by]
                    + extent[split_by] * ((i + 1) as f32) / (BINS as f32);

                best = Some(SplittingPlane {
                    split_by,
                    split_at,
                    split_cost,
                });
            }
        }
    }

    best
}

fn bounds_of(nodes: &BvhNodes, primitives_ref: BvhPrimitivesRef) -> BoundingBox {
    nodes
        .primitives(primitives_ref)
        .iter()
        .map(|primitive| primitive.bounds)
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
struct Bin {
    bounds: BoundingBox,
    count: usize,
}

#[derive(Clone, Copy, Debug)]
struct SplittingPlane {
    split_by: Axis,
    split_at: f32,
    split_cost: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scene;

    #[test]
    fn every_quad_ends_up_in_exactly_one_leaf() {
        let quads = Scene::cornell_box().geometry(1.0, 4096).unwrap().quads;
        let (nodes, depth) = run(&quads).unwrap();
        let mut seen = vec![0; quads.len()];
        let mut stack = vec![(BvhNodeId::root(), 1)];
        let mut max_depth = 0;

        while let Some((node_id, node_depth)) = stack.pop() {
            max_depth = usize::max(max_depth, node_depth);

            match nodes[node_id] {
                BvhNode::Internal {
                    bounds,
                    left_id,
                    right_id,
                } => {
                    // Children must be enclosed by their parent
                    for child in [left_id, right_id] {
                        let child = nodes[child].bounds();

                        assert!(child.min().cmpge(bounds.min()).all());
                        assert!(child.max().cmple(bounds.max()).all());
                    }

                    stack.push((left_id, node_depth + 1));
                    stack.push((right_id, node_depth + 1));
                }

                BvhNode::Leaf { primitives_ref, .. } => {
                    assert!(!primitives_ref.is_empty());

                    for primitive in nodes.primitives(primitives_ref) {
                        seen[primitive.quad_id as usize] += 1;
                    }
                }
            }
        }

        assert!(seen.iter().all(|&count| count == 1));
        assert_eq!(depth, max_depth);
        assert!(depth > 1);
    }
}
