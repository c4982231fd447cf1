use std::ops::{Index, IndexMut};

use glam::Vec3;

use crate::BoundingBox;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BvhNode {
    Internal {
        bounds: BoundingBox,
        left_id: BvhNodeId,
        right_id: BvhNodeId,
    },

    Leaf {
        bounds: BoundingBox,
        primitives_ref: BvhPrimitivesRef,
    },
}

impl BvhNode {
    pub fn bounds(&self) -> BoundingBox {
        match self {
            BvhNode::Internal { bounds, .. } => *bounds,
            BvhNode::Leaf { bounds, .. } => *bounds,
        }
    }

    pub fn sah_cost(&self) -> f32 {
        if let BvhNode::Leaf {
            bounds,
            primitives_ref,
        } = self
        {
            (primitives_ref.len() as f32) * bounds.half_area()
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BvhNodeId(u32);

impl BvhNodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn root() -> Self {
        Self::new(0)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Quad as seen by the BVH builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BvhPrimitive {
    pub quad_id: u32,
    pub bounds: BoundingBox,
    pub center: Vec3,
}

/// Range of primitives owned by a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BvhPrimitivesRef {
    start: u32,
    end: u32,
}

impl BvhPrimitivesRef {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end);

        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn end(&self) -> usize {
        self.end as usize
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arena of nodes, together with the primitives their leaves point at.
#[derive(Clone, Debug, Default)]
pub struct BvhNodes {
    nodes: Vec<BvhNode>,
    primitives: Vec<BvhPrimitive>,
}

impl BvhNodes {
    pub fn new(primitives: Vec<BvhPrimitive>) -> Self {
        Self {
            nodes: Default::default(),
            primitives,
        }
    }

    pub fn push(&mut self, node: BvhNode) -> BvhNodeId {
        let id = BvhNodeId::new(self.nodes.len() as u32);

        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn primitives(&self, primitives_ref: BvhPrimitivesRef) -> &[BvhPrimitive] {
        &self.primitives[primitives_ref.start()..primitives_ref.end()]
    }

    pub fn primitives_mut(
        &mut self,
        primitives_ref: BvhPrimitivesRef,
    ) -> &mut [BvhPrimitive] {
        &mut self.primitives[primitives_ref.start()..primitives_ref.end()]
    }

    pub fn all_primitives(&self) -> BvhPrimitivesRef {
        BvhPrimitivesRef::new(0, self.primitives.len())
    }
}

impl Index<BvhNodeId> for BvhNodes {
    type Output = BvhNode;

    fn index(&self, index: BvhNodeId) -> &Self::Output {
        &self.nodes[index.get() as usize]
    }
}

impl IndexMut<BvhNodeId> for BvhNodes {
    fn index_mut(&mut self, index: BvhNodeId) -> &mut Self::Output {
        &mut self.nodes[index.get() as usize]
    }
}
