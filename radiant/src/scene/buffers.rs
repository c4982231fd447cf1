use std::mem;

use bytemuck::{Pod, Zeroable};
use log::info;
use radiant_gpu as gpu;

use super::Geometry;
use crate::{
    Error, MappedStorageBuffer, MappedUniformBuffer, Result, UploadedBuffer,
};

/// Vertex of the rasterized geometry.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],

    /// Quad-local coordinates, `-1..=1` on both axes
    pub uv: [f32; 2],

    pub quad_id: u32,
}

impl SceneVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Uint32,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as _,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Builds the triangle list for given quads: four vertices and two
/// counter-clockwise triangles per quad.
pub fn triangulate(quads: &[gpu::Quad]) -> (Vec<SceneVertex>, Vec<u32>) {
    const UVS: [[f32; 2]; 4] =
        [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

    let mut vertices = Vec::with_capacity(4 * quads.len());
    let mut indices = Vec::with_capacity(6 * quads.len());

    for (quad_id, quad) in quads.iter().enumerate() {
        let base = vertices.len() as u32;

        for (corner, uv) in quad.corners().into_iter().zip(UVS) {
            vertices.push(SceneVertex {
                position: corner.to_array(),
                uv,
                quad_id: quad_id as u32,
            });
        }

        indices.extend([0, 1, 2, 0, 2, 3].map(|idx| base + idx));
    }

    (vertices, indices)
}

/// Scene's geometry uploaded to the GPU.
#[derive(Debug)]
pub struct SceneBuffers {
    pub world: MappedUniformBuffer<gpu::World>,
    pub quads: MappedStorageBuffer<gpu::Quad>,
    pub patches: MappedStorageBuffer<gpu::Patch>,
    pub vertices: UploadedBuffer,
    pub indices: UploadedBuffer,
    pub index_count: u32,
}

impl SceneBuffers {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        geometry: &Geometry,
    ) -> Result<Self> {
        info!(
            "Uploading scene; quads={}, patches={}",
            geometry.quads.len(),
            geometry.patches.len()
        );

        let (vertices, indices) = triangulate(&geometry.quads);

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let mut this = Self {
            world: MappedUniformBuffer::new(
                device,
                "radiant_world",
                gpu::World::new(
                    geometry.quads.len() as u32,
                    geometry.patches.len() as u32,
                ),
            ),
            quads: MappedStorageBuffer::new(
                device,
                "radiant_quads",
                geometry.quads.clone(),
            ),
            patches: MappedStorageBuffer::new(
                device,
                "radiant_patches",
                geometry.patches.clone(),
            ),
            vertices: UploadedBuffer::new(
                device,
                "radiant_vertices",
                wgpu::BufferUsages::VERTEX,
                mem::size_of_val(vertices.as_slice()),
            ),
            indices: UploadedBuffer::new(
                device,
                "radiant_indices",
                wgpu::BufferUsages::INDEX,
                mem::size_of_val(indices.as_slice()),
            ),
            index_count: indices.len() as u32,
        };

        if pollster::block_on(device.pop_error_scope()).is_some() {
            return Err(Error::OutOfMemory {
                label: "radiant_scene".into(),
            });
        }

        this.world.flush(queue);
        this.quads.flush(queue);
        this.patches.flush(queue);
        this.vertices.upload(queue, bytemuck::cast_slice(&vertices));
        this.indices.upload(queue, bytemuck::cast_slice(&indices));

        Ok(this)
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, Vec3};

    use super::*;

    #[test]
    fn vertex_layout() {
        assert_eq!(24, mem::size_of::<SceneVertex>());
        assert_eq!(20, SceneVertex::ATTRIBUTES[2].offset);
    }

    #[test]
    fn triangles_are_counter_clockwise() {
        let quads = [gpu::Quad::new(
            vec3(0.0, 0.0, -5.0),
            vec3(2.0, 0.0, 0.0),
            vec3(0.0, 1.0, 0.0),
            Vec3::splat(0.5),
            Vec3::ZERO,
            gpu::PatchId::new(0),
            uvec2(1, 1),
        )];

        let (vertices, indices) = triangulate(&quads);

        assert_eq!(4, vertices.len());
        assert_eq!(vec![0, 1, 2, 0, 2, 3], indices);

        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|idx| Vec3::from(vertices[idx as usize].position));

            let normal = (b - a).cross(c - a).normalize();

            assert_eq!(quads[0].normal(), normal);
        }

        assert_eq!([-1.0, -1.0], vertices[0].uv);
        assert_eq!([1.0, 1.0], vertices[2].uv);
        assert_eq!(vec3(-2.0, -1.0, -5.0).to_array(), vertices[0].position);
    }
}
