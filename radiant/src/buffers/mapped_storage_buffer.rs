use std::ops::{Deref, DerefMut};
use std::{any, mem};

use bytemuck::Pod;
use log::info;

use super::{utils, Bindable};

/// Storage buffer that exists both on the host machine and the GPU.
///
/// This kind of storage buffer is used for data structures such as the BVH
/// that are built on the host machine and only read by the GPU; the buffer
/// is sized after the data it's created with.
#[derive(Debug)]
pub struct MappedStorageBuffer<T>
where
    T: Pod,
{
    buffer: wgpu::Buffer,
    data: Vec<T>,
    dirty: bool,
}

impl<T> MappedStorageBuffer<T>
where
    T: Pod,
{
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        data: Vec<T>,
    ) -> Self {
        let label = label.as_ref();
        let size = utils::pad_size(data.len() * mem::size_of::<T>());

        info!(
            "Allocating storage buffer `{label}`; ty={}, len={}, size={size}",
            any::type_name::<T>(),
            data.len(),
        );

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::STORAGE,
            size: size as _,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            data,
            dirty: true,
        }
    }

    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if !mem::take(&mut self.dirty) {
            return;
        }

        if !self.data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.data));
        }
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }
}

impl<T> Deref for MappedStorageBuffer<T>
where
    T: Pod,
{
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for MappedStorageBuffer<T>
where
    T: Pod,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.dirty = true;

        &mut self.data
    }
}

impl<T> Bindable for MappedStorageBuffer<T>
where
    T: Pod,
{
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT
                | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let resource = self.buffer.as_entire_binding();

        vec![(layout, resource)]
    }
}
