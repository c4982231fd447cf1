use log::info;

use super::utils;
use crate::Bindable;

/// Buffer written once, right after being allocated; the host machine doesn't
/// keep its own copy of the data.
///
/// This kind of buffer is used for data that never changes after the scene's
/// been loaded, such as the vertices, indices and form factors.
#[derive(Debug)]
pub struct UploadedBuffer {
    buffer: wgpu::Buffer,
}

impl UploadedBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        usage: wgpu::BufferUsages,
        size: usize,
    ) -> Self {
        let label = label.as_ref();
        let size = utils::pad_size(size);

        info!("Allocating buffer `{label}`; usage={usage:?}, size={size}");

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: usage | wgpu::BufferUsages::COPY_DST,
            size: size as _,
            mapped_at_creation: false,
        });

        Self { buffer }
    }

    pub fn upload(&self, queue: &wgpu::Queue, data: &[u8]) {
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, data);
        }
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }
}

/// Binds the buffer as read-only storage, so it must've been created with
/// `STORAGE` usage.
impl Bindable for UploadedBuffer {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        vec![(layout, self.buffer.as_entire_binding())]
    }
}
