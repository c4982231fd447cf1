use std::sync::mpsc;

use glam::UVec2;
use log::trace;

use crate::{Error, Result};

/// Copies given buffer into a staging buffer and blocks until its contents
/// are available on the host machine.
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<u8>> {
    trace!("Reading buffer back; size={size}");

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("radiant_readback"),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        size,
        mapped_at_creation: false,
    });

    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("radiant_readback"),
        });

    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(Some(encoder.finish()));

    map(device, &staging)
}

/// Copies given texture (which must have 4 bytes per texel and
/// `COPY_SRC` usage) into host memory, returning tightly packed rows.
pub fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    size: UVec2,
) -> Result<Vec<u8>> {
    const BYTES_PER_TEXEL: u32 = 4;

    trace!("Reading texture back; size={size:?}");

    let row_bytes = size.x * BYTES_PER_TEXEL;
    let padded_row_bytes = row_bytes
        .div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("radiant_readback"),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        size: (padded_row_bytes * size.y) as u64,
        mapped_at_creation: false,
    });

    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("radiant_readback"),
        });

    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_row_bytes),
                rows_per_image: Some(size.y),
            },
        },
        wgpu::Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(Some(encoder.finish()));

    let padded = map(device, &staging)?;

    Ok(padded
        .chunks(padded_row_bytes as usize)
        .flat_map(|row| &row[..row_bytes as usize])
        .copied()
        .collect())
}

fn map(device: &wgpu::Device, staging: &wgpu::Buffer) -> Result<Vec<u8>> {
    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        _ = tx.send(result);
    });

    device.poll(wgpu::Maintain::Wait);

    rx.recv().map_err(|_| {
        Error::DeviceLost("buffer mapping has been abandoned".into())
    })??;

    let data = slice.get_mapped_range().to_vec();

    staging.unmap();

    Ok(data)
}
