use std::mem;

use glam::{uvec3, Vec4};
use log::{debug, info, trace};
use radiant_gpu as gpu;

use crate::{
    read_buffer, ComputePass, DoubleBuffered, Error, FormFactors, Result,
    SceneBuffers, Shaders, UnmappedStorageBuffer, UploadedBuffer,
};

/// Progressive radiosity solver.
///
/// Lightmap holds the radiance reflected by each patch; each [`Self::run()`]
/// performs one Jacobi iteration, reading the previous estimate from one
/// lightmap buffer and writing the new estimate into the other one.
#[derive(Debug)]
pub struct Radiosity {
    lightmap: DoubleBuffered<UnmappedStorageBuffer>,
    pass: ComputePass,
    patch_count: u32,
    iteration: u32,
    pending_reset: bool,

    // Kept alive for the pass' bind groups
    _form_factors: UploadedBuffer,
}

impl Radiosity {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders: &Shaders,
        buffers: &SceneBuffers,
        form_factors: &FormFactors,
    ) -> Result<Self> {
        let patch_count = buffers.patch_count();

        if form_factors.patch_count() != patch_count {
            return Err(Error::LightmapMismatch {
                lightmap: form_factors.patch_count(),
                scene: patch_count,
            });
        }

        let max_binding_size =
            device.limits().max_storage_buffer_binding_size as u64;

        if form_factors.size_bytes() > max_binding_size {
            return Err(Error::LimitTooLow {
                limit: "max_storage_buffer_binding_size",
                required: form_factors.size_bytes(),
                available: max_binding_size,
            });
        }

        info!("Initializing radiosity; patches={patch_count}");

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let form_factors_buffer = UploadedBuffer::new(
            device,
            "radiant_form_factors",
            wgpu::BufferUsages::STORAGE,
            form_factors.size_bytes() as usize,
        );

        let lightmap = DoubleBuffered::new_storage(
            device,
            "radiant_lightmap",
            patch_count * mem::size_of::<Vec4>(),
        );

        if pollster::block_on(device.pop_error_scope()).is_some() {
            return Err(Error::OutOfMemory {
                label: "radiant_radiosity".into(),
            });
        }

        form_factors_buffer
            .upload(queue, bytemuck::cast_slice(form_factors.as_slice()));

        let pass = ComputePass::builder("radiosity")
            .bind([
                &buffers.world,
                &buffers.patches,
                &form_factors_buffer,
                &lightmap.bind_readable(),
                &lightmap.bind_writable(),
            ])
            .build(device, &shaders.radiosity, "main");

        Ok(Self {
            lightmap,
            pass,
            patch_count: patch_count as u32,
            iteration: 0,
            pending_reset: true,
            _form_factors: form_factors_buffer,
        })
    }

    /// Advances the solver by one iteration and swaps the lightmap buffers,
    /// so that whatever gets rendered next observes this iteration's result.
    pub fn run(&mut self, encoder: &mut wgpu::CommandEncoder) {
        if mem::take(&mut self.pending_reset) {
            debug!("Clearing lightmap");

            for item in self.lightmap.items() {
                encoder.clear_buffer(item.buffer(), 0, None);
            }

            self.lightmap.reset();
            self.iteration = 0;
        }

        trace!(
            "Running radiosity; iteration={}, read={}",
            self.iteration,
            self.lightmap.read_index()
        );

        let workgroups = self.patch_count.div_ceil(gpu::RADIOSITY_WORKGROUP_SIZE);

        self.pass.run(
            encoder,
            self.lightmap.read_index(),
            uvec3(workgroups, 1, 1),
        );

        self.lightmap.swap();
        self.iteration += 1;
    }

    /// Schedules both lightmap buffers to be cleared before the next
    /// iteration.
    pub fn reset(&mut self) {
        self.pending_reset = true;
    }

    /// Number of iterations performed since the last reset.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Index of the lightmap buffer holding the newest estimate; that's the
    /// bind group variant renderers should use.
    pub fn read_index(&self) -> usize {
        self.lightmap.read_index()
    }

    pub fn lightmap(&self) -> &DoubleBuffered<UnmappedStorageBuffer> {
        &self.lightmap
    }

    pub fn patch_count(&self) -> usize {
        self.patch_count as usize
    }

    /// Reads the newest estimate back; blocks until all work submitted so
    /// far is done.
    pub fn read_lightmap(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<Vec4>> {
        let size = (self.patch_count as usize * mem::size_of::<Vec4>()) as u64;
        let data = read_buffer(device, queue, self.lightmap.read().buffer(), size)?;

        Ok(decode_lightmap(&data))
    }
}

/// Staging copies aren't guaranteed to be aligned for `Vec4`, so texels are
/// read one by one.
fn decode_lightmap(data: &[u8]) -> Vec<Vec4> {
    data.chunks_exact(mem::size_of::<Vec4>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

#[cfg(test)]
mod tests {
    use glam::vec4;

    use super::*;

    #[test]
    fn decoding_misaligned_lightmap() {
        let texels = [vec4(1.0, 2.0, 3.0, 0.0), vec4(0.5, 0.25, 0.125, 0.0)];

        let mut data = vec![0xff];
        data.extend_from_slice(bytemuck::cast_slice(&texels));

        assert_eq!(texels.to_vec(), decode_lightmap(&data[1..]));
        assert!(decode_lightmap(&[]).is_empty());
    }
}
