use glam::{uvec3, UVec2, Vec4};
use log::{debug, warn};
use radiant_gpu as gpu;

use crate::{
    Bvh, Common, ComputePass, Error, Framebuffer, MappedStorageBuffer,
    MappedUniformBuffer, Radiosity, Result, SceneBuffers, Shaders,
};

/// Renders the scene by tracing one (or four) primary rays per pixel through
/// the BVH; shading is the same lightmap lookup the rasterizer does.
#[derive(Debug)]
pub struct Raytracer {
    bvh: MappedStorageBuffer<Vec4>,
    params: MappedUniformBuffer<gpu::RaytracerPassParams>,
    pass: ComputePass,
}

impl Raytracer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders: &Shaders,
        buffers: &SceneBuffers,
        common: &Common,
        radiosity: &Radiosity,
        bvh: &Bvh,
        framebuffer: &Framebuffer,
        samples_per_pixel: u32,
    ) -> Result<Self> {
        if radiosity.patch_count() != buffers.patch_count() {
            return Err(Error::LightmapMismatch {
                lightmap: radiosity.patch_count(),
                scene: buffers.patch_count(),
            });
        }

        let samples_per_pixel = match samples_per_pixel {
            1 | 4 => samples_per_pixel,
            n => {
                let normalized = if n > 4 { 4 } else { 1 };

                warn!(
                    "Unsupported samples per pixel: {n}; using {normalized} instead"
                );

                normalized
            }
        };

        let mut bvh = MappedStorageBuffer::new(
            device,
            "radiant_bvh",
            bvh.buffer().to_vec(),
        );

        let mut params = MappedUniformBuffer::new(
            device,
            "radiant_raytracer_params",
            gpu::RaytracerPassParams {
                samples_per_pixel,
                ..Default::default()
            },
        );

        bvh.flush(queue);
        params.flush(queue);

        let pass = Self::build_pass(
            device,
            shaders,
            buffers,
            common,
            radiosity,
            &bvh,
            &params,
            framebuffer,
        );

        Ok(Self { bvh, params, pass })
    }

    /// Rebinds the framebuffer after it's been recreated; the pipeline is
    /// kept.
    pub fn resize(&mut self, device: &wgpu::Device, framebuffer: &Framebuffer) {
        debug!("Resizing raytracer; size={:?}", framebuffer.size());

        self.pass.rebind(device, 1, [&framebuffer.bind_writable()]);
    }

    #[allow(clippy::too_many_arguments)]
    fn build_pass(
        device: &wgpu::Device,
        shaders: &Shaders,
        buffers: &SceneBuffers,
        common: &Common,
        radiosity: &Radiosity,
        bvh: &MappedStorageBuffer<Vec4>,
        params: &MappedUniformBuffer<gpu::RaytracerPassParams>,
        framebuffer: &Framebuffer,
    ) -> ComputePass {
        ComputePass::builder("raytracer")
            .bind([
                common.camera_buffer(),
                &buffers.world,
                &buffers.quads,
                bvh,
                &radiosity.lightmap().bind_readable(),
                params,
            ])
            .bind([&framebuffer.bind_writable()])
            .build(device, &shaders.raytracer, "main")
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.params.samples_per_pixel
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        lightmap_variant: usize,
        size: UVec2,
    ) {
        let workgroups = (size + gpu::SCREEN_WORKGROUP_SIZE - 1)
            / gpu::SCREEN_WORKGROUP_SIZE;

        self.pass
            .run(encoder, lightmap_variant, uvec3(workgroups.x, workgroups.y, 1));
    }
}
