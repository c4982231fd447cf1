use glam::UVec2;
use log::debug;
use radiant_gpu as gpu;

use crate::{
    BindGroup, Framebuffer, MappedUniformBuffer, Result, Shaders,
    WritableTexture,
};

/// Maps the HDR framebuffer into the output texture (exposure, ACES,
/// sRGB encoding).
#[derive(Debug)]
pub struct Tonemapper {
    params: MappedUniformBuffer<gpu::TonemapperPassParams>,
    bind_group: BindGroup,
    output_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    output_format: wgpu::TextureFormat,
}

impl Tonemapper {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        framebuffer: &Framebuffer,
        exposure: f32,
    ) -> Result<Self> {
        debug!("Initializing pass: tonemapper; format={output_format:?}");

        let module = Shaders::tonemapper(device, output_format)?;

        let params = MappedUniformBuffer::new(
            device,
            "radiant_tonemapper_params",
            gpu::TonemapperPassParams {
                exposure,
                ..Default::default()
            },
        );

        let bind_group = Self::bind_group(device, &params, framebuffer);

        let output_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("radiant_tonemapper_bg1_layout"),
                entries: &[WritableTexture::layout(0, output_format)],
            });

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("radiant_tonemapper_pipeline_layout"),
                bind_group_layouts: &[bind_group.layout(), &output_layout],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("radiant_tonemapper_pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });

        Ok(Self {
            params,
            bind_group,
            output_layout,
            pipeline,
            output_format,
        })
    }

    fn bind_group(
        device: &wgpu::Device,
        params: &MappedUniformBuffer<gpu::TonemapperPassParams>,
        framebuffer: &Framebuffer,
    ) -> BindGroup {
        BindGroup::builder("tonemapper_bg0")
            .add(params)
            .add(&framebuffer.bind_readable())
            .build(device)
    }

    /// Rebinds the framebuffer after it's been recreated; the layout stays
    /// the same, so the pipeline is kept.
    pub fn resize(&mut self, device: &wgpu::Device, framebuffer: &Framebuffer) {
        self.bind_group = Self::bind_group(device, &self.params, framebuffer);
    }

    pub fn exposure(&self) -> f32 {
        self.params.exposure
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.params.exposure = exposure;
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn flush(&mut self, queue: &wgpu::Queue) {
        self.params.flush(queue);
    }

    /// Tonemaps the framebuffer into given view; the view must be a storage
    /// texture of the format this tonemapper was created for.
    pub fn run(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        size: UVec2,
    ) {
        let output_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("radiant_tonemapper_bg1"),
                layout: &self.output_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(output),
                }],
            });

        let workgroups = (size + gpu::SCREEN_WORKGROUP_SIZE - 1)
            / gpu::SCREEN_WORKGROUP_SIZE;

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("radiant_tonemapper_pass"),
                timestamp_writes: None,
            });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.bind_group.get(0), &[]);
        pass.set_bind_group(1, &output_bind_group, &[]);
        pass.dispatch_workgroups(workgroups.x, workgroups.y, 1);
    }
}
