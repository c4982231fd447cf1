use glam::UVec2;
use log::debug;

use crate::{
    BindGroup, Common, Error, Framebuffer, Radiosity, Result, SceneBuffers,
    SceneVertex, Shaders, Texture,
};

/// Draws the scene through the regular raster pipeline, shading each
/// fragment with the lightmap.
#[derive(Debug)]
pub struct Rasterizer {
    pipeline: wgpu::RenderPipeline,
    bind_group: BindGroup,
    depth: Texture,
}

impl Rasterizer {
    pub const DEPTH_FORMAT: wgpu::TextureFormat =
        wgpu::TextureFormat::Depth32Float;

    pub fn new(
        device: &wgpu::Device,
        shaders: &Shaders,
        buffers: &SceneBuffers,
        common: &Common,
        radiosity: &Radiosity,
        size: UVec2,
    ) -> Result<Self> {
        if radiosity.patch_count() != buffers.patch_count() {
            return Err(Error::LightmapMismatch {
                lightmap: radiosity.patch_count(),
                scene: buffers.patch_count(),
            });
        }

        debug!("Initializing pass: rasterizer");

        let bind_group = BindGroup::builder("rasterizer_bg0")
            .add(common.camera_buffer())
            .add(&buffers.quads)
            .add(&radiosity.lightmap().bind_readable())
            .build(device);

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("radiant_rasterizer_pipeline_layout"),
                bind_group_layouts: &[bind_group.layout()],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("radiant_rasterizer_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shaders.rasterizer,
                    entry_point: Some("main_vs"),
                    compilation_options: Default::default(),
                    buffers: &[SceneVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shaders.rasterizer,
                    entry_point: Some("main_fs"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: Framebuffer::FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: Self::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        Ok(Self {
            pipeline,
            bind_group,
            depth: Self::depth(device, size),
        })
    }

    /// Recreates the depth buffer; bindings don't depend on the size, so
    /// they survive.
    pub fn resize(&mut self, device: &wgpu::Device, size: UVec2) {
        self.depth = Self::depth(device, size);
    }

    fn depth(device: &wgpu::Device, size: UVec2) -> Texture {
        Texture::new(
            device,
            "radiant_rasterizer_depth",
            size,
            Self::DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        buffers: &SceneBuffers,
        framebuffer: &Framebuffer,
        lightmap_variant: usize,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("radiant_rasterizer_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: framebuffer.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                },
            ),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.bind_group.get(lightmap_variant), &[]);
        pass.set_vertex_buffer(0, buffers.vertices.slice());
        pass.set_index_buffer(buffers.indices.slice(), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..buffers.index_count, 0, 0..1);
    }
}
