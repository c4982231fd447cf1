//! Progressive radiosity on the GPU, displayed through either a rasterizer
//! or a raytracer sampling the very same lightmap.
//!
//! Frame goes like this:
//!
//! - [`Common`] moves the camera,
//! - [`Radiosity`] performs one Jacobi iteration, ping-ponging between two
//!   lightmap buffers,
//! - [`Rasterizer`] or [`Raytracer`] draws the scene into the framebuffer,
//! - [`Tonemapper`] maps the framebuffer into the output texture.

#![allow(clippy::len_without_is_empty)]

mod buffers;
mod bvh;
mod caps;
mod common;
mod config;
mod context;
mod error;
mod form_factors;
mod framebuffer;
mod pass;
mod radiosity;
mod rasterizer;
mod raytracer;
pub mod reference;
mod scene;
mod shaders;
mod tonemapper;
mod utils;

use std::time::Duration;

use glam::{UVec2, Vec4};
use log::{debug, info};
pub use radiant_gpu as gpu;

pub use self::buffers::*;
pub use self::bvh::*;
pub use self::caps::*;
pub use self::common::*;
pub use self::config::*;
pub use self::context::*;
pub use self::error::*;
pub use self::form_factors::*;
pub use self::framebuffer::*;
pub use self::pass::*;
pub use self::radiosity::*;
pub use self::rasterizer::*;
pub use self::raytracer::*;
pub use self::scene::*;
pub use self::shaders::*;
pub use self::tonemapper::*;
pub(crate) use self::utils::*;

/// Whole pipeline for a single scene and a single output.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    geometry: Geometry,
    bvh: Bvh,
    buffers: SceneBuffers,
    radiosity: Radiosity,
    common: Common,
    framebuffer: Framebuffer,
    rasterizer: Rasterizer,
    raytracer: Raytracer,
    tonemapper: Tonemapper,
    size: UVec2,
}

impl Engine {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        config: EngineConfig,
        output_format: wgpu::TextureFormat,
        size: UVec2,
    ) -> Result<Self> {
        info!("Initializing engine; size={size:?}, config={config:?}");

        caps::check_device(device, output_format)?;

        let size = size.max(UVec2::ONE);
        let geometry = scene.geometry(config.patch_size, config.max_patches)?;
        let buffers = SceneBuffers::new(device, queue, &geometry)?;
        let bvh = Bvh::build(&geometry.quads)?;

        let form_factors = FormFactors::bake(
            &geometry,
            &bvh,
            config.form_factor_samples,
            config.seed,
        );

        let shaders = Shaders::new(device);

        let radiosity =
            Radiosity::new(device, queue, &shaders, &buffers, &form_factors)?;

        let common = Common::new(device, aspect(size));
        let framebuffer = Framebuffer::new(device, size);

        let rasterizer = Rasterizer::new(
            device, &shaders, &buffers, &common, &radiosity, size,
        )?;

        let raytracer = Raytracer::new(
            device,
            queue,
            &shaders,
            &buffers,
            &common,
            &radiosity,
            &bvh,
            &framebuffer,
            config.samples_per_pixel,
        )?;

        let tonemapper =
            Tonemapper::new(device, output_format, &framebuffer, config.exposure)?;

        Ok(Self {
            config,
            geometry,
            bvh,
            buffers,
            radiosity,
            common,
            framebuffer,
            rasterizer,
            raytracer,
            tonemapper,
            size,
        })
    }

    /// Records a whole frame, advancing the camera by however much
    /// wall-clock time passed since the previous frame.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        params: FrameParams,
    ) {
        self.common.update(params.rotate_camera, aspect(self.size));
        self.frame(device, queue, encoder, output, params.renderer);
    }

    /// Like [`Self::render()`], but with the elapsed time provided by the
    /// caller; offline renders use it to stay deterministic.
    pub fn render_with(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        params: FrameParams,
        dt: Duration,
    ) {
        self.common
            .update_with(params.rotate_camera, aspect(self.size), dt);

        self.frame(device, queue, encoder, output, params.renderer);
    }

    fn frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        renderer: Renderer,
    ) {
        self.common.flush(queue);
        self.tonemapper.flush(queue);
        self.radiosity.run(encoder);
        self.draw(device, encoder, output, renderer);
    }

    /// Draws the scene with the current lightmap and camera, without
    /// advancing the solver.
    pub fn draw(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        renderer: Renderer,
    ) {
        let variant = self.radiosity.read_index();

        match renderer {
            Renderer::Rasterizer => {
                self.rasterizer.run(
                    encoder,
                    &self.buffers,
                    &self.framebuffer,
                    variant,
                );
            }

            Renderer::Raytracer => {
                self.raytracer.run(encoder, variant, self.size);
            }
        }

        self.tonemapper.run(device, encoder, output, self.size);
    }

    /// Recreates everything that depends on the output's size; lightmap and
    /// BVH are left intact.
    pub fn resize(&mut self, device: &wgpu::Device, size: UVec2) {
        let size = size.max(UVec2::ONE);

        if size == self.size {
            return;
        }

        debug!("Resizing engine; size={size:?}");

        self.size = size;
        self.framebuffer = Framebuffer::new(device, size);
        self.rasterizer.resize(device, size);

        self.raytracer.resize(device, &self.framebuffer);

        self.tonemapper.resize(device, &self.framebuffer);
    }

    /// Throws away the lightmap; accumulation starts from scratch on the
    /// next frame.
    pub fn reset_lightmap(&mut self) {
        info!("Resetting lightmap");

        self.radiosity.reset();
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.config.exposure = exposure;
        self.tonemapper.set_exposure(exposure);
    }

    /// Reads the newest lightmap back; blocks until the GPU is done.
    pub fn read_lightmap(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<Vec4>> {
        self.radiosity.read_lightmap(device, queue)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn radiosity(&self) -> &Radiosity {
        &self.radiosity
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }
}

fn aspect(size: UVec2) -> f32 {
    size.x as f32 / size.y.max(1) as f32
}
