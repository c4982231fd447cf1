use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use glam::{uvec2, UVec2};
use image::RgbaImage;
use log::info;
use radiant::reference::{self, ReferenceRadiosity};
use radiant::{
    read_texture, Bvh, Context, Engine, EngineConfig, FormFactors,
    FrameParams, Orbit, Renderer, Scene,
};

/// Each frame moves the camera by this much, so that renders don't depend on
/// how fast the machine is.
const FRAME_TIME: Duration = Duration::from_micros(16_667);

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Gpu,
    Cpu,
}

/// Renders the Cornell box offscreen and saves the last frame as PNG.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Number of frames to render; each frame advances the solver by one
    /// iteration.
    #[arg(long, default_value_t = 32)]
    frames: u32,

    #[arg(long, default_value_t = Renderer::Rasterizer)]
    renderer: Renderer,

    /// Keep the camera still instead of orbiting around the room.
    #[arg(long)]
    no_rotate: bool,

    #[arg(long, default_value_t = 1.0)]
    patch_size: f32,

    #[arg(long, default_value_t = 4)]
    form_factor_samples: u32,

    #[arg(long, default_value_t = 1)]
    samples_per_pixel: u32,

    #[arg(long, default_value_t = 1.0)]
    exposure: f32,

    #[arg(long, value_enum, default_value_t = Backend::Gpu)]
    backend: Backend,

    #[arg(long, default_value = "radiant.png")]
    output: PathBuf,
}

impl Cli {
    fn size(&self) -> UVec2 {
        uvec2(self.width.max(1), self.height.max(1))
    }

    fn config(&self) -> EngineConfig {
        EngineConfig {
            patch_size: self.patch_size,
            form_factor_samples: self.form_factor_samples,
            exposure: self.exposure,
            samples_per_pixel: self.samples_per_pixel,
            ..Default::default()
        }
    }

    fn frame_params(&self) -> FrameParams {
        FrameParams {
            renderer: self.renderer,
            rotate_camera: !self.no_rotate,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let cli = Cli::parse();

    info!("Rendering {} frame(s); cli={cli:?}", cli.frames);

    let pixels = match cli.backend {
        Backend::Gpu => render_gpu(&cli)?,
        Backend::Cpu => render_cpu(&cli)?,
    };

    let size = cli.size();

    RgbaImage::from_raw(size.x, size.y, pixels)
        .context("rendered image has unexpected size")?
        .save(&cli.output)
        .with_context(|| format!("couldn't write {}", cli.output.display()))?;

    info!("Saved {}", cli.output.display());

    Ok(())
}

fn render_gpu(cli: &Cli) -> Result<Vec<u8>> {
    let ctxt = Context::headless().context("couldn't initialize GPU")?;
    let size = cli.size();

    let mut engine = Engine::new(
        &ctxt.device,
        &ctxt.queue,
        &Scene::cornell_box(),
        cli.config(),
        ctxt.output_format(),
        size,
    )?;

    let output = ctxt.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("radiant_demo_output"),
        size: wgpu::Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ctxt.output_format(),
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let output_view = output.create_view(&Default::default());

    for _ in 0..cli.frames.max(1) {
        let mut encoder =
            ctxt.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("radiant_demo_frame"),
                });

        engine.render_with(
            &ctxt.device,
            &ctxt.queue,
            &mut encoder,
            &output_view,
            cli.frame_params(),
            FRAME_TIME,
        );

        ctxt.queue.submit(Some(encoder.finish()));
        ctxt.check()?;
    }

    let pixels = read_texture(&ctxt.device, &ctxt.queue, &output, size)?;

    ctxt.check()?;

    Ok(pixels)
}

fn render_cpu(cli: &Cli) -> Result<Vec<u8>> {
    let size = cli.size();
    let config = cli.config();
    let geometry = Scene::cornell_box().geometry(config.patch_size, config.max_patches)?;
    let bvh = Bvh::build(&geometry.quads)?;

    let form_factors = FormFactors::bake(
        &geometry,
        &bvh,
        config.form_factor_samples,
        config.seed,
    );

    let mut radiosity = ReferenceRadiosity::new(&geometry, form_factors)?;
    let mut orbit = Orbit::default();
    let frames = cli.frames.max(1);

    for _ in 0..frames {
        radiosity.run();

        if !cli.no_rotate {
            orbit.advance(FRAME_TIME);
        }
    }

    let camera = orbit.camera(size.x as f32 / size.y as f32, frames);

    let image = match cli.renderer {
        Renderer::Rasterizer => {
            reference::rasterize(&geometry, &camera, radiosity.lightmap(), size)
        }

        Renderer::Raytracer => reference::raytrace(
            &geometry,
            &bvh,
            &camera,
            radiosity.lightmap(),
            size,
            config.samples_per_pixel,
        ),
    };

    Ok(reference::tonemap(&image, config.exposure))
}
