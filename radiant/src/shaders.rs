use log::info;

use crate::{caps, Error, Result};

/// Shader modules of all the passes, compiled once.
#[derive(Debug)]
pub struct Shaders {
    pub radiosity: wgpu::ShaderModule,
    pub rasterizer: wgpu::ShaderModule,
    pub raytracer: wgpu::ShaderModule,
}

impl Shaders {
    pub fn new(device: &wgpu::Device) -> Self {
        info!("Compiling shaders");

        Self {
            radiosity: compile(
                device,
                "radiant_radiosity",
                &[radiant_shaders::RADIOSITY],
            ),
            rasterizer: compile(
                device,
                "radiant_rasterizer",
                &[radiant_shaders::LIGHTMAP, radiant_shaders::RASTERIZER],
            ),
            raytracer: compile(
                device,
                "radiant_raytracer",
                &[radiant_shaders::LIGHTMAP, radiant_shaders::RAYTRACER],
            ),
        }
    }

    /// Compiles the tonemapper for given output format; the format is baked
    /// into the shader's storage texture declaration.
    pub fn tonemapper(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<wgpu::ShaderModule> {
        let format_name = caps::storage_format_name(format)
            .ok_or(Error::UnsupportedFormat(format))?;

        let source = radiant_shaders::TONEMAPPER
            .replace(radiant_shaders::OUTPUT_FORMAT_PLACEHOLDER, format_name);

        Ok(compile(device, "radiant_tonemapper", &[&source]))
    }
}

fn compile(
    device: &wgpu::Device,
    label: &str,
    sources: &[&str],
) -> wgpu::ShaderModule {
    let source: String = [radiant_shaders::COMMON]
        .iter()
        .chain(sources)
        .flat_map(|source| [*source, "\n"])
        .collect();

    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}
