use glam::UVec2;

use crate::{Bindable, Texture};

/// Floating-point image the renderers draw into and the tonemapper reads
/// from; recreated whenever the output gets resized.
#[derive(Debug)]
pub struct Framebuffer {
    texture: Texture,
}

impl Framebuffer {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    pub fn new(device: &wgpu::Device, size: UVec2) -> Self {
        Self {
            texture: Texture::new(
                device,
                "radiant_framebuffer",
                size,
                Self::FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
            ),
        }
    }

    pub fn size(&self) -> UVec2 {
        self.texture.size()
    }

    pub fn view(&self) -> &wgpu::TextureView {
        self.texture.view()
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.texture.bind_readable()
    }

    pub fn bind_writable(&self) -> impl Bindable + '_ {
        self.texture.bind_writable()
    }
}
