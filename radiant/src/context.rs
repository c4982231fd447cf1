use std::sync::{Arc, Mutex};

use log::{error, info};

use crate::{caps, Error, PresentationFormat, Result};

/// GPU device ready to run the engine, negotiated without any surface (i.e.
/// for offscreen rendering).
#[derive(Debug)]
pub struct Context {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub presentation_format: PresentationFormat,
    lost: Arc<Mutex<Option<String>>>,
}

impl Context {
    /// Creates a context that outputs `Rgba8Unorm` images.
    pub fn headless() -> Result<Self> {
        Self::new(wgpu::TextureFormat::Rgba8Unorm)
    }

    pub fn new(preferred_format: wgpu::TextureFormat) -> Result<Self> {
        pollster::block_on(Self::new_async(preferred_format))
    }

    pub async fn new_async(
        preferred_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(Error::AdapterNotAvailable)?;

        info!("Using adapter: {:?}", adapter.get_info());

        let limits = caps::check_limits(&adapter.limits())?;

        let presentation_format = caps::resolve_presentation_format(
            preferred_format,
            adapter
                .features()
                .contains(wgpu::Features::BGRA8UNORM_STORAGE),
        );

        info!(
            "Using presentation format: {:?}",
            presentation_format.format
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("radiant_device"),
                    required_features: presentation_format.features,
                    required_limits: limits,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let lost = Arc::new(Mutex::new(None));

        device.set_device_lost_callback({
            let lost = Arc::clone(&lost);

            move |reason, message| {
                error!("Device lost: {reason:?}, {message}");

                if let Ok(mut lost) = lost.lock() {
                    *lost = Some(format!("{reason:?}: {message}"));
                }
            }
        });

        Ok(Self {
            adapter,
            device,
            queue,
            presentation_format,
            lost,
        })
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.presentation_format.format
    }

    /// Returns the reason of device loss, if the device has been lost.
    pub fn is_lost(&self) -> Option<String> {
        self.lost.lock().ok().and_then(|lost| lost.clone())
    }

    /// Fails with [`Error::DeviceLost`] if the device has been lost.
    pub fn check(&self) -> Result<()> {
        match self.is_lost() {
            Some(reason) => Err(Error::DeviceLost(reason)),
            None => Ok(()),
        }
    }
}
