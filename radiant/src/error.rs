use thiserror::Error;

use crate::{BvhError, SceneError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no suitable GPU adapter is available")]
    AdapterNotAvailable,

    #[error(
        "adapter's `{limit}` is {available}, but at least {required} is required"
    )]
    LimitTooLow {
        limit: &'static str,
        required: u64,
        available: u64,
    },

    #[error("couldn't request device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("invalid scene")]
    InvalidScene(#[from] SceneError),

    #[error("couldn't build BVH")]
    Bvh(#[from] BvhError),

    #[error("ran out of memory while allocating `{label}`")]
    OutOfMemory { label: String },

    #[error("lightmap holds {lightmap} patches, but the scene has {scene}")]
    LightmapMismatch { lightmap: usize, scene: usize },

    #[error("format {0:?} can't be used as the output of the tonemapper")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("device lost: {0}")]
    DeviceLost(String),

    #[error("couldn't read data back from the GPU")]
    Readback(#[from] wgpu::BufferAsyncError),
}
