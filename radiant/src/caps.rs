//! Device capability negotiation.

use log::warn;

use crate::{Error, Result};

/// Workgroup width used by the radiosity pass.
pub const REQUIRED_WORKGROUP_SIZE_X: u32 = 256;

/// Invocations per workgroup used by the radiosity and raytracing passes.
pub const REQUIRED_INVOCATIONS_PER_WORKGROUP: u32 = 256;

/// Format the tonemapper writes into, together with the device features
/// it needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentationFormat {
    pub format: wgpu::TextureFormat,
    pub features: wgpu::Features,
}

/// Given the format preferred by the surface (or by the caller, when
/// rendering offscreen), returns the format the tonemapper should output.
///
/// The tonemapper writes through a storage texture and storage textures can't
/// be sRGB, so sRGB formats get replaced by their linear twins (the tonemapper
/// performs the sRGB encoding on its own). `Bgra8Unorm` is storage-writable
/// only with `BGRA8UNORM_STORAGE`, so without that feature we fall back to
/// `Rgba8Unorm`.
pub fn resolve_presentation_format(
    preferred: wgpu::TextureFormat,
    bgra8unorm_storage: bool,
) -> PresentationFormat {
    use wgpu::TextureFormat as F;

    match preferred {
        F::Bgra8Unorm | F::Bgra8UnormSrgb if bgra8unorm_storage => {
            PresentationFormat {
                format: F::Bgra8Unorm,
                features: wgpu::Features::BGRA8UNORM_STORAGE,
            }
        }

        F::Bgra8Unorm | F::Bgra8UnormSrgb => {
            warn!(
                "Adapter doesn't support `bgra8unorm` storage textures; \
                 falling back to `rgba8unorm`"
            );

            PresentationFormat {
                format: F::Rgba8Unorm,
                features: wgpu::Features::empty(),
            }
        }

        _ => PresentationFormat {
            format: F::Rgba8Unorm,
            features: wgpu::Features::empty(),
        },
    }
}

/// Returns name of given format as used in WGSL's storage texture
/// declarations.
pub fn storage_format_name(format: wgpu::TextureFormat) -> Option<&'static str> {
    use wgpu::TextureFormat as F;

    match format {
        F::Rgba8Unorm => Some("rgba8unorm"),
        F::Bgra8Unorm => Some("bgra8unorm"),
        F::Rgba16Float => Some("rgba16float"),
        _ => None,
    }
}

/// Checks whether adapter with given limits can run our passes and, if so,
/// returns limits that should be requested for the device.
pub fn check_limits(available: &wgpu::Limits) -> Result<wgpu::Limits> {
    let checks = [
        (
            "max_compute_workgroup_size_x",
            REQUIRED_WORKGROUP_SIZE_X,
            available.max_compute_workgroup_size_x,
        ),
        (
            "max_compute_invocations_per_workgroup",
            REQUIRED_INVOCATIONS_PER_WORKGROUP,
            available.max_compute_invocations_per_workgroup,
        ),
    ];

    for (limit, required, available) in checks {
        if available < required {
            return Err(Error::LimitTooLow {
                limit,
                required: required as u64,
                available: available as u64,
            });
        }
    }

    Ok(wgpu::Limits {
        max_compute_workgroup_size_x: REQUIRED_WORKGROUP_SIZE_X,
        max_compute_invocations_per_workgroup:
            REQUIRED_INVOCATIONS_PER_WORKGROUP,
        max_storage_buffer_binding_size: available
            .max_storage_buffer_binding_size,
        max_buffer_size: available.max_buffer_size,
        ..wgpu::Limits::downlevel_defaults().using_resolution(available.clone())
    })
}

/// Checks whether the tonemapper can write into given format on a device with
/// given features.
pub fn check_output_format(
    format: wgpu::TextureFormat,
    features: wgpu::Features,
) -> Result<()> {
    if storage_format_name(format).is_none() {
        return Err(Error::UnsupportedFormat(format));
    }

    if format == wgpu::TextureFormat::Bgra8Unorm
        && !features.contains(wgpu::Features::BGRA8UNORM_STORAGE)
    {
        return Err(Error::UnsupportedFormat(format));
    }

    Ok(())
}

/// Checks whether given device (which might've been created by someone else)
/// can run the engine and output into given format.
pub fn check_device(
    device: &wgpu::Device,
    output_format: wgpu::TextureFormat,
) -> Result<()> {
    check_limits(&device.limits())?;
    check_output_format(output_format, device.features())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_format() {
        use wgpu::TextureFormat as F;

        let bgra = PresentationFormat {
            format: F::Bgra8Unorm,
            features: wgpu::Features::BGRA8UNORM_STORAGE,
        };

        let rgba = PresentationFormat {
            format: F::Rgba8Unorm,
            features: wgpu::Features::empty(),
        };

        assert_eq!(bgra, resolve_presentation_format(F::Bgra8Unorm, true));
        assert_eq!(bgra, resolve_presentation_format(F::Bgra8UnormSrgb, true));
        assert_eq!(rgba, resolve_presentation_format(F::Bgra8Unorm, false));
        assert_eq!(rgba, resolve_presentation_format(F::Rgba8Unorm, true));
        assert_eq!(rgba, resolve_presentation_format(F::Rgba8UnormSrgb, false));
        assert_eq!(rgba, resolve_presentation_format(F::Rgba16Float, true));

        // Whatever we resolve to must be usable in WGSL
        for preferred in [F::Bgra8Unorm, F::Rgba8UnormSrgb, F::R8Unorm] {
            for storage in [false, true] {
                let format = resolve_presentation_format(preferred, storage);

                assert!(storage_format_name(format.format).is_some());
            }
        }
    }

    #[test]
    fn limits() {
        let limits = check_limits(&wgpu::Limits::default()).unwrap();

        assert_eq!(256, limits.max_compute_workgroup_size_x);
        assert_eq!(256, limits.max_compute_invocations_per_workgroup);

        // Everything else is requested at the downlevel level, apart from the
        // resolution, which is whatever the adapter offers
        let available = wgpu::Limits {
            max_texture_dimension_2d: 16384,
            max_storage_buffer_binding_size: 1 << 30,
            ..wgpu::Limits::downlevel_defaults()
        };

        let limits = check_limits(&available).unwrap();
        let downlevel = wgpu::Limits::downlevel_defaults();

        assert_eq!(16384, limits.max_texture_dimension_2d);
        assert_eq!(1 << 30, limits.max_storage_buffer_binding_size);

        assert_eq!(
            downlevel.max_storage_buffers_per_shader_stage,
            limits.max_storage_buffers_per_shader_stage
        );

        assert_eq!(downlevel.max_bind_groups, limits.max_bind_groups);

        // ---

        let available = wgpu::Limits {
            max_compute_workgroup_size_x: 128,
            ..wgpu::Limits::default()
        };

        match check_limits(&available) {
            Err(Error::LimitTooLow {
                limit,
                required,
                available,
            }) => {
                assert_eq!("max_compute_workgroup_size_x", limit);
                assert_eq!(256, required);
                assert_eq!(128, available);
            }

            other => panic!("unexpected result: {other:?}"),
        }

        // ---

        let available = wgpu::Limits {
            max_compute_invocations_per_workgroup: 64,
            ..wgpu::Limits::default()
        };

        assert!(matches!(
            check_limits(&available),
            Err(Error::LimitTooLow {
                limit: "max_compute_invocations_per_workgroup",
                ..
            })
        ));
    }

    #[test]
    fn output_format() {
        use wgpu::TextureFormat as F;

        let storage = wgpu::Features::BGRA8UNORM_STORAGE;
        let none = wgpu::Features::empty();

        assert!(check_output_format(F::Rgba8Unorm, none).is_ok());
        assert!(check_output_format(F::Rgba16Float, none).is_ok());
        assert!(check_output_format(F::Bgra8Unorm, storage).is_ok());

        for (format, features) in [
            (F::Bgra8Unorm, none),
            (F::Rgba8UnormSrgb, storage),
            (F::Depth32Float, storage),
        ] {
            assert!(
                matches!(
                    check_output_format(format, features),
                    Err(Error::UnsupportedFormat(f)) if f == format
                ),
                "{format:?} should've been rejected"
            );
        }
    }
}
