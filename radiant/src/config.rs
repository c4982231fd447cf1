use std::fmt;
use std::str::FromStr;

/// Knobs applied when the engine is being built.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Size of a single lightmap cell, in world units.
    pub patch_size: f32,

    /// Number of jittered point pairs averaged for each form factor.
    pub form_factor_samples: u32,

    /// Seed of the form-factor jitter; bakes are reproducible for a given
    /// seed.
    pub seed: u64,

    pub exposure: f32,

    /// Primary rays per pixel cast by the raytracer; either 1 or 4.
    pub samples_per_pixel: u32,

    /// Upper bound for the number of patches the scene may be split into.
    ///
    /// Form factors are stored as a dense matrix, so memory usage grows
    /// quadratically with this number.
    pub max_patches: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            patch_size: 1.0,
            form_factor_samples: 4,
            seed: 0,
            exposure: 1.0,
            samples_per_pixel: 1,
            max_patches: 4096,
        }
    }
}

/// Per-frame input coming from the outside world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameParams {
    pub renderer: Renderer,
    pub rotate_camera: bool,
}

/// Algorithm used to draw the final image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Renderer {
    #[default]
    Rasterizer,
    Raytracer,
}

impl Renderer {
    pub fn toggled(self) -> Self {
        match self {
            Renderer::Rasterizer => Renderer::Raytracer,
            Renderer::Raytracer => Renderer::Rasterizer,
        }
    }
}

impl fmt::Display for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Rasterizer => write!(f, "rasterizer"),
            Renderer::Raytracer => write!(f, "raytracer"),
        }
    }
}

impl FromStr for Renderer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rasterizer" => Ok(Renderer::Rasterizer),
            "raytracer" => Ok(Renderer::Raytracer),
            _ => Err(format!(
                "unknown renderer `{s}` (expected `rasterizer` or `raytracer`)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_round_trip() {
        for renderer in [Renderer::Rasterizer, Renderer::Raytracer] {
            assert_eq!(Ok(renderer), renderer.to_string().parse());
        }

        assert!("pathtracer".parse::<Renderer>().is_err());
    }

    #[test]
    fn renderer_toggle() {
        assert_eq!(Renderer::Raytracer, Renderer::Rasterizer.toggled());
        assert_eq!(Renderer::Rasterizer, Renderer::Raytracer.toggled());
    }
}
