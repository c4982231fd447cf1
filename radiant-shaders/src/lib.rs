//! WGSL sources of Radiant's passes.
//!
//! Each pass is compiled together with [`COMMON`] (and, for passes that look
//! at the lightmap, [`LIGHTMAP`]); see `radiant::Shaders`. Struct layouts and
//! functions here mirror the ones from `radiant-gpu`.

pub const COMMON: &str = include_str!("common.wgsl");
pub const LIGHTMAP: &str = include_str!("lightmap.wgsl");
pub const RADIOSITY: &str = include_str!("radiosity.wgsl");
pub const RASTERIZER: &str = include_str!("rasterizer.wgsl");
pub const RAYTRACER: &str = include_str!("raytracer.wgsl");
pub const TONEMAPPER: &str = include_str!("tonemapper.wgsl");

/// Placeholder in [`TONEMAPPER`] that gets replaced with the storage format
/// of the output texture (e.g. `rgba8unorm`).
pub const OUTPUT_FORMAT_PLACEHOLDER: &str = "{{OUTPUT_FORMAT}}";
