//! Common structs, algorithms etc. shared between Radiant's shaders and its
//! renderer.
//!
//! Everything that crosses the CPU/GPU boundary lives here as a `#[repr(C)]`
//! [`bytemuck::Pod`] type whose layout matches the declarations in
//! `radiant-shaders/src/common.wgsl`; the algorithms implemented here are the
//! host-side twins of the WGSL functions with the same names, which is what
//! allows the form-factor bake and the reference renderers to run on the CPU.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod bvh_view;
mod camera;
mod hit;
mod lightmap;
mod passes;
mod patch;
mod quad;
mod radiosity;
mod ray;
mod tonemap;
mod world;

pub use self::bvh_view::*;
pub use self::camera::*;
pub use self::hit::*;
pub use self::lightmap::*;
pub use self::passes::*;
pub use self::patch::*;
pub use self::quad::*;
pub use self::radiosity::*;
pub use self::ray::*;
pub use self::tonemap::*;
pub use self::world::*;

/// Maximum stack size when traversing the BVH.
///
/// Affects the maximum depth of the BVH tree - the builder refuses trees that
/// are deeper than that.
pub const BVH_STACK_SIZE: usize = 32;

/// Number of invocations per workgroup of the radiosity pass.
pub const RADIOSITY_WORKGROUP_SIZE: u32 = 256;

/// Width (and height) of a workgroup of the screen-space compute passes.
pub const SCREEN_WORKGROUP_SIZE: u32 = 16;
