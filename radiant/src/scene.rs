mod buffers;
mod cornell;

use glam::{uvec2, vec2, Mat3, Vec2, Vec3};
use log::debug;
use radiant_gpu as gpu;
use thiserror::Error;

pub use self::buffers::*;

/// Planar, one-sided rectangle of the scene.
///
/// `right` and `up` are half-extents, so the quad spans
/// `center ± right ± up`; it faces `normalize(right × up)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadDesc {
    pub center: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub albedo: Vec3,
    pub emission: Vec3,
}

impl QuadDesc {
    pub fn new(center: Vec3, right: Vec3, up: Vec3) -> Self {
        Self {
            center,
            right,
            up,
            albedo: Vec3::splat(0.75),
            emission: Vec3::ZERO,
        }
    }

    pub fn with_albedo(mut self, albedo: Vec3) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_emission(mut self, emission: Vec3) -> Self {
        self.emission = emission;
        self
    }

    pub fn normal(&self) -> Vec3 {
        self.right.cross(self.up).normalize()
    }

    pub fn area(&self) -> f32 {
        4.0 * self.right.cross(self.up).length()
    }

    pub fn is_emitter(&self) -> bool {
        self.emission.max_element() > 0.0
    }

    fn validate(&self, quad: usize) -> Result<(), SceneError> {
        let vectors = [self.center, self.right, self.up, self.albedo, self.emission];

        if vectors.iter().any(|v| !v.is_finite()) {
            return Err(SceneError::NonFinite { quad });
        }

        let right = self.right.length();
        let up = self.up.length();

        if right <= f32::EPSILON
            || up <= f32::EPSILON
            || self.right.cross(self.up).length() <= 1e-6 * right * up
        {
            return Err(SceneError::Degenerate { quad });
        }

        if self.albedo.min_element() < 0.0 || self.albedo.max_element() >= 1.0 {
            return Err(SceneError::InvalidAlbedo {
                quad,
                albedo: self.albedo,
            });
        }

        if self.emission.min_element() < 0.0 {
            return Err(SceneError::NegativeEmission { quad });
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("scene is empty")]
    Empty,

    #[error("scene has no light emitters")]
    NoEmitters,

    #[error("quad #{quad} contains non-finite numbers")]
    NonFinite { quad: usize },

    #[error("quad #{quad} is degenerate (its axes are zero or parallel)")]
    Degenerate { quad: usize },

    #[error(
        "quad #{quad} has albedo {albedo}, but each component must lie \
         within [0, 1)"
    )]
    InvalidAlbedo { quad: usize, albedo: Vec3 },

    #[error("quad #{quad} has negative emission")]
    NegativeEmission { quad: usize },

    #[error("patch size must be positive and finite, got {0}")]
    InvalidPatchSize(f32),

    #[error("scene would be split into {count} patches, but at most {max} are allowed")]
    TooManyPatches { count: usize, max: usize },
}

#[derive(Clone, Debug, Default)]
pub struct SceneBuilder {
    quads: Vec<QuadDesc>,
}

impl SceneBuilder {
    pub fn quad(mut self, quad: QuadDesc) -> Self {
        self.quads.push(quad);
        self
    }

    /// Adds an axis-aligned box resting on its bottom face (which is not
    /// emitted, since nothing can see it), rotated by `rotation` radians
    /// around its vertical axis.
    pub fn cuboid(
        mut self,
        center: Vec3,
        size: Vec3,
        rotation: f32,
        albedo: Vec3,
    ) -> Self {
        let rotation = Mat3::from_rotation_y(rotation);
        let half = size / 2.0;
        let ex = rotation * Vec3::X * half.x;
        let ey = Vec3::Y * half.y;
        let ez = rotation * Vec3::Z * half.z;

        let faces = [
            (center + ex, -ez, ey),
            (center - ex, ez, ey),
            (center + ez, ex, ey),
            (center - ez, -ex, ey),
            (center + ey, ez, ex),
        ];

        for (center, right, up) in faces {
            self.quads
                .push(QuadDesc::new(center, right, up).with_albedo(albedo));
        }

        self
    }

    pub fn build(self) -> Result<Scene, SceneError> {
        if self.quads.is_empty() {
            return Err(SceneError::Empty);
        }

        for (idx, quad) in self.quads.iter().enumerate() {
            quad.validate(idx)?;
        }

        if !self.quads.iter().any(QuadDesc::is_emitter) {
            return Err(SceneError::NoEmitters);
        }

        Ok(Scene { quads: self.quads })
    }
}

/// Immutable description of the room and its contents.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    quads: Vec<QuadDesc>,
}

impl Scene {
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    pub fn quads(&self) -> &[QuadDesc] {
        &self.quads
    }

    /// Splits every quad into a grid of patches roughly `patch_size` wide.
    ///
    /// Patch ids are assigned contiguously, quad after quad and row after row
    /// within each quad; that's the order of the lightmap.
    pub fn geometry(
        &self,
        patch_size: f32,
        max_patches: usize,
    ) -> Result<Geometry, SceneError> {
        if !patch_size.is_finite() || patch_size <= 0.0 {
            return Err(SceneError::InvalidPatchSize(patch_size));
        }

        // Rotated axes can come out a tiny bit longer than they should be;
        // the epsilon keeps them from getting an extra row of patches
        let resolution = |axis: Vec3| {
            ((2.0 * axis.length() / patch_size - 1e-4).ceil() as u32).max(1)
        };

        let resolutions: Vec<_> = self
            .quads
            .iter()
            .map(|quad| uvec2(resolution(quad.right), resolution(quad.up)))
            .collect();

        // Tiny patch sizes saturate the resolution, so the count saturates too
        let count = resolutions.iter().fold(0usize, |count, res| {
            let patches = (res.x as usize).saturating_mul(res.y as usize);

            count.saturating_add(patches)
        });

        if count > max_patches {
            return Err(SceneError::TooManyPatches {
                count,
                max: max_patches,
            });
        }

        let mut quads = Vec::with_capacity(self.quads.len());
        let mut patches = Vec::with_capacity(count);

        for (quad_id, (desc, resolution)) in
            self.quads.iter().zip(resolutions).enumerate()
        {
            let quad = gpu::Quad::new(
                desc.center,
                desc.right,
                desc.up,
                desc.albedo,
                desc.emission,
                gpu::PatchId::new(patches.len() as u32),
                resolution,
            );

            let area = quad.area() / (quad.patch_count() as f32);

            for y in 0..resolution.y {
                for x in 0..resolution.x {
                    let uv = quad.patch_center(uvec2(x, y));

                    patches.push(gpu::Patch::new(
                        quad.point_at(uv),
                        quad.normal(),
                        area,
                        desc.albedo,
                        desc.emission,
                        quad_id as u32,
                    ));
                }
            }

            quads.push(quad);
        }

        debug!(
            "Scene split into {} patches (patch_size={patch_size})",
            patches.len()
        );

        Ok(Geometry { quads, patches })
    }
}

/// Scene prepared for the GPU: quads annotated with their lightmap layout,
/// plus the patches themselves.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub quads: Vec<gpu::Quad>,
    pub patches: Vec<gpu::Patch>,
}

impl Geometry {
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Returns a point within given patch; `offset` spans `0..=1` on both
    /// axes across the patch.
    pub fn patch_point(&self, patch_id: gpu::PatchId, offset: Vec2) -> Vec3 {
        let patch = &self.patches[patch_id.get() as usize];
        let quad = &self.quads[patch.quad_id() as usize];
        let resolution = quad.resolution();
        let idx = patch_id.get() - quad.first_patch().get();
        let coords = uvec2(idx % resolution.x, idx / resolution.x);

        let uv = (coords.as_vec2() + offset) / resolution.as_vec2() * 2.0
            - vec2(1.0, 1.0);

        quad.point_at(uv)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    fn light() -> QuadDesc {
        QuadDesc::new(Vec3::ZERO, Vec3::X, Vec3::Z).with_emission(Vec3::ONE)
    }

    #[test]
    fn validation() {
        assert_eq!(Err(SceneError::Empty), Scene::builder().build());

        assert_eq!(
            Err(SceneError::NoEmitters),
            Scene::builder()
                .quad(QuadDesc::new(Vec3::ZERO, Vec3::X, Vec3::Y))
                .build()
        );

        assert_eq!(
            Err(SceneError::Degenerate { quad: 1 }),
            Scene::builder()
                .quad(light())
                .quad(QuadDesc::new(Vec3::ZERO, Vec3::X, 2.0 * Vec3::X))
                .build()
        );

        assert_eq!(
            Err(SceneError::InvalidAlbedo {
                quad: 1,
                albedo: Vec3::ONE
            }),
            Scene::builder()
                .quad(light())
                .quad(
                    QuadDesc::new(Vec3::ZERO, Vec3::X, Vec3::Y)
                        .with_albedo(Vec3::ONE)
                )
                .build()
        );

        assert_eq!(
            Err(SceneError::NegativeEmission { quad: 0 }),
            Scene::builder()
                .quad(light().with_emission(vec3(1.0, -1.0, 1.0)))
                .build()
        );

        assert_eq!(
            Err(SceneError::NonFinite { quad: 0 }),
            Scene::builder()
                .quad(QuadDesc::new(Vec3::NAN, Vec3::X, Vec3::Z))
                .build()
        );

        assert!(Scene::builder().quad(light()).build().is_ok());
    }

    #[test]
    fn cuboid_faces_outwards() {
        let center = vec3(1.0, 2.0, 3.0);

        let scene = Scene::builder()
            .quad(light())
            .cuboid(center, vec3(2.0, 4.0, 2.0), 0.3, Vec3::splat(0.5))
            .build()
            .unwrap();

        assert_eq!(6, scene.quads().len());

        for quad in &scene.quads()[1..] {
            let outwards = (quad.center - center).normalize();

            assert_relative_eq!(1.0, quad.normal().dot(outwards), epsilon = 1e-5);
        }

        let area: f32 = scene.quads()[1..].iter().map(|quad| quad.area()).sum();

        assert_relative_eq!(4.0 * 8.0 + 4.0, area, epsilon = 1e-4);
    }

    #[test]
    fn geometry() {
        let scene = Scene::builder()
            .quad(light())
            .quad(QuadDesc::new(vec3(0.0, 0.0, -5.0), 2.0 * Vec3::X, Vec3::Y))
            .build()
            .unwrap();

        let geometry = scene.geometry(1.0, 100).unwrap();

        assert_eq!(2, geometry.quads.len());
        assert_eq!(4 + 8, geometry.patch_count());
        assert_eq!(gpu::PatchId::new(4), geometry.quads[1].first_patch());
        assert_eq!(uvec2(4, 2), geometry.quads[1].resolution());

        // Patch ids are contiguous and each patch knows its quad
        for (id, patch) in geometry.patches.iter().enumerate() {
            let quad = &geometry.quads[patch.quad_id() as usize];
            let uv = quad.uv_at(patch.center());

            assert_eq!(gpu::PatchId::new(id as u32), quad.patch_at(uv));
        }

        let area: f32 = geometry.patches[4..].iter().map(|p| p.area()).sum();

        assert_relative_eq!(8.0, area);

        // ---

        let point = geometry.patch_point(gpu::PatchId::new(4), Vec2::ZERO);

        assert_relative_eq!(-2.0, point.x);
        assert_relative_eq!(-1.0, point.y);

        let point = geometry.patch_point(gpu::PatchId::new(11), Vec2::ONE);

        assert_relative_eq!(2.0, point.x);
        assert_relative_eq!(1.0, point.y);

        // ---

        assert_eq!(
            Err(SceneError::TooManyPatches { count: 12, max: 10 }),
            scene.geometry(1.0, 10).map(|_| ())
        );

        assert!(matches!(
            Scene::cornell_box().geometry(1e-30, 4096),
            Err(SceneError::TooManyPatches { max: 4096, .. })
        ));

        assert_eq!(
            Err(SceneError::InvalidPatchSize(0.0)),
            scene.geometry(0.0, 100).map(|_| ())
        );
    }
}
