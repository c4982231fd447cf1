use glam::{Vec4, Vec4Swizzles};
use log::trace;
use radiant_gpu as gpu;

use crate::{DoubleBuffered, Error, FormFactors, Geometry, Result};

/// CPU rendition of [`crate::Radiosity`]: the same gathering step, the same
/// ping-pong discipline.
#[derive(Clone, Debug)]
pub struct ReferenceRadiosity {
    patches: Vec<gpu::Patch>,
    form_factors: FormFactors,
    lightmap: DoubleBuffered<Vec<Vec4>>,
    iteration: u32,
}

impl ReferenceRadiosity {
    pub fn new(geometry: &Geometry, form_factors: FormFactors) -> Result<Self> {
        let patch_count = geometry.patch_count();

        if form_factors.patch_count() != patch_count {
            return Err(Error::LightmapMismatch {
                lightmap: form_factors.patch_count(),
                scene: patch_count,
            });
        }

        Ok(Self {
            patches: geometry.patches.clone(),
            form_factors,
            lightmap: DoubleBuffered::new(
                vec![Vec4::ZERO; patch_count],
                vec![Vec4::ZERO; patch_count],
            ),
            iteration: 0,
        })
    }

    /// Performs one iteration and swaps the buffers.
    pub fn run(&mut self) {
        let (read, write) = self.lightmap.split_mut();

        for (patch_id, texel) in write.iter_mut().enumerate() {
            *texel = gpu::gather(
                gpu::PatchId::new(patch_id as u32),
                &self.patches,
                self.form_factors.as_slice(),
                read,
            );
        }

        self.lightmap.swap();
        self.iteration += 1;

        trace!("Reference radiosity; iteration={}", self.iteration);
    }

    pub fn reset(&mut self) {
        for item in self.lightmap.items_mut() {
            item.fill(Vec4::ZERO);
        }

        self.lightmap.reset();
        self.iteration = 0;
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn read_index(&self) -> usize {
        self.lightmap.read_index()
    }

    /// Newest estimate of the reflected radiance.
    pub fn lightmap(&self) -> &[Vec4] {
        self.lightmap.read()
    }

    /// Sum of absolute per-channel changes made by the latest iteration.
    pub fn delta(&self) -> f32 {
        self.lightmap
            .read()
            .iter()
            .zip(self.lightmap.write())
            .map(|(new, old)| {
                let delta = (new.xyz() - old.xyz()).abs();

                delta.x + delta.y + delta.z
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec3};

    use super::*;
    use crate::{Bvh, QuadDesc, Scene};

    fn two_patches() -> (Geometry, FormFactors) {
        let scene = Scene::builder()
            .quad(
                QuadDesc::new(Vec3::ZERO, Vec3::X, Vec3::Y)
                    .with_albedo(Vec3::ZERO)
                    .with_emission(Vec3::ONE),
            )
            .quad(
                QuadDesc::new(vec3(0.0, 0.0, 1.0), Vec3::Y, Vec3::X)
                    .with_albedo(Vec3::splat(0.5)),
            )
            .build()
            .unwrap();

        let geometry = scene.geometry(2.0, 16).unwrap();

        (geometry, FormFactors::from_rows(2, vec![0.0, 1.0, 1.0, 0.0]))
    }

    #[test]
    fn two_patches_converge() {
        let (geometry, form_factors) = two_patches();
        let mut target = ReferenceRadiosity::new(&geometry, form_factors).unwrap();

        target.run();

        assert_relative_eq!(0.5, target.lightmap()[1].x);
        assert_relative_eq!(0.0, target.lightmap()[0].x);

        for _ in 0..50 {
            let prev = target.lightmap()[1].x;

            target.run();

            assert!(target.lightmap()[1].x >= prev);
            assert!(target.lightmap()[1].x <= 1.0);
        }

        // A has zero albedo, so nothing ever bounces back to B
        assert_relative_eq!(0.5, target.lightmap()[1].x);
    }

    #[test]
    fn mismatched_form_factors() {
        let (geometry, _) = two_patches();

        let result =
            ReferenceRadiosity::new(&geometry, FormFactors::from_rows(1, vec![0.0]));

        assert!(matches!(
            result,
            Err(Error::LightmapMismatch {
                lightmap: 1,
                scene: 2
            })
        ));
    }

    #[test]
    fn ping_pong_alternates() {
        let (geometry, form_factors) = two_patches();
        let mut target = ReferenceRadiosity::new(&geometry, form_factors).unwrap();

        for i in 0..6 {
            assert_eq!(i % 2, target.read_index());

            target.run();
        }

        target.reset();

        assert_eq!(0, target.read_index());
        assert_eq!(0, target.iteration());
        assert!(target.lightmap().iter().all(|texel| *texel == Vec4::ZERO));
    }

    #[test]
    fn cornell_box() {
        let geometry = Scene::cornell_box().geometry(2.0, 4096).unwrap();
        let bvh = Bvh::build(&geometry.quads).unwrap();
        let form_factors = FormFactors::bake(&geometry, &bvh, 2, 0);
        let mut target = ReferenceRadiosity::new(&geometry, form_factors).unwrap();

        let mut deltas = Vec::new();

        for _ in 0..16 {
            target.run();
            deltas.push(target.delta());

            for texel in target.lightmap() {
                assert!(texel.min_element() >= 0.0, "negative radiance: {texel}");
            }
        }

        // Past the first few bounces, changes shrink geometrically
        for pair in deltas[3..].windows(2) {
            assert!(pair[1] < pair[0], "deltas: {deltas:?}");
        }

        // Starting over reproduces the same estimate
        let expected = target.lightmap().to_vec();

        target.reset();

        for _ in 0..16 {
            target.run();
        }

        assert_eq!(expected, target.lightmap());
    }
}
