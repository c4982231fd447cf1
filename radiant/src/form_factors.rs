use std::f32::consts::PI;

use derivative::Derivative;
use glam::vec2;
use log::info;
use radiant_gpu as gpu;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{utils, Bvh, Geometry};

/// Dense matrix of form factors, where `get(i, j)` is the fraction of light
/// leaving patch `j` that arrives at patch `i` (weighted by `j`'s area, i.e.
/// the factor used when gathering light at `i`).
#[derive(Clone, Derivative, PartialEq)]
#[derivative(Debug)]
pub struct FormFactors {
    patch_count: usize,

    #[derivative(Debug = "ignore")]
    data: Vec<f32>,
}

impl FormFactors {
    /// Estimates form factors between each pair of patches by summing the
    /// point-to-disc approximation over `samples` jittered point pairs (each
    /// pair standing for `1 / samples` of the sender's area), testing each
    /// pair for visibility.
    ///
    /// Rows summing up to more than one get normalized, so that no patch
    /// receives more energy than was emitted towards it.
    pub fn bake(geometry: &Geometry, bvh: &Bvh, samples: u32, seed: u64) -> Self {
        let patch_count = geometry.patch_count();
        let samples = samples.max(1);

        info!(
            "Baking form factors; patches={patch_count}, samples={samples}, \
             seed={seed}"
        );

        let data = utils::measure("form factors", || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut data = vec![0.0; patch_count * patch_count];

            for (i, row) in data.chunks_mut(patch_count.max(1)).enumerate() {
                for (j, form_factor) in row.iter_mut().enumerate() {
                    *form_factor = estimate(geometry, bvh, i, j, samples, &mut rng);
                }

                let sum: f32 = row.iter().sum();

                if sum > 1.0 {
                    for form_factor in row.iter_mut() {
                        *form_factor /= sum;
                    }
                }
            }

            data
        });

        Self { patch_count, data }
    }

    /// Creates form factors out of a row-major matrix.
    pub fn from_rows(patch_count: usize, data: Vec<f32>) -> Self {
        assert_eq!(patch_count * patch_count, data.len());

        Self { patch_count, data }
    }

    pub fn patch_count(&self) -> usize {
        self.patch_count
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.patch_count + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.patch_count..][..self.patch_count]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn size_bytes(&self) -> u64 {
        (self.data.len() * std::mem::size_of::<f32>()) as u64
    }
}

fn estimate(
    geometry: &Geometry,
    bvh: &Bvh,
    i: usize,
    j: usize,
    samples: u32,
    rng: &mut StdRng,
) -> f32 {
    let receiver = &geometry.patches[i];
    let sender = &geometry.patches[j];

    // Patches of the same quad are coplanar, so they can't see each other
    if receiver.quad_id() == sender.quad_id() {
        return 0.0;
    }

    let receiver_normal = receiver.normal();
    let sender_normal = sender.normal();

    // Each sample stands for a disc covering its share of the sender
    let sample_area = sender.area() / (samples as f32);

    let mut sum = 0.0;

    for _ in 0..samples {
        let from = geometry.patch_point(
            gpu::PatchId::new(i as u32),
            vec2(rng.gen(), rng.gen()),
        );

        let to = geometry.patch_point(
            gpu::PatchId::new(j as u32),
            vec2(rng.gen(), rng.gen()),
        );

        let dir = to - from;
        let distance_squared = dir.length_squared();

        if distance_squared <= f32::EPSILON {
            continue;
        }

        let dir = dir / distance_squared.sqrt();
        let cos_receiver = receiver_normal.dot(dir);
        let cos_sender = -sender_normal.dot(dir);

        if cos_receiver <= 0.0 || cos_sender <= 0.0 {
            continue;
        }

        if !is_visible(geometry, bvh, from, receiver_normal, to, sender_normal)
        {
            continue;
        }

        sum += cos_receiver * cos_sender * sample_area
            / (PI * distance_squared + sample_area);
    }

    sum
}

fn is_visible(
    geometry: &Geometry,
    bvh: &Bvh,
    from: glam::Vec3,
    from_normal: glam::Vec3,
    to: glam::Vec3,
    to_normal: glam::Vec3,
) -> bool {
    let from = from + from_normal * gpu::Hit::NUDGE_OFFSET;
    let to = to + to_normal * gpu::Hit::NUDGE_OFFSET;
    let dir = to - from;
    let distance = dir.length();

    !gpu::Ray::new(from, dir / distance).trace_any(
        &geometry.quads,
        bvh.view(),
        distance,
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec3};

    use super::*;
    use crate::{QuadDesc, Scene};

    /// Two unit squares facing each other, one unit apart.
    fn facing_squares() -> Scene {
        Scene::builder()
            .quad(
                QuadDesc::new(Vec3::ZERO, 0.5 * Vec3::X, 0.5 * Vec3::Z)
                    .with_emission(Vec3::ONE),
            )
            .quad(QuadDesc::new(
                vec3(0.0, -1.0, 0.0),
                0.5 * Vec3::Z,
                0.5 * Vec3::X,
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn facing_squares_see_each_other() {
        let geometry = facing_squares().geometry(1.0, 100).unwrap();
        let bvh = Bvh::build(&geometry.quads).unwrap();
        let target = FormFactors::bake(&geometry, &bvh, 256, 0);

        assert_eq!(2, target.patch_count());
        assert_eq!(0.0, target.get(0, 0));
        assert_eq!(0.0, target.get(1, 1));

        // Analytic value for two parallel unit squares one unit apart is
        // about 0.1998
        assert_relative_eq!(0.2, target.get(0, 1), epsilon = 0.05);
        assert_relative_eq!(0.2, target.get(1, 0), epsilon = 0.05);
    }

    #[test]
    fn occluder_blocks_light() {
        let scene = Scene::builder()
            .quad(
                QuadDesc::new(Vec3::ZERO, 0.5 * Vec3::X, 0.5 * Vec3::Z)
                    .with_emission(Vec3::ONE),
            )
            .quad(QuadDesc::new(
                vec3(0.0, -1.0, 0.0),
                0.5 * Vec3::Z,
                0.5 * Vec3::X,
            ))
            // Back-facing towards the emitter, but it still blocks
            .quad(QuadDesc::new(
                vec3(0.0, -0.5, 0.0),
                Vec3::X,
                Vec3::Z,
            ))
            .build()
            .unwrap();

        let geometry = scene.geometry(2.0, 100).unwrap();
        let bvh = Bvh::build(&geometry.quads).unwrap();
        let target = FormFactors::bake(&geometry, &bvh, 16, 0);

        assert_eq!(0.0, target.get(0, 1));
        assert_eq!(0.0, target.get(1, 0));
    }

    #[test]
    fn cornell_box_rows() {
        let geometry = Scene::cornell_box().geometry(2.5, 4096).unwrap();
        let bvh = Bvh::build(&geometry.quads).unwrap();
        let target = FormFactors::bake(&geometry, &bvh, 2, 7);

        for i in 0..target.patch_count() {
            let row = target.row(i);
            let sum: f32 = row.iter().sum();

            assert!(row.iter().all(|&ff| ff >= 0.0 && ff.is_finite()));
            assert!(sum <= 1.0 + 1e-4, "row {i} sums up to {sum}");
        }

        // Reproducible for a given seed
        assert_eq!(target, FormFactors::bake(&geometry, &bvh, 2, 7));
    }
}
