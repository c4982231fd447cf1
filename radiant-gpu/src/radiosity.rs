use glam::{Vec4, Vec4Swizzles};

use crate::{Patch, PatchId};

/// Performs a single gathering step for given patch: returns the radiance it
/// reflects after receiving light from all the other patches, as seen in
/// `lightmap` (which holds the previous iteration's reflected radiance).
///
/// `form_factors` is the row-major `patches.len() × patches.len()` matrix.
pub fn gather(
    patch_id: PatchId,
    patches: &[Patch],
    form_factors: &[f32],
    lightmap: &[Vec4],
) -> Vec4 {
    let patch_count = patches.len();
    let row = patch_id.get() as usize * patch_count;
    let mut incoming = glam::Vec3::ZERO;

    for (j, other) in patches.iter().enumerate() {
        let form_factor = form_factors[row + j];

        if form_factor > 0.0 {
            incoming += form_factor * (other.emission() + lightmap[j].xyz());
        }
    }

    (patches[patch_id.get() as usize].albedo() * incoming).extend(0.0)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec3};

    use super::*;

    #[test]
    fn gather_two_patches() {
        let patches = [
            Patch::new(
                Vec3::ZERO,
                Vec3::Z,
                1.0,
                Vec3::ZERO,
                Vec3::ONE,
                0,
            ),
            Patch::new(
                vec3(0.0, 0.0, 1.0),
                -Vec3::Z,
                1.0,
                Vec3::splat(0.5),
                Vec3::ZERO,
                1,
            ),
        ];

        let form_factors = [0.0, 1.0, 1.0, 0.0];
        let mut lightmap = vec![Vec4::ZERO; 2];

        // ---

        let radiance =
            gather(PatchId::new(1), &patches, &form_factors, &lightmap);

        assert_relative_eq!(0.5, radiance.x);
        assert_relative_eq!(0.5, radiance.y);
        assert_relative_eq!(0.5, radiance.z);

        // Black emitter reflects nothing
        let radiance =
            gather(PatchId::new(0), &patches, &form_factors, &lightmap);

        assert_eq!(Vec4::ZERO, radiance);

        // ---

        lightmap[1] = radiance;
        lightmap[0] = Vec4::new(2.0, 2.0, 2.0, 0.0);

        let radiance =
            gather(PatchId::new(1), &patches, &form_factors, &lightmap);

        assert_relative_eq!(1.5, radiance.x);
    }
}
