use glam::{vec3, Vec3};

/// Krzysztof Narkowicz's fit of the ACES filmic curve; maps HDR radiance
/// into `0..=1`.
pub fn aces(color: Vec3) -> Vec3 {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;

    ((color * (a * color + b)) / (color * (c * color + d) + e))
        .clamp(Vec3::ZERO, Vec3::ONE)
}

pub fn linear_to_srgb(color: Vec3) -> Vec3 {
    fn channel(c: f32) -> f32 {
        if c <= 0.0031308 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    }

    vec3(channel(color.x), channel(color.y), channel(color.z))
}

/// Turns HDR radiance into a display-ready (sRGB-encoded) color.
pub fn tonemap(color: Vec3, exposure: f32) -> Vec3 {
    linear_to_srgb(aces(color.max(Vec3::ZERO) * exposure))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn aces_range() {
        assert_eq!(Vec3::ZERO, aces(Vec3::ZERO));
        assert_eq!(Vec3::ONE, aces(Vec3::splat(1000.0)));

        let mut prev = 0.0;

        for i in 1..100 {
            let curr = aces(Vec3::splat(i as f32 * 0.1)).x;

            assert!(curr >= prev);
            prev = curr;
        }
    }

    #[test]
    fn srgb() {
        assert_relative_eq!(0.0, linear_to_srgb(Vec3::ZERO).x);
        assert_relative_eq!(1.0, linear_to_srgb(Vec3::ONE).x, epsilon = 1e-5);
        assert_relative_eq!(0.7353569, linear_to_srgb(Vec3::splat(0.5)).x, epsilon = 1e-5);
    }

    #[test]
    fn tonemap_clamps_negative_input() {
        assert_eq!(Vec3::ZERO, tonemap(Vec3::splat(-1.0), 1.0));
    }
}
