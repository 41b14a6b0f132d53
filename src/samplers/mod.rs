use std::{collections::HashMap, f64};

use tinyjson::JsonValue;

use crate::{
    json::json_to_f64,
    vec::{Vec2, Vec3, spherical_to_directional},
};

pub trait Sampler: Send + Sync {
    fn next(&mut self) -> f64;
    fn next2d(&mut self) -> Vec2;

    /// Spawn the sampler a tile worker will use, seeded deterministically
    /// from its `(tile_x, tile_y)` so a render is reproducible regardless of
    /// how many threads process the tiles or in what order.
    fn seed_for_tile(&self, tile_x: u32, tile_y: u32) -> Box<dyn Sampler>;

    fn nb_samples(&self) -> usize;
    fn set_nb_samples(&mut self, nspp: usize);
}

pub mod independent;

#[must_use]
pub fn json_to_sampler(json: &HashMap<String, JsonValue>) -> Box<dyn Sampler> {
    assert!(
        json.contains_key("type"),
        "Need to specify 'type' variable to create the sampler.\n{json:?}."
    );

    let nspp = json_to_f64(json, "samples", 1.0) as usize;

    let t: String = json["type"].clone().try_into().unwrap();
    match t.as_str() {
        "independent" => Box::new(independent::Independent::new(nspp)),
        _ => panic!("Unknow shape type: {t}"),
    }
}

#[must_use]
pub fn sample_spherical(sample: &Vec2) -> Vec3 {
    let theta = sample.x.mul_add(2.0, -1.0).acos();
    let phi = sample.y * f64::consts::PI * 2.0;
    spherical_to_directional(theta, phi)
}

#[must_use]
pub fn pdf_spherical(_dir: &Vec3) -> f64 {
    f64::consts::FRAC_1_PI / 4.0 // 1 / 4pi
}

#[must_use]
pub fn sample_hemisphere(sample: &Vec2) -> Vec3 {
    let theta = sample.x.acos();
    let phi = sample.y * f64::consts::PI * 2.0;
    spherical_to_directional(theta, phi)
}

#[must_use]
pub fn pdf_hemisphere(dir: &Vec3) -> f64 {
    if dir.z < 0.0 {
        0.0
    } else {
        f64::consts::FRAC_1_PI / 2.0 // 1 / 2pi
    }
}

#[must_use]
pub fn sample_cosine_hemisphere(sample: &Vec2) -> Vec3 {
    let theta = (1.0 - sample.x).sqrt().acos();
    let phi = sample.y * f64::consts::PI * 2.0;
    spherical_to_directional(theta, phi)
}

#[must_use]
pub fn pdf_cosine_hemisphere(dir: &Vec3) -> f64 {
    if dir.z < 0.0 {
        0.0
    } else {
        dir.z * f64::consts::FRAC_1_PI
    }
}

#[must_use]
pub fn sample_uniform_square(sample: &Vec2) -> Vec2 {
    *sample
}

#[must_use]
pub fn pdf_uniform_square(_sample: &Vec2) -> f64 {
    1.0
}

/// Inverse-CDF tent warp on a single axis: `u < 0.5 -> sqrt(2u) - 1`,
/// else `1 - sqrt(2 - 2u)`.
#[must_use]
pub fn tent_1d(u: f64) -> f64 {
    if u < 0.5 {
        (2.0 * u).sqrt() - 1.0
    } else {
        1.0 - (2.0 - 2.0 * u).sqrt()
    }
}

#[must_use]
pub fn pdf_tent_1d(u: f64) -> f64 {
    if (-1.0..=1.0).contains(&u) {
        1.0 - u.abs()
    } else {
        0.0
    }
}

#[must_use]
pub fn sample_tent(sample: &Vec2) -> Vec2 {
    Vec2::new(tent_1d(sample.x), tent_1d(sample.y))
}

#[must_use]
pub fn pdf_tent(p: &Vec2) -> f64 {
    pdf_tent_1d(p.x) * pdf_tent_1d(p.y)
}

#[must_use]
pub fn sample_uniform_disk(sample: &Vec2) -> Vec2 {
    let r = sample.x.sqrt();
    let theta = 2.0 * f64::consts::PI * sample.y;
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[must_use]
pub fn pdf_uniform_disk(p: &Vec2) -> f64 {
    if p.x * p.x + p.y * p.y <= 1.0 {
        f64::consts::FRAC_1_PI
    } else {
        0.0
    }
}

/// Beckmann-distributed microfacet normal (in local shading frame). `alpha`
/// is the Beckmann roughness parameter.
#[must_use]
pub fn sample_beckmann(sample: &Vec2, alpha: f64) -> Vec3 {
    let log_sample = (1.0 - sample.x).ln();
    let tan_theta_sqr = -alpha * alpha * log_sample;
    let theta = (tan_theta_sqr.sqrt()).atan();
    let phi = sample.y * f64::consts::PI * 2.0;
    spherical_to_directional(theta, phi)
}

#[must_use]
pub fn pdf_beckmann(m: &Vec3, alpha: f64) -> f64 {
    if m.z <= 0.0 {
        return 0.0;
    }
    let cos_theta = m.z;
    let cos_theta2 = cos_theta * cos_theta;
    let tan_theta2 = (1.0 - cos_theta2) / cos_theta2;
    let alpha2 = alpha * alpha;
    f64::consts::FRAC_1_PI * (-tan_theta2 / alpha2).exp() / (alpha2 * cos_theta2 * cos_theta)
}

/// GGX-distributed microfacet normal (in local shading frame). `alpha` is
/// the GGX roughness parameter.
#[must_use]
pub fn sample_ggx(sample: &Vec2, alpha: f64) -> Vec3 {
    let tan_theta2 = alpha * alpha * sample.x / (1.0 - sample.x);
    let cos_theta = 1.0 / (1.0 + tan_theta2).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = sample.y * f64::consts::PI * 2.0;
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

#[must_use]
pub fn pdf_ggx(m: &Vec3, alpha: f64) -> f64 {
    if m.z <= 0.0 {
        return 0.0;
    }
    let cos_theta = m.z;
    let cos_theta2 = cos_theta * cos_theta;
    let alpha2 = alpha * alpha;
    let tan_theta2 = (1.0 - cos_theta2) / cos_theta2;
    let denom = f64::consts::PI * cos_theta2 * cos_theta2 * (alpha2 + tan_theta2).powi(2);
    alpha2 * cos_theta / denom
}


#[must_use]
#[allow(clippy::unreadable_literal)]
pub fn hash2(p: Vec2) -> f64 {
    let mut h = p.x.to_bits().wrapping_mul(0x6C8E9CF5) ^ p.y.to_bits().wrapping_mul(0xB5297A4D);

    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846CA68B);
    h ^= h >> 16;

    (h as f64) / (u64::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samplers::independent::Independent;

    const N: u32 = 1 << 16;

    /// Estimates `∫ pdf dΩ` over the sphere by importance sampling with the
    /// uniform-sphere warp as proposal: `E_{uniform}[pdf(X) / pdf_uniform(X)]`.
    fn pdf_integral_over_sphere<P>(pdf: P, sampler: &mut dyn Sampler) -> f64
    where
        P: Fn(&Vec3) -> f64,
    {
        let mut acc = 0.0;
        for _ in 0..N {
            let dir = sample_spherical(&sampler.next2d());
            acc += pdf(&dir) / pdf_spherical(&dir);
        }
        acc / f64::from(N)
    }

    /// Same as above but with the uniform-hemisphere warp as proposal, for
    /// pdfs whose support is only the upper hemisphere.
    fn pdf_integral_over_hemisphere<P>(pdf: P, sampler: &mut dyn Sampler) -> f64
    where
        P: Fn(&Vec3) -> f64,
    {
        let mut acc = 0.0;
        for _ in 0..N {
            let dir = sample_hemisphere(&sampler.next2d());
            acc += pdf(&dir) / pdf_hemisphere(&dir);
        }
        acc / f64::from(N)
    }

    /// Same idea for planar pdfs supported within `[-1, 1]^2`, proposal is
    /// the uniform distribution over that square (area 4).
    fn pdf_integral_over_square<P>(pdf: P, sampler: &mut dyn Sampler) -> f64
    where
        P: Fn(&Vec2) -> f64,
    {
        let mut acc = 0.0;
        for _ in 0..N {
            let s = sampler.next2d();
            let p = Vec2::new(2.0 * s.x - 1.0, 2.0 * s.y - 1.0);
            acc += pdf(&p) * 4.0;
        }
        acc / f64::from(N)
    }

    #[test]
    fn spherical_pdf_integrates_to_one() {
        let mut sampler = Independent::new(1);
        let integral = pdf_integral_over_sphere(pdf_spherical, &mut sampler);
        assert!((integral - 1.0).abs() < 0.02, "integral={integral}");
    }

    #[test]
    fn hemisphere_pdf_integrates_to_one() {
        let mut sampler = Independent::new(1);
        let integral = pdf_integral_over_hemisphere(pdf_hemisphere, &mut sampler);
        assert!((integral - 1.0).abs() < 0.02, "integral={integral}");
    }

    #[test]
    fn cosine_hemisphere_pdf_integrates_to_one() {
        let mut sampler = Independent::new(1);
        let integral = pdf_integral_over_hemisphere(pdf_cosine_hemisphere, &mut sampler);
        assert!((integral - 1.0).abs() < 0.02, "integral={integral}");
    }

    #[test]
    fn uniform_disk_pdf_integrates_to_one() {
        let mut sampler = Independent::new(1);
        let integral = pdf_integral_over_square(pdf_uniform_disk, &mut sampler);
        assert!((integral - 1.0).abs() < 0.02, "integral={integral}");
    }

    #[test]
    fn tent_pdf_integrates_to_one() {
        let mut sampler = Independent::new(1);
        let integral = pdf_integral_over_square(pdf_tent, &mut sampler);
        assert!((integral - 1.0).abs() < 0.02, "integral={integral}");
    }

    #[test]
    fn beckmann_and_ggx_pdfs_integrate_to_one() {
        let mut sampler = Independent::new(1);
        for alpha in [0.3, 0.6, 0.9] {
            let beckmann = pdf_integral_over_hemisphere(|m| pdf_beckmann(m, alpha), &mut sampler);
            assert!(
                (beckmann - 1.0).abs() < 0.1,
                "beckmann alpha={alpha} integral={beckmann}"
            );

            let ggx = pdf_integral_over_hemisphere(|m| pdf_ggx(m, alpha), &mut sampler);
            assert!((ggx - 1.0).abs() < 0.1, "ggx alpha={alpha} integral={ggx}");
        }
    }

    /// Sampling/pdf consistency: for each warp, the
    /// self-sampled `E[1/pdf(X)]` must equal the measure of the warp's
    /// support domain, independent of how the density is shaped across it.
    #[test]
    fn warps_are_self_consistent_with_their_support_measure() {
        let mut sampler = Independent::new(1);

        let mut measure_of = |n: u32, sample: &dyn Fn(&Vec2) -> Vec3, pdf: &dyn Fn(&Vec3) -> f64| {
            let mut acc = 0.0;
            for _ in 0..n {
                let d = sample(&sampler.next2d());
                let p = pdf(&d);
                if p > 0.0 {
                    acc += 1.0 / p;
                }
            }
            acc / f64::from(n)
        };

        let sphere = measure_of(N, &sample_spherical, &pdf_spherical);
        assert!((sphere - 4.0 * f64::consts::PI).abs() < 0.2, "sphere={sphere}");

        let hemi = measure_of(N, &sample_hemisphere, &pdf_hemisphere);
        assert!((hemi - 2.0 * f64::consts::PI).abs() < 0.1, "hemisphere={hemi}");

        let cos_hemi = measure_of(N, &sample_cosine_hemisphere, &pdf_cosine_hemisphere);
        assert!((cos_hemi - 2.0 * f64::consts::PI).abs() < 0.1, "cosine={cos_hemi}");
    }

    #[test]
    fn hash2_is_deterministic_and_spreads_across_unit_interval() {
        let a = hash2(Vec2::new(3.0, 7.0));
        let b = hash2(Vec2::new(3.0, 7.0));
        assert_eq!(a, b);
        assert!((0.0..1.0).contains(&a));
        assert_ne!(a, hash2(Vec2::new(3.0, 8.0)));
    }
}
