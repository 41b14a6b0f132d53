use std::collections::HashMap;

use cgmath::{Array, InnerSpace, Zero};
use tinyjson::JsonValue;

use crate::{
    constants::INV_PI,
    fresnel,
    json::{json_to_f64, json_to_string},
    samplers::{
        pdf_beckmann, pdf_cosine_hemisphere, pdf_ggx, sample_beckmann, sample_cosine_hemisphere,
        sample_ggx,
    },
    texture::{Texture, json_to_texture},
    vec::{Color3, Point3, Vec2, Vec3, reflect},
};

use super::{Material, SampledDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Beckmann,
    Ggx,
}

/// Cook-Torrance microfacet BSDF: a diffuse `kd` lobe plus a specular lobe
/// built on either a Beckmann or GGX normal distribution, weighted by a
/// scalar `ks` derived from `kd`'s energy so the two lobes stay
/// (approximately) energy conserving.
pub struct Microfacet {
    alpha: f64,
    int_ior: f64,
    ext_ior: f64,
    kd: Texture<Color3>,
    ks: f64,
    distribution: Distribution,
}

impl Microfacet {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        let alpha = json_to_f64(json, "alpha", 0.1);
        let int_ior = json_to_f64(json, "intIOR", 1.5046);
        let ext_ior = json_to_f64(json, "extIOR", 1.000_277);
        let kd = json_to_texture(json, "kd", Vec3::new(0.5, 0.5, 0.5));
        let kd_ref = kd.get(&Vec2::new(0.0, 0.0), &Point3::new(0.0, 0.0, 0.0));
        let ks = 1.0 - kd_ref.x.max(kd_ref.y).max(kd_ref.z);
        let distribution = match json_to_string(json, "distribution", "beckmann").as_str() {
            "ggx" => Distribution::Ggx,
            _ => Distribution::Beckmann,
        };

        Self {
            alpha,
            int_ior,
            ext_ior,
            kd,
            ks,
            distribution,
        }
    }

    fn sample_normal(&self, sample: &Vec2) -> Vec3 {
        match self.distribution {
            Distribution::Beckmann => sample_beckmann(sample, self.alpha),
            Distribution::Ggx => sample_ggx(sample, self.alpha),
        }
    }

    fn pdf_normal(&self, m: &Vec3) -> f64 {
        match self.distribution {
            Distribution::Beckmann => pdf_beckmann(m, self.alpha),
            Distribution::Ggx => pdf_ggx(m, self.alpha),
        }
    }

    /// Smith shadowing-masking term for a single direction.
    fn g1(&self, v: &Vec3, m: &Vec3) -> f64 {
        if v.dot(*m) * v.z <= 0.0 {
            return 0.0;
        }
        let cos_theta_v = v.z;
        if cos_theta_v >= 1.0 {
            return 1.0;
        }
        let tan_theta_v = (1.0 - cos_theta_v * cos_theta_v).max(0.0).sqrt() / cos_theta_v;
        if tan_theta_v == 0.0 {
            return 1.0;
        }
        match self.distribution {
            Distribution::Beckmann => {
                let b = 1.0 / (self.alpha * tan_theta_v.abs());
                if b < 1.6 {
                    (3.535 * b + 2.181 * b * b) / (1.0 + 2.276 * b + 2.577 * b * b)
                } else {
                    1.0
                }
            }
            Distribution::Ggx => {
                let alpha2_tan2 = self.alpha * self.alpha * tan_theta_v * tan_theta_v;
                2.0 / (1.0 + (1.0 + alpha2_tan2).sqrt())
            }
        }
    }
}

impl Material for Microfacet {
    fn sample(&self, wo: &Vec3, uv: &Vec2, p: &Point3, s: &Vec2) -> Option<SampledDirection> {
        if wo.z <= 0.0 {
            return None;
        }

        let wi = if s.x < self.ks {
            let remapped = Vec2::new(s.x / self.ks, s.y);
            let m = self.sample_normal(&remapped);
            reflect(wo, &m)
        } else {
            let remapped = Vec2::new((s.x - self.ks) / (1.0 - self.ks), s.y);
            sample_cosine_hemisphere(&remapped)
        };

        if wi.z <= 0.0 {
            return None;
        }

        let pdf_val = self.pdf(wo, &wi, uv, p);
        if pdf_val <= 0.0 {
            return None;
        }

        let weight = self.evaluate(wo, &wi, uv, p) / pdf_val;
        Some(SampledDirection {
            weight,
            wi,
            eta: 1.0,
        })
    }

    fn evaluate(&self, wo: &Vec3, wi: &Vec3, uv: &Vec2, p: &Point3) -> Color3 {
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return Color3::zero();
        }
        let wh = (wo + wi).normalize();
        let d = self.pdf_normal(&wh) / wh.z;
        let fr = fresnel(wo.dot(wh), self.ext_ior, self.int_ior);
        let g = self.g1(wo, &wh) * self.g1(wi, &wh);
        let specular = fr * d * g / (4.0 * wo.z * wi.z);

        (self.kd.get(uv, p) * INV_PI + Color3::from_value(self.ks * specular)) * wi.z
    }

    fn pdf(&self, wo: &Vec3, wi: &Vec3, _uv: &Vec2, _p: &Point3) -> f64 {
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return 0.0;
        }
        let wh = (wo + wi).normalize();
        let jacobian = 1.0 / (4.0 * wi.dot(wh).abs());
        let pdf_specular = self.pdf_normal(&wh) * jacobian;
        let pdf_diffuse = pdf_cosine_hemisphere(wi);

        self.ks.mul_add(pdf_specular, (1.0 - self.ks) * pdf_diffuse)
    }

    fn have_delta(&self) -> bool {
        false
    }

    fn emission(&self, _wo: &Vec3, _uv: &Vec2, _p: &Point3) -> Color3 {
        Color3::zero()
    }

    fn have_emission(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use cgmath::EuclideanSpace;

    use crate::samplers::{Sampler, independent::Independent, sample_cosine_hemisphere};

    use super::*;

    fn disc(distribution: Distribution, alpha: f64) -> Microfacet {
        Microfacet {
            alpha,
            int_ior: 1.5046,
            ext_ior: 1.000_277,
            kd: Texture::Constant(Color3::from_value(1.0)),
            ks: 0.5,
            distribution,
        }
    }

    #[test]
    fn sample_weight_matches_evaluate_times_cosine_over_pdf() {
        let bsdf = disc(Distribution::Ggx, 0.3);
        let mut sampler = Independent::new(1);
        let wo = Vec3::new(0.0, 0.0, 1.0);
        for _ in 0..256 {
            let s = sampler.next2d();
            if let Some(sampled) = bsdf.sample(&wo, &Vec2::zero(), &Point3::origin(), &s) {
                let expected = bsdf.evaluate(&wo, &sampled.wi, &Vec2::zero(), &Point3::origin())
                    / bsdf.pdf(&wo, &sampled.wi, &Vec2::zero(), &Point3::origin());
                assert!((sampled.weight - expected).magnitude() < 1e-9);
            }
        }
    }

    #[test]
    fn pdf_integrates_to_one_over_the_hemisphere() {
        let mut sampler = Independent::new(1);
        for distribution in [Distribution::Beckmann, Distribution::Ggx] {
            let bsdf = disc(distribution, 0.5);
            let wo = Vec3::new(0.0, 0.0, 1.0);

            let n = 1 << 16;
            let mut acc = 0.0;
            for _ in 0..n {
                let wi = sample_cosine_hemisphere(&sampler.next2d());
                if wi.z <= 0.0 {
                    continue;
                }
                acc += bsdf.pdf(&wo, &wi, &Vec2::zero(), &Point3::origin())
                    / pdf_cosine_hemisphere(&wi);
            }
            let integral = acc / f64::from(n);
            assert!((integral - 1.0).abs() < 0.1, "{distribution:?}: integral={integral}");
        }
    }
}
