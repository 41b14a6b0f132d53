use std::collections::HashMap;

use cgmath::Zero;
use tinyjson::JsonValue;

use crate::{
    fresnel,
    json::json_to_f64,
    vec::{Color3, Point3, Vec2, Vec3},
};

use super::{Material, SampledDirection};

/// Ideal (smooth) dielectric: refracts or reflects with probability given by
/// the exact Fresnel term, never both. A delta BSDF — `evaluate`/`pdf` are
/// zero everywhere since there is no continuous density to speak of.
pub struct Dielectric {
    int_ior: f64,
    ext_ior: f64,
}

impl Dielectric {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        Self {
            int_ior: json_to_f64(json, "intIOR", 1.5046),
            ext_ior: json_to_f64(json, "extIOR", 1.000_277),
        }
    }
}

impl Material for Dielectric {
    fn sample(&self, wo: &Vec3, _uv: &Vec2, _p: &Point3, s: &Vec2) -> Option<SampledDirection> {
        let cos_theta_i = wo.z;
        let r = fresnel(cos_theta_i, self.ext_ior, self.int_ior);

        if s.x <= r {
            let wi = Vec3::new(-wo.x, -wo.y, wo.z);
            return Some(SampledDirection {
                weight: Color3::from_value(1.0),
                wi,
                eta: 1.0,
            });
        }

        let (eta_i, eta_t, n_z, cos_theta_i) = if cos_theta_i > 0.0 {
            (self.ext_ior, self.int_ior, 1.0, cos_theta_i)
        } else {
            (self.int_ior, self.ext_ior, -1.0, -cos_theta_i)
        };
        let eta = eta_i / eta_t;
        let sin_theta_t_sqr = eta * eta * cos_theta_i.mul_add(-cos_theta_i, 1.0);
        // `bRec.eta` is reported as eta_into/eta_from (SPEC_FULL.md SS4.3), the
        // reciprocal of the `eta_i/eta_t` ratio used above for Snell's law.
        let eta_record = eta_t / eta_i;

        if sin_theta_t_sqr >= 1.0 {
            // Total internal reflection. Unreachable in practice since `fresnel`
            // already returns 1.0 in this regime, but guarded here too.
            let wi = Vec3::new(-wo.x, -wo.y, wo.z);
            return Some(SampledDirection {
                weight: Color3::from_value(1.0),
                wi,
                eta: 1.0,
            });
        }

        let cos_theta_t = (1.0 - sin_theta_t_sqr).sqrt();
        let normal = Vec3::new(0.0, 0.0, n_z);
        let wi = -eta * *wo + (eta * cos_theta_i - cos_theta_t) * normal;

        Some(SampledDirection {
            weight: Color3::from_value(1.0),
            wi,
            eta: eta_record,
        })
    }

    fn evaluate(&self, _wo: &Vec3, _wi: &Vec3, _uv: &Vec2, _p: &Point3) -> Color3 {
        Color3::zero()
    }

    fn pdf(&self, _wo: &Vec3, _wi: &Vec3, _uv: &Vec2, _p: &Point3) -> f64 {
        0.0
    }

    fn have_delta(&self) -> bool {
        true
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
    use cgmath::{EuclideanSpace, InnerSpace};

    use super::*;

    fn schlick(cos_theta_i: f64, eta_i: f64, eta_t: f64) -> f64 {
        let r0 = ((eta_i - eta_t) / (eta_i + eta_t)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos_theta_i).powi(5)
    }

    #[test]
    fn fresnel_matches_schlick_near_normal_incidence() {
        let (eta_i, eta_t) = (1.000_277, 1.5046);
        for cos_theta_i in [1.0, 0.95, 0.9, 0.8] {
            let exact = fresnel(cos_theta_i, eta_i, eta_t);
            let approx = schlick(cos_theta_i, eta_i, eta_t);
            assert!(
                (exact - approx).abs() < 0.02,
                "cos_theta_i={cos_theta_i} exact={exact} schlick={approx}"
            );
        }
    }

    #[test]
    fn sample_is_delta_with_zero_evaluate_and_pdf() {
        let bsdf = Dielectric {
            int_ior: 1.5046,
            ext_ior: 1.000_277,
        };
        assert!(bsdf.have_delta());
        let wo = Vec3::new(0.0, 0.0, 1.0);
        let wi = Vec3::new(0.3, 0.1, 0.9).normalize();
        assert_eq!(bsdf.evaluate(&wo, &wi, &Vec2::zero(), &Point3::origin()), Color3::zero());
        assert_eq!(bsdf.pdf(&wo, &wi, &Vec2::zero(), &Point3::origin()), 0.0);
    }

    #[test]
    fn reflection_branch_is_the_mirror_direction() {
        let bsdf = Dielectric {
            int_ior: 1.5046,
            ext_ior: 1.000_277,
        };
        let wo = Vec3::new(0.3, -0.2, 0.9).normalize();
        // s.x = 0.0 always falls in the reflection branch (r >= 0 always holds).
        let sampled = bsdf
            .sample(&wo, &Vec2::zero(), &Point3::origin(), &Vec2::new(0.0, 0.0))
            .unwrap();
        assert!((sampled.wi.x + wo.x).abs() < 1e-12);
        assert!((sampled.wi.y + wo.y).abs() < 1e-12);
        assert!((sampled.wi.z - wo.z).abs() < 1e-12);
    }

    #[test]
    fn refraction_branch_obeys_snells_law() {
        let bsdf = Dielectric {
            int_ior: 1.5046,
            ext_ior: 1.000_277,
        };
        let wo = Vec3::new(0.3, 0.0, (1.0 - 0.3 * 0.3f64).sqrt());
        // s.x = 1.0 always falls in the refraction branch (r < 1 away from grazing).
        let sampled = bsdf
            .sample(&wo, &Vec2::zero(), &Point3::origin(), &Vec2::new(1.0, 0.0))
            .unwrap();

        let sin_theta_i = (1.0 - wo.z * wo.z).sqrt();
        let sin_theta_t = (sampled.wi.x * sampled.wi.x + sampled.wi.y * sampled.wi.y).sqrt();
        let lhs = bsdf.ext_ior * sin_theta_i;
        let rhs = bsdf.int_ior * sin_theta_t;
        assert!((lhs - rhs).abs() < 1e-9, "lhs={lhs} rhs={rhs}");
        assert!(sampled.wi.z < 0.0, "refracted ray should cross to the other side");
    }
}
