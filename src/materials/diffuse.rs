use std::{collections::HashMap, f64};

use cgmath::{InnerSpace, Zero};
use tinyjson::JsonValue;

use crate::{
    samplers::{pdf_cosine_hemisphere, sample_cosine_hemisphere},
    texture::{Texture, json_to_texture},
    vec::{Color3, Point3, Vec2, Vec3},
};

use super::{Material, SampledDirection};

pub struct Diffuse {
    albedo: Texture<Color3>,
}

impl Diffuse {
    #[must_use]
    pub const fn new(albedo: Texture<Color3>) -> Self {
        Self { albedo }
    }

    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        let albedo = json_to_texture(json, "albedo", Vec3::new(0.8, 0.8, 0.8));
        Self { albedo }
    }
}

impl Material for Diffuse {
    fn sample(&self, wo: &Vec3, uv: &Vec2, p: &Point3, s: &Vec2) -> Option<SampledDirection> {
        if wo.z < 0.0 {
            return None;
        }

        let wi = sample_cosine_hemisphere(s);

        Some(SampledDirection {
            weight: self.albedo.get(uv, p),
            wi: wi.normalize(),
            eta: 1.0,
        })
    }

    fn evaluate(&self, wo: &Vec3, wi: &Vec3, uv: &Vec2, p: &Point3) -> Color3 {
        self.albedo.get(uv, p) * self.pdf(wo, wi, uv, p)
    }

    fn pdf(&self, _wo: &Vec3, wi: &Vec3, _uv: &Vec2, _p: &Point3) -> f64 {
        pdf_cosine_hemisphere(wi)
    }

    fn have_delta(&self) -> bool {
        false
    }

    fn emission(&self, _: &Vec3, _uv: &Vec2, _p: &Point3) -> Color3 {
        Color3::zero()
    }

    fn have_emission(&self) -> bool {
        false
    }

    fn get_albedo(&self, uv: &Vec2, p: &Point3) -> Color3 {
        self.albedo.get(uv, p)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::EuclideanSpace;

    use super::*;
    use crate::samplers::{Sampler, independent::Independent};

    #[test]
    fn sample_weight_is_the_constant_albedo() {
        let bsdf = Diffuse::new(Texture::Constant(Color3::new(0.2, 0.4, 0.6)));
        let mut sampler = Independent::new(1);
        let wo = Vec3::new(0.0, 0.0, 1.0);
        let sampled = bsdf
            .sample(&wo, &Vec2::zero(), &Point3::origin(), &sampler.next2d())
            .unwrap();
        assert_eq!(sampled.weight, Color3::new(0.2, 0.4, 0.6));
        assert_eq!(sampled.eta, 1.0);
    }

    #[test]
    fn evaluate_equals_albedo_times_cosine_pdf() {
        let bsdf = Diffuse::new(Texture::Constant(Color3::new(0.8, 0.8, 0.8)));
        let wo = Vec3::new(0.0, 0.0, 1.0);
        let wi = Vec3::new(0.1, 0.2, 0.9).normalize();
        let expected = Color3::new(0.8, 0.8, 0.8) * bsdf.pdf(&wo, &wi, &Vec2::zero(), &Point3::origin());
        assert_eq!(
            bsdf.evaluate(&wo, &wi, &Vec2::zero(), &Point3::origin()),
            expected
        );
    }

    #[test]
    fn below_horizon_request_yields_no_sample() {
        let bsdf = Diffuse::new(Texture::Constant(Color3::new(0.5, 0.5, 0.5)));
        let wo = Vec3::new(0.0, 0.0, -1.0);
        assert!(
            bsdf.sample(&wo, &Vec2::zero(), &Point3::origin(), &Vec2::new(0.5, 0.5))
                .is_none()
        );
    }
}
