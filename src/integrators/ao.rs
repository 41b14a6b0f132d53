use std::collections::HashMap;

use cgmath::{Array, Zero};
use tinyjson::JsonValue;

use crate::{
    array2d::Array2d,
    constants::INV_PI,
    json::json_to_f64,
    ray::Ray,
    samplers::{Sampler, sample_cosine_hemisphere},
    scene::Scene,
    vec::{Color3, Frame},
};

use super::{Integrator, SamplerIntegrator, render};

/// Ambient occlusion: one cosine-weighted hemisphere sample per hit, counted
/// as occluded or not against a ray of finite or infinite reach.
pub struct AoIntegrator {
    ray_length: f64,
}

impl AoIntegrator {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        Self {
            ray_length: json_to_f64(json, "ray_length", f64::INFINITY),
        }
    }
}

impl Integrator for AoIntegrator {
    fn render(&mut self, scene: &Scene, sampler: &mut dyn Sampler) -> Array2d<Color3> {
        render(self, scene, sampler)
    }
}

impl SamplerIntegrator for AoIntegrator {
    fn preprocess(&mut self, _: &Scene, _: &mut dyn Sampler) {}

    fn li(&self, ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> Color3 {
        let Some(intersection) = scene.hit(ray) else {
            return Color3::zero();
        };

        let frame = Frame::new(&intersection.n);
        let wi = sample_cosine_hemisphere(&sampler.next2d());
        let ao_ray =
            Ray::new(&intersection.p, &frame.to_world(&wi)).with_distance_max(self.ray_length);

        if scene.hit(&ao_ray).is_some() {
            Color3::zero()
        } else {
            Color3::from_value(wi.z.abs() * INV_PI)
        }
    }
}
