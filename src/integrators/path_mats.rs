use std::collections::HashMap;

use cgmath::{Array, ElementWise, Zero};
use tinyjson::JsonValue;

use crate::{
    array2d::Array2d,
    json::json_to_f64,
    ray::Ray,
    samplers::Sampler,
    scene::Scene,
    vec::{Color3, Frame},
};

use super::{Integrator, SamplerIntegrator, render};

/// BSDF-sampling-only path tracer. Light is only found by a ray landing on
/// an emitter; no next-event estimation. The baseline `path_mis` is checked
/// against for unbiasedness.
pub struct PathMatsIntegrator {
    max_depth: usize,
}

impl PathMatsIntegrator {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        Self {
            max_depth: json_to_f64(json, "max_depth", 100.0) as usize,
        }
    }
}

impl Integrator for PathMatsIntegrator {
    fn render(&mut self, scene: &Scene, sampler: &mut dyn Sampler) -> Array2d<Color3> {
        render(self, scene, sampler)
    }
}

impl SamplerIntegrator for PathMatsIntegrator {
    fn preprocess(&mut self, _: &Scene, _: &mut dyn Sampler) {}

    fn li(&self, ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> Color3 {
        let mut result = Color3::zero();
        let mut beta = Color3::from_value(1.0);
        let mut eta = 1.0f64;
        let mut ray = *ray;

        for depth in 0..self.max_depth {
            let Some(intersection) = scene.hit(&ray) else {
                result += beta.mul_element_wise(scene.background(ray.d));
                break;
            };

            let frame = Frame::new(&intersection.n);
            let dir_local = frame.to_local(&-ray.d);

            if intersection.material.have_emission() {
                // The light is a perfect absorber in this estimator: the
                // path terminates the moment it lands on one.
                result += beta.mul_element_wise(intersection.material.emission(
                    &dir_local,
                    &intersection.uv,
                    &intersection.p,
                ));
                break;
            }

            if depth >= 3 {
                let q = (beta.x.max(beta.y).max(beta.z) * eta * eta).min(0.99);
                if sampler.next() > q {
                    break;
                }
                beta = beta / q;
            }

            let Some(sampled) = intersection.material.sample(
                &dir_local,
                &intersection.uv,
                &intersection.p,
                &sampler.next2d(),
            ) else {
                break;
            };

            beta = beta.mul_element_wise(sampled.weight);
            eta *= sampled.eta;
            ray = Ray::new(&intersection.p, &frame.to_world(&sampled.wi));
        }

        result
    }
}
