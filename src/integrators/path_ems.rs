use std::collections::HashMap;

use cgmath::{Array, ElementWise, InnerSpace, Zero};
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

/// Next-event-estimation-only path tracer: every non-delta vertex samples a
/// light explicitly. A surface's own emission is only counted when it is
/// reached through a delta bounce -- otherwise the previous vertex's NEE
/// sample already accounted for it, and adding it again would double-count.
pub struct PathEmsIntegrator {
    max_depth: usize,
}

impl PathEmsIntegrator {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        Self {
            max_depth: json_to_f64(json, "max_depth", 100.0) as usize,
        }
    }
}

impl Integrator for PathEmsIntegrator {
    fn render(&mut self, scene: &Scene, sampler: &mut dyn Sampler) -> Array2d<Color3> {
        render(self, scene, sampler)
    }
}

impl SamplerIntegrator for PathEmsIntegrator {
    fn preprocess(&mut self, _: &Scene, _: &mut dyn Sampler) {}

    fn li(&self, ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> Color3 {
        let mut result = Color3::zero();
        let mut beta = Color3::from_value(1.0);
        let mut eta = 1.0f64;
        let mut ray = *ray;
        // The camera ray counts as a delta bounce: a light hit by the
        // primary ray was not reachable via NEE and must be counted.
        let mut previous_delta = true;

        for depth in 0..self.max_depth {
            let Some(intersection) = scene.hit(&ray) else {
                result += beta.mul_element_wise(scene.background(ray.d));
                break;
            };

            let frame = Frame::new(&intersection.n);
            let dir_local = frame.to_local(&-ray.d);

            if intersection.material.have_emission() {
                if previous_delta {
                    result += beta.mul_element_wise(intersection.material.emission(
                        &dir_local,
                        &intersection.uv,
                        &intersection.p,
                    ));
                }
                break;
            }

            if depth >= 3 {
                let q = (beta.x.max(beta.y).max(beta.z) * eta * eta).min(0.99);
                if sampler.next() > q {
                    break;
                }
                beta = beta / q;
            }

            if !intersection.material.have_delta() {
                let (es, shape) = scene.sample_direct(&intersection.p, &sampler.next2d());
                if es.pdf > 0.0 && scene.visible(&intersection.p, &es.y) {
                    let wi_world = (es.y - intersection.p).normalize();
                    let wi_local = frame.to_local(&wi_world);
                    let frame_light = Frame::new(&es.n);

                    let l_light = shape.material().emission(
                        &frame_light.to_local(&-wi_world),
                        &intersection.uv,
                        &intersection.p,
                    );
                    let f = intersection.material.evaluate(
                        &dir_local,
                        &wi_local,
                        &intersection.uv,
                        &intersection.p,
                    );
                    result += beta.mul_element_wise(f.mul_element_wise(l_light)) / es.pdf;
                }
            }

            let Some(sampled) = intersection.material.sample(
                &dir_local,
                &intersection.uv,
                &intersection.p,
                &sampler.next2d(),
            ) else {
                break;
            };

            previous_delta = intersection.material.have_delta();
            beta = beta.mul_element_wise(sampled.weight);
            eta *= sampled.eta;
            ray = Ray::new(&intersection.p, &frame.to_world(&sampled.wi));
        }

        result
    }
}
