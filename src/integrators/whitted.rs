use std::collections::HashMap;

use cgmath::{ElementWise, InnerSpace, Zero};
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

/// One next-event-estimation bounce at every diffuse hit; a discrete
/// (delta) surface instead recurses by BSDF sampling, under Russian
/// roulette, until it lands on a non-delta vertex or a light.
pub struct WhittedIntegrator {
    max_depth: usize,
    rr_prob: f64,
}

impl WhittedIntegrator {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        Self {
            max_depth: json_to_f64(json, "max_depth", 100.0) as usize,
            rr_prob: json_to_f64(json, "rr_prob", 0.95),
        }
    }

    fn li_depth(
        &self,
        ray: &Ray,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        depth: usize,
    ) -> Color3 {
        let Some(intersection) = scene.hit(ray) else {
            return scene.background(ray.d);
        };

        let frame = Frame::new(&intersection.n);
        let dir_local = frame.to_local(&-ray.d);

        if intersection.material.have_emission() {
            return intersection.material.emission(
                &dir_local,
                &intersection.uv,
                &intersection.p,
            );
        }

        if intersection.material.have_delta() {
            if depth >= self.max_depth || sampler.next() > self.rr_prob {
                return Color3::zero();
            }

            let Some(sampled) = intersection.material.sample(
                &dir_local,
                &intersection.uv,
                &intersection.p,
                &sampler.next2d(),
            ) else {
                return Color3::zero();
            };

            let next_ray = Ray::new(&intersection.p, &frame.to_world(&sampled.wi));
            return sampled
                .weight
                .mul_element_wise(self.li_depth(&next_ray, scene, sampler, depth + 1))
                / self.rr_prob;
        }

        let (es, shape) = scene.sample_direct(&intersection.p, &sampler.next2d());
        if es.pdf <= 0.0 || !scene.visible(&intersection.p, &es.y) {
            return Color3::zero();
        }

        let wi_world = (es.y - intersection.p).normalize();
        let wi_local = frame.to_local(&wi_world);
        let frame_light = Frame::new(&es.n);

        shape
            .material()
            .emission(
                &frame_light.to_local(&-wi_world),
                &intersection.uv,
                &intersection.p,
            )
            .mul_element_wise(intersection.material.evaluate(
                &dir_local,
                &wi_local,
                &intersection.uv,
                &intersection.p,
            ))
            / es.pdf
    }
}

impl Integrator for WhittedIntegrator {
    fn render(&mut self, scene: &Scene, sampler: &mut dyn Sampler) -> Array2d<Color3> {
        render(self, scene, sampler)
    }
}

impl SamplerIntegrator for WhittedIntegrator {
    fn preprocess(&mut self, _: &Scene, _: &mut dyn Sampler) {}

    fn li(&self, ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> Color3 {
        self.li_depth(ray, scene, sampler, 0)
    }
}
