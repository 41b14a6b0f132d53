use std::collections::HashMap;

use cgmath::{InnerSpace, Zero};
use tinyjson::JsonValue;

use crate::{
    array2d::Array2d,
    constants::M_PI,
    json::json_to_vec3,
    ray::Ray,
    samplers::Sampler,
    scene::Scene,
    vec::{Color3, Point3, Vec3},
};

use super::{Integrator, SamplerIntegrator, render};

/// A single analytic point light with no surface of its own: direct
/// illumination only, gated by a single visibility ray.
pub struct SimpleIntegrator {
    position: Point3,
    energy: Color3,
}

impl SimpleIntegrator {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        let position = json_to_vec3(json, "position", Vec3::zero());
        Self {
            position: Point3::new(position.x, position.y, position.z),
            energy: json_to_vec3(json, "energy", Vec3::new(1.0, 1.0, 1.0)),
        }
    }
}

impl Integrator for SimpleIntegrator {
    fn render(&mut self, scene: &Scene, sampler: &mut dyn Sampler) -> Array2d<Color3> {
        render(self, scene, sampler)
    }
}

impl SamplerIntegrator for SimpleIntegrator {
    fn preprocess(&mut self, _: &Scene, _: &mut dyn Sampler) {}

    fn li(&self, ray: &Ray, scene: &Scene, _sampler: &mut dyn Sampler) -> Color3 {
        let Some(intersection) = scene.hit(ray) else {
            return scene.background(ray.d);
        };

        if !scene.visible(&intersection.p, &self.position) {
            return Color3::zero();
        }

        let d = self.position - intersection.p;
        let r2 = d.magnitude2();
        let l = d.normalize();
        let cos_theta = intersection.n.dot(l).max(0.0);

        self.energy * (cos_theta / (M_PI * M_PI * r2))
    }
}
