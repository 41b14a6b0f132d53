use std::{collections::HashMap, sync::Arc};

use cgmath::Array;
use tinyjson::JsonValue;

use crate::vec::{Color3, Point3, Vec2, Vec3};

pub struct SampledDirection {
    pub weight: Color3,
    pub wi: Vec3,
    /// Ratio of indices of refraction (transmitted/incident) crossed by this
    /// sample. `1.0` for everything except a refracted dielectric sample;
    /// radiance carried across a non-symmetric boundary scales as `eta^2`
    /// (used by path integrators to correct throughput under Russian roulette).
    pub eta: f64,
}

pub trait Material: Send + Sync {
    fn sample(&self, wo: &Vec3, uv: &Vec2, p: &Point3, s: &Vec2) -> Option<SampledDirection>;
    fn evaluate(&self, wo: &Vec3, wi: &Vec3, uv: &Vec2, p: &Point3) -> Color3;
    fn pdf(&self, wo: &Vec3, wi: &Vec3, uv: &Vec2, p: &Point3) -> f64;
    fn have_delta(&self) -> bool;
    fn emission(&self, wo: &Vec3, uv: &Vec2, p: &Point3) -> Color3;
    fn have_emission(&self) -> bool;
    fn get_albedo(&self, _uv: &Vec2, _p: &Point3) -> Color3 {
        Color3::from_value(1.0)
    }
}

pub mod dielectric;
pub mod diffuse;
pub mod diffuse_emitter;
pub mod microfacet;

#[must_use]
pub fn json_to_material(json: &HashMap<String, JsonValue>) -> Arc<dyn Material> {
    assert!(
        json.contains_key("type"),
        "Need to specify 'type' variable to create the material.\n{json:?}."
    );

    let t: String = json["type"].clone().try_into().unwrap();
    match t.as_str() {
        "diffuse" => Arc::new(diffuse::Diffuse::from_json(json)),
        "dielectric" => Arc::new(dielectric::Dielectric::from_json(json)),
        "microfacet" => Arc::new(microfacet::Microfacet::from_json(json)),
        "area" => Arc::new(diffuse_emitter::DiffuseEmit::from_json(json)),
        _ => unimplemented!("Unknown material type: {t}"),
    }
}

