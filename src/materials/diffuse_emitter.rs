use std::collections::HashMap;

use tinyjson::JsonValue;

use crate::{
    materials::SampledDirection,
    texture::{Texture, json_to_texture},
    vec::{Color3, Point3, Vec2, Vec3},
};

use super::Material;

pub struct DiffuseEmit {
    radiance: Texture<Color3>,
}

impl DiffuseEmit {
    #[must_use]
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        let radiance = json_to_texture(json, "radiance", Vec3::new(1.0, 1.0, 1.0));
        Self { radiance }
    }
}

impl Material for DiffuseEmit {
    fn sample(&self, _wo: &Vec3, _uv: &Vec2, _p: &Point3, _s: &Vec2) -> Option<SampledDirection> {
        None
    }

    fn evaluate(&self, _wo: &Vec3, _wi: &Vec3, _uv: &Vec2, _p: &Point3) -> Color3 {
        panic!("Should not call evaluate on DiffuseEmit material");
    }

    fn pdf(&self, _wo: &Vec3, _wi: &Vec3, _uv: &Vec2, _p: &Point3) -> f64 {
        panic!("Should not call pdf on DiffuseEmit material");
    }

    fn have_delta(&self) -> bool {
        false
    }

    fn emission(&self, wo: &Vec3, uv: &Vec2, p: &Point3) -> Color3 {
        if wo.z > 0.0 {
            self.radiance.get(uv, p)
        } else {
            Color3::new(0.0, 0.0, 0.0)
        }
    }

    fn have_emission(&self) -> bool {
        true
    }
}
