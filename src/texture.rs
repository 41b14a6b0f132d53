use std::collections::HashMap;

use cgmath::Array;
use tinyjson::JsonValue;

use crate::vec::{Color3, Point3, Vec2};

/// A material input evaluated per shading point. The only spectral
/// distribution (reconstruction filters, mip-mapped image maps, procedural
/// noise) this core carries is a flat constant -- the ambient renderer this
/// core is extracted from owns the rest.
pub enum Texture<T: Clone> {
    Constant(T),
}

impl<T: Clone + Copy> Texture<T> {
    pub fn get(&self, _uv: &Vec2, _p: &Point3) -> T {
        match self {
            Self::Constant(c) => *c,
        }
    }
}

pub fn json_to_texture(
    json: &HashMap<String, JsonValue>,
    name: &str,
    default: Color3,
) -> Texture<Color3> {
    if !json.contains_key(name) {
        return Texture::Constant(default);
    }

    match &json[name] {
        JsonValue::Object(o) => {
            let values: Vec<f64> = o["value"]
                .get::<Vec<JsonValue>>()
                .unwrap()
                .iter()
                .map(|v| *v.get().unwrap())
                .collect();
            Texture::Constant(Color3::new(values[0], values[1], values[2]))
        }
        JsonValue::Number(v) => Texture::Constant(Color3::from_value(*v)),
        JsonValue::Array(v) => Texture::Constant(Color3::new(
            *v[0].get().unwrap(),
            *v[1].get().unwrap(),
            *v[2].get().unwrap(),
        )),
        _ => panic!("Invalid texture: only a constant value is supported"),
    }
}
