//! Small helpers for pulling typed values out of a parsed `tinyjson` scene
//! description, with defaults for every optional field.

use std::collections::HashMap;

use tinyjson::JsonValue;

use crate::vec::{Mat4, Vec2, Vec2i, Vec3};

#[must_use]
pub fn json_to_f64(json: &HashMap<String, JsonValue>, name: &str, default: f64) -> f64 {
    json.get(name)
        .and_then(JsonValue::get::<f64>)
        .copied()
        .unwrap_or(default)
}

#[must_use]
pub fn json_to_bool(json: &HashMap<String, JsonValue>, name: &str, default: bool) -> bool {
    json.get(name)
        .and_then(JsonValue::get::<bool>)
        .copied()
        .unwrap_or(default)
}

#[must_use]
pub fn json_to_string(json: &HashMap<String, JsonValue>, name: &str, default: &str) -> String {
    json.get(name)
        .and_then(JsonValue::get::<String>)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn json_to_f64_array(json: &HashMap<String, JsonValue>, name: &str) -> Option<Vec<f64>> {
    let values: &Vec<JsonValue> = json.get(name)?.get()?;
    values.iter().map(|v| v.get::<f64>().copied()).collect()
}

#[must_use]
pub fn json_to_vec2(json: &HashMap<String, JsonValue>, name: &str, default: Vec2) -> Vec2 {
    json_to_f64_array(json, name).map_or(default, |v| Vec2::new(v[0], v[1]))
}

#[must_use]
pub fn json_to_vec2i(json: &HashMap<String, JsonValue>, name: &str, default: Vec2i) -> Vec2i {
    json_to_f64_array(json, name)
        .map_or(default, |v| Vec2i::new(v[0] as i32, v[1] as i32))
}

#[must_use]
pub fn json_to_vec3(json: &HashMap<String, JsonValue>, name: &str, default: Vec3) -> Vec3 {
    json_to_f64_array(json, name).map_or(default, |v| Vec3::new(v[0], v[1], v[2]))
}

#[must_use]
pub fn json_to_vec3s(json: &HashMap<String, JsonValue>, name: &str) -> Vec<Vec3> {
    let Some(values) = json.get(name).and_then(|v| v.get::<Vec<JsonValue>>()) else {
        return Vec::new();
    };
    values
        .iter()
        .filter_map(|v| {
            let arr: &Vec<JsonValue> = v.get()?;
            Some(Vec3::new(
                *arr[0].get::<f64>()?,
                *arr[1].get::<f64>()?,
                *arr[2].get::<f64>()?,
            ))
        })
        .collect()
}

/// Same as `json_to_vec3s` but over a raw array already pulled out of the
/// JSON tree, for schemas that place the array at the top level of the
/// object rather than behind a named field (e.g. inline triangle shapes).
#[must_use]
pub fn raw_array_to_vec3s(values: &[JsonValue]) -> Option<Vec<Vec3>> {
    values
        .iter()
        .map(|v| {
            let arr: &Vec<JsonValue> = v.get()?;
            Some(Vec3::new(
                *arr[0].get::<f64>()?,
                *arr[1].get::<f64>()?,
                *arr[2].get::<f64>()?,
            ))
        })
        .collect()
}

/// Row-major 4x4, matching the `toWorld` scene field convention.
#[must_use]
pub fn json_to_mat4(json: &HashMap<String, JsonValue>, name: &str) -> Option<Mat4> {
    let values = json_to_f64_array(json, name)?;
    assert!(values.len() == 16, "toWorld matrix must have 16 entries");
    Some(Mat4::new(
        values[0], values[4], values[8], values[12], values[1], values[5], values[9],
        values[13], values[2], values[6], values[10], values[14], values[3], values[7],
        values[11], values[15],
    ))
}

/// Recursively merge `patch` into `base` (objects merge key-wise, everything
/// else is replaced outright). Used by the CLI to layer an `--additional`
/// scene fragment on top of the main scene file.
pub fn merge_json(base: &mut JsonValue, patch: &JsonValue) -> crate::Result<()> {
    match (base, patch) {
        (JsonValue::Object(base_obj), JsonValue::Object(patch_obj)) => {
            for (k, v) in patch_obj {
                match base_obj.get_mut(k) {
                    Some(existing) => merge_json(existing, v)?,
                    None => {
                        base_obj.insert(k.clone(), v.clone());
                    }
                }
            }
            Ok(())
        }
        (base, patch) => {
            *base = patch.clone();
            Ok(())
        }
    }
}
