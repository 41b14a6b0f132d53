#![allow(clippy::cast_sign_loss)]

use std::collections::HashMap;

use cgmath::{EuclideanSpace, InnerSpace, SquareMatrix};
use tinyjson::JsonValue;

use crate::{
    deg2rad,
    json::{json_to_f64, json_to_mat4, json_to_vec2i},
    ray::Ray,
    samplers::Sampler,
    transform::MyTransform,
    vec::{Mat4, Point3, Vec2, Vec2i, Vec2u},
};

/// Perspective camera. Rays are generated by unprojecting a sample position
/// through the inverse of the `sampleToCamera` projection -- same
/// construction as the reference source's `PerspectiveCamera::sampleRay`
/// (clip-space perspective matrix, then translate/scale into `[0,1]^2` and
/// invert), rather than a hand-built viewport-vector basis.
#[derive(Debug)]
pub struct CameraPerspective {
    pub resolution: Vec2u,
    pub transform: MyTransform,
    pub near_clip: f64,
    pub far_clip: f64,
    sample_to_camera: Mat4,
}

impl CameraPerspective {
    pub fn from_json(json: &HashMap<String, JsonValue>) -> Self {
        let transform =
            MyTransform::new(json_to_mat4(json, "toWorld").unwrap_or_else(Mat4::identity));
        let output_size = json_to_vec2i(json, "outputSize", Vec2i::new(512, 512));
        let resolution = Vec2u::new(output_size.x as u32, output_size.y as u32);
        let aspect = f64::from(output_size.x) / f64::from(output_size.y);

        let fov = json_to_f64(json, "fov", 30.0);
        let near_clip = json_to_f64(json, "nearClip", 1e-4);
        let far_clip = json_to_f64(json, "farClip", 1e4);
        // `rfilter` names a reconstruction filter; accepted for interop and
        // otherwise ignored -- filtering is an image-accumulation concern
        // outside this core, which always reconstructs with a box filter.

        let sample_to_camera = perspective_camera_matrix(fov, near_clip, far_clip, aspect);

        Self {
            resolution,
            transform,
            near_clip,
            far_clip,
            sample_to_camera,
        }
    }

    pub fn generate_ray(&self, pos_img: &Vec2, _sampler: &mut dyn Sampler) -> Ray {
        let near_p = Point3::from_homogeneous(
            self.sample_to_camera
                * crate::vec::Vec4::new(
                    pos_img.x / f64::from(self.resolution.x),
                    pos_img.y / f64::from(self.resolution.y),
                    0.0,
                    1.0,
                ),
        );
        let d = (near_p - Point3::origin()).normalize();
        let inv_z = 1.0 / d.z;

        Ray::new(
            &self.transform.point(&Point3::origin()),
            &self.transform.vector(&d),
        )
        .with_range(self.near_clip * inv_z, self.far_clip * inv_z)
    }

    pub fn scale(&mut self, factor: f32) {
        self.resolution.x = ((self.resolution.x as f32) * factor) as u32;
        self.resolution.y = ((self.resolution.y as f32) * factor) as u32;
    }
}

/// Builds the inverse-projection matrix mapping a normalized sample position
/// `(x, y) \in [0,1]^2` at `z = 0` to a point on the near-clip plane in
/// camera space, following the reference source's `activate()`.
fn perspective_camera_matrix(fov: f64, near_clip: f64, far_clip: f64, aspect: f64) -> Mat4 {
    let recip = 1.0 / (far_clip - near_clip);
    let cot = 1.0 / deg2rad(fov / 2.0).tan();

    #[rustfmt::skip]
    let perspective = Mat4::new(
        cot, 0.0, 0.0, 0.0,
        0.0, cot, 0.0, 0.0,
        0.0, 0.0, far_clip * recip, 1.0,
        0.0, 0.0, -near_clip * far_clip * recip, 0.0,
    );

    let scale_translate = Mat4::new(
        -0.5, 0.0, 0.0, 0.0,
        0.0, -0.5 * aspect, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.5, 0.5, 0.0, 1.0,
    );

    (scale_translate * perspective).invert().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_sample_points_down_the_forward_axis() {
        let m = perspective_camera_matrix(30.0, 1e-4, 1e4, 1.0);
        let p = Point3::from_homogeneous(m * crate::vec::Vec4::new(0.5, 0.5, 0.0, 1.0));
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert!(p.z > 0.0);
    }
}
