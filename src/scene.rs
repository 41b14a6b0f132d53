use std::{collections::HashMap, f64, sync::Arc};

use cgmath::{InnerSpace, Zero};
use log::{info, warn};
use tinyjson::JsonValue;

use crate::{
    Error, NUMBER_TRACED_RAYS, Real, Result,
    array2d::Array2d,
    camera::CameraPerspective,
    image::image_load,
    integrators::{Integrator, json_to_integrator},
    json::{json_to_bool, json_to_string, json_to_vec3},
    materials::{Material, json_to_material},
    ray::Ray,
    samplers::{Sampler, json_to_sampler},
    shapes::{EmitterSample, Intersection, Shape, bvh::BVH, json_to_shape, shape_group::ShapeGroup, triangle::Triangle},
    vec::{Color3, Point3, Vec2, Vec3},
};

pub enum SceneBackground {
    Uniform(Color3),
    Texture(Array2d<Color3>),
}

pub struct Scene {
    pub root: Box<dyn Shape>,
    pub materials: HashMap<String, Arc<dyn Material>>,
    pub camera: CameraPerspective,
    pub background: SceneBackground,
    pub max_depth: usize,
    has_analytic_emitters: bool,
    pub ignore_nans: bool,
}

impl Scene {
    pub fn from_json(
        json: &HashMap<String, JsonValue>,
    ) -> Result<(Self, Box<dyn Sampler>, Box<dyn Integrator>)> {
        // Read the scene to create the camera, materials and shapes
        let background_color = json_to_vec3(json, "background", Vec3::zero());
        let background_tex = json_to_string(json, "background_texture", "");
        let background_tex = if background_tex.is_empty() {
            None
        } else {
            image_load(&background_tex, true).ok()
        };
        let background = background_tex.map_or(SceneBackground::Uniform(background_color), |tex| {
            SceneBackground::Texture(tex)
        });

        // Create camera -- a scene without a camera has nothing to render from
        if !json.contains_key("camera") {
            return Err(Error::AttribNotFound("camera".to_string(), "scene".to_string()));
        }
        let camera = CameraPerspective::from_json(json["camera"].get().unwrap());

        // Create sampler
        let sampler = json_to_sampler(json["sampler"].get().unwrap());

        // Create integrator -- likewise mandatory, no implicit default
        if !json.contains_key("integrator") {
            return Err(Error::AttribNotFound(
                "integrator".to_string(),
                "scene".to_string(),
            ));
        }
        let integrator = json_to_integrator(json["integrator"].get().unwrap());

        // Create all the materials
        let materials = if json.contains_key("materials") {
            let jmats = &json["materials"];
            assert!(
                jmats.is_array(),
                "Materials needs to be specified as an array\n\t{jmats:?}"
            );

            let jmats: &Vec<JsonValue> = jmats.get().unwrap();
            jmats
                .iter()
                .map(|jmat| {
                    assert!(
                        jmat.is_object(),
                        "Material needs to be specified as object\n\t{jmat:?}"
                    );
                    let jmat: &HashMap<_, _> = jmat.get().unwrap();
                    assert!(
                        jmat.contains_key("name"),
                        "Materials need to have a name\n\t{jmat:?}"
                    );
                    let name: String = jmat["name"].get::<String>().unwrap().clone();
                    info!("Create material: {name}");

                    (name, json_to_material(jmat))
                })
                .collect()
        } else {
            HashMap::new()
        };

        let mut root: Box<dyn Shape> = if json.contains_key("accelerator") {
            let json_accel = json["accelerator"].get().unwrap();
            let accel_type_str = json_to_string(json_accel, "type", "linear");
            match accel_type_str.as_str() {
                "linear" => Box::new(ShapeGroup::default()),
                "bvh" => Box::new(BVH::from_json(json_accel)),
                _ => {
                    warn!("Unknown accelerator type: {accel_type_str} -- use linear instead");
                    Box::new(ShapeGroup::default())
                }
            }
        } else {
            Box::new(ShapeGroup::default())
        };

        let mut has_analytic_emitters = false;
        if json.contains_key("shapes") {
            let jshapes = &json["shapes"];
            assert!(
                jshapes.is_array(),
                "Shapes needs to be specified as an array\n\t{jshapes:?}"
            );
            let jshapes: &Vec<_> = jshapes.get().unwrap();

            for jshape in jshapes {
                assert!(
                    jshape.is_object(),
                    "Shape needs to be specified as object\n\t{jshape:?}"
                );
                let jshape: &HashMap<_, _> = jshape.get().unwrap();

                assert!(
                    jshape.contains_key("material"),
                    "Shapes needs to be specified as an array\n\t{jshape:?}"
                );
                let material_name: String = jshape["material"].get::<String>().unwrap().clone();
                assert!(
                    materials.contains_key(&material_name),
                    "Impossible to found a material named: {material_name}"
                );

                let material = materials[&material_name].clone();
                if material.have_emission() {
                    has_analytic_emitters = true;
                }

                let s = json_to_shape(jshape, material);
                match s {
                    crate::shapes::JsonShape::Shape(s) => {
                        if s.material().have_emission() {
                            has_analytic_emitters = true;
                        }
                        root.add_shape(s);
                    }
                    crate::shapes::JsonShape::Mesh(m) => {
                        if let Some(m) = m {
                            // Convert mesh to triangle
                            let m = Arc::new(m);
                            for face_id in 0..m.face_positions_idx.len() {
                                root.add_shape(Box::new(Triangle::new(face_id, m.clone())));
                            }
                        }
                    }
                }
            }
        }

        info!("Build acceleration structure ...");
        let now = std::time::Instant::now();
        root.build();
        info!(
            "Acceleration structure build in {}s",
            now.elapsed().as_secs_f64()
        );

        let ignore_nans = json_to_bool(json, "ignore_nans", false);
        if ignore_nans {
            warn!("Ignoring NaN samples in render");
        }

        Ok((
            Self {
                root,
                materials,
                camera,
                background,
                max_depth: 16,
                has_analytic_emitters,
                ignore_nans,
            },
            sampler,
            integrator,
        ))
    }

    #[must_use]
    pub fn background(&self, d: Vec3) -> Color3 {
        match &self.background {
            SceneBackground::Uniform(color) => *color,
            SceneBackground::Texture(tex) => {
                let longitude = 0.5 + d.z.atan2(d.x) / (2.0 * f64::consts::PI);
                let latitude = 0.5 + (d.y / d.magnitude()).asin() / f64::consts::FRAC_PI_2;
                let u = f64::from(tex.size_x()) * longitude;
                let v = f64::from(tex.size_y()) * (1.0 - latitude);
                *tex.at(u as u32, v as u32)
            }
        }
    }

    #[must_use]
    pub fn hit<'a>(&'a self, r: &Ray) -> Option<Intersection<'a>> {
        NUMBER_TRACED_RAYS.with(|f| *f.borrow_mut() += 1);
        self.root.hit(r)
    }

    #[must_use]
    pub fn visible(&self, p0: &Point3, p1: &Point3) -> bool {
        // Calcul de la direction entre p1 et p0
        let d = p1 - p0;
        let dist = d.magnitude();
        let d = d / dist;
        // Prise en compte de tmin et tmax
        let dist = crate::constants::RAY_EPS.mul_add(-2.0, dist);
        // Vérifie s'il y a une intersection entre p0 et p1
        let r = Ray::new(p0, &d).with_distance_max(dist);
        self.hit(&r).is_none()
    }

    #[must_use]
    pub fn sample_direct(&self, p: &Point3, sample: &Vec2) -> (EmitterSample, &dyn Shape) {
        self.root.sample_direct(p, sample)
    }

    pub fn pdf_direct(&self, shape: &dyn Shape, p: &Point3, y: &Point3, n: &Vec3) -> Real {
        self.root.pdf_direct(shape, p, y, n)
    }

    #[must_use]
    pub const fn has_analytic_emitters(&self) -> bool {
        self.has_analytic_emitters
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tinyjson::JsonValue;

    use super::*;
    use crate::{
        integrators::{SamplerIntegrator, path_mats::PathMatsIntegrator},
        samplers::independent::Independent,
    };

    fn parse_scene(json_str: &str) -> (Scene, Box<dyn Sampler>, Box<dyn Integrator>) {
        let json: JsonValue = json_str.parse().unwrap();
        let json: &HashMap<String, JsonValue> = json.get().unwrap();
        Scene::from_json(json).unwrap()
    }

    #[test]
    fn empty_scene_miss_returns_black() {
        let (scene, _sampler, _integrator) = parse_scene(
            r#"{
                "camera": {"type": "perspective"},
                "sampler": {"type": "independent", "samples": 1},
                "integrator": {"type": "path_mats"}
            }"#,
        );

        let path_mats = PathMatsIntegrator::from_json(&HashMap::new());
        let mut sampler = Independent::new(1);
        let ray = Ray::new(&Point3::new(0.0, 0.0, 0.0), &Vec3::new(0.0, 0.0, -1.0));

        let radiance = path_mats.li(&ray, &scene, &mut sampler);
        assert_eq!(radiance, Color3::zero());
    }

    /// A ray that lands directly on an emitter's front face on the primary
    /// bounce must return the emitter's radiance with zero variance -- no
    /// sampler call is reachable before the emission check fires.
    #[test]
    fn direct_hit_on_area_light_returns_its_radiance() {
        let (scene, _sampler, _integrator) = parse_scene(
            r#"{
                "camera": {"type": "perspective"},
                "sampler": {"type": "independent", "samples": 1},
                "integrator": {"type": "path_mats"},
                "materials": [
                    {"name": "light", "type": "area", "radiance": [1, 1, 1]}
                ],
                "shapes": [
                    {"type": "quad", "material": "light"}
                ]
            }"#,
        );

        let path_mats = PathMatsIntegrator::from_json(&HashMap::new());
        let mut sampler = Independent::new(1);
        let ray = Ray::new(&Point3::new(0.0, 0.0, 5.0), &Vec3::new(0.0, 0.0, -1.0));

        let radiance = path_mats.li(&ray, &scene, &mut sampler);
        assert!((radiance - Color3::new(1.0, 1.0, 1.0)).magnitude() < 1e-9);
    }

    /// Looking at the light from behind its emitting face must not pick up
    /// any radiance -- the front/back check in `DiffuseEmit::emission`
    /// gates this, not the geometric hit test.
    #[test]
    fn hit_on_area_light_back_face_returns_black() {
        let (scene, _sampler, _integrator) = parse_scene(
            r#"{
                "camera": {"type": "perspective"},
                "sampler": {"type": "independent", "samples": 1},
                "integrator": {"type": "path_mats"},
                "materials": [
                    {"name": "light", "type": "area", "radiance": [1, 1, 1]}
                ],
                "shapes": [
                    {"type": "quad", "material": "light"}
                ]
            }"#,
        );

        let path_mats = PathMatsIntegrator::from_json(&HashMap::new());
        let mut sampler = Independent::new(1);
        // Looking up the +z axis from below: hits the same quad, but from
        // the side its normal (0,0,1) points away from.
        let ray = Ray::new(&Point3::new(0.0, 0.0, -5.0), &Vec3::new(0.0, 0.0, 1.0));

        let radiance = path_mats.li(&ray, &scene, &mut sampler);
        assert_eq!(radiance, Color3::zero());
    }
}
