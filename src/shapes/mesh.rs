use std::{collections::HashMap, sync::Arc};

use cgmath::InnerSpace;
use log::{error, info};
use tinyjson::JsonValue;

use crate::{
    aabb::AABB,
    fileresolver::FILE_RESOLVER,
    json::json_to_bool,
    materials::Material,
    transform::MyTransform,
    vec::{Point3, Vec2, Vec3, Vec3u},
};

/// Raw OBJ-loaded triangle soup, shared by every `Triangle` face that views
/// into it. Carries no BSDF/emitter sampling state of its own — per-face
/// emitter weighting lives on the `Triangle` shapes (and the `ShapeGroup`
/// they're collected into), not here.
pub struct Mesh {
    pub material: Arc<dyn Material>,
    /// Vertex positions (world space)
    pub positions: Vec<Point3>,
    /// Vertex normals (world space)
    pub normals: Vec<Vec3>,
    /// Vertex texture coordinates
    pub uvs: Vec<Vec2>,
    /// Face index into `positions`
    pub face_positions_idx: Vec<Vec3u>,
    /// Face index into `normals` (empty if the mesh has no normals)
    pub face_normals_idx: Vec<Vec3u>,
    /// Face index into `uvs` (empty if the mesh has no texture coordinates)
    pub face_uvs_idx: Vec<Vec3u>,
}

impl Mesh {
    pub fn from_json(
        json: &HashMap<String, JsonValue>,
        transform: &MyTransform,
        material: Arc<dyn Material>,
    ) -> Option<Self> {
        assert!(json.contains_key("filename"), "Mesh need to contains filename");
        let filename = json["filename"]
            .get::<String>()
            .expect("Filename need to be a string")
            .clone();
        let filename = FILE_RESOLVER
            .lock()
            .unwrap()
            .resolve(std::path::Path::new(&filename));

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut face_positions_idx = Vec::new();
        let mut face_normals_idx = Vec::new();
        let mut face_uvs_idx = Vec::new();

        let mut options = tobj::OFFLINE_RENDERING_LOAD_OPTIONS;
        options.triangulate = true;
        let res = tobj::load_obj(&filename, &options);
        if res.is_err() {
            error!("Failed to load file: {:?}", filename);
            return None;
        }
        let (models, _) = res.unwrap();

        let mut aabb = AABB::default();

        for m in models {
            let offset_position = positions.len() as u32;
            let offset_normal = normals.len() as u32;
            let offset_uvs = uvs.len() as u32;

            let mesh = m.mesh;
            for face in (0..mesh.indices.len()).step_by(3) {
                let face_indices = &mesh.indices[face..face + 3];
                face_positions_idx.push(Vec3u::new(
                    face_indices[0] + offset_position,
                    face_indices[1] + offset_position,
                    face_indices[2] + offset_position,
                ));
                if !mesh.texcoord_indices.is_empty() {
                    let uv_indices = &mesh.texcoord_indices[face..face + 3];
                    face_uvs_idx.push(Vec3u::new(
                        uv_indices[0] + offset_uvs,
                        uv_indices[1] + offset_uvs,
                        uv_indices[2] + offset_uvs,
                    ));
                }
                if !mesh.normal_indices.is_empty() {
                    let n_indices = &mesh.normal_indices[face..face + 3];
                    face_normals_idx.push(Vec3u::new(
                        n_indices[0] + offset_normal,
                        n_indices[1] + offset_normal,
                        n_indices[2] + offset_normal,
                    ));
                }
            }

            assert_eq!(mesh.positions.len() % 3, 0);
            for pos in mesh.positions[..].chunks_exact(3) {
                positions.push(transform.point(&Point3::new(
                    pos[0] as f64,
                    pos[1] as f64,
                    pos[2] as f64,
                )));
                aabb.extend(*positions.last().unwrap());
            }

            if !mesh.normals.is_empty() {
                assert_eq!(mesh.normals.len() % 3, 0);
                for normal in mesh.normals[..].chunks_exact(3) {
                    normals.push(
                        transform
                            .normal(&Vec3::new(
                                normal[0] as f64,
                                normal[1] as f64,
                                normal[2] as f64,
                            ))
                            .normalize(),
                    );
                }
            }

            if !mesh.texcoords.is_empty() {
                assert_eq!(mesh.texcoords.len() % 2, 0);
                for uv in mesh.texcoords[..].chunks_exact(2) {
                    uvs.push(Vec2::new(uv[0] as f64, uv[1] as f64));
                }
            }
        }

        let smooth = json_to_bool(json, "smooth", true);
        if !smooth {
            normals.clear();
            face_normals_idx.clear();
        }

        info!("Loaded: {:?}", filename);
        info!(" - AABB     : [{:?}, {:?}]", aabb.min, aabb.max);
        info!(" - #faces   : {:?}", face_positions_idx.len());
        info!(" - #vertices: {:?}", positions.len());
        info!(" - has_normal: {}", !normals.is_empty());
        info!(" - has_uv    : {}", !uvs.is_empty());

        Some(Self {
            material,
            positions,
            normals,
            uvs,
            face_positions_idx,
            face_normals_idx,
            face_uvs_idx,
        })
    }

    #[must_use]
    pub fn has_normal(&self) -> bool {
        !self.normals.is_empty()
    }

    #[must_use]
    pub fn has_uv(&self) -> bool {
        !self.uvs.is_empty()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face_positions_idx.len()
    }
}
