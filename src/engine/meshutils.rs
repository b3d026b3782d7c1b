use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::info;
use obj::raw::object::Polygon;
use thiserror::Error;

use crate::utilities::math::Vec3;

use super::intersectable::Triangle;
use super::shader::Shader;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("could not open model file {}", path.display())]
    OpenModel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse model file {}", path.display())]
    ParseModel {
        path: PathBuf,
        #[source]
        source: obj::ObjError,
    },
    #[error("model {} contains a face that is not a triangle", path.display())]
    NonTriangleFace { path: PathBuf },
    #[error("model {} is missing vertex normals", path.display())]
    MissingNormals { path: PathBuf },
}

pub struct MeshInfo {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub triangles: Vec<([usize; 3], [usize; 3])>, // vector of indices for (position, normal)
}

impl MeshInfo {
    ///Reads a wavefront OBJ model. Faces must already be triangles
    ///and must carry vertex normals.
    pub fn load(path: &Path) -> Result<MeshInfo, MeshError> {
        let file = File::open(path).map_err(|source| MeshError::OpenModel {
            path: path.to_path_buf(),
            source,
        })?;
        MeshInfo::from_obj_reader(BufReader::new(file), path)
    }

    fn from_obj_reader<R: BufRead>(reader: R, path: &Path) -> Result<MeshInfo, MeshError> {
        let raw = obj::raw::parse_obj(reader).map_err(|source| MeshError::ParseModel {
            path: path.to_path_buf(),
            source,
        })?;

        let mut triangles = Vec::with_capacity(raw.polygons.len());
        for polygon in &raw.polygons {
            match polygon {
                Polygon::PN(vertices) if vertices.len() == 3 => {
                    triangles.push((
                        [vertices[0].0, vertices[1].0, vertices[2].0],
                        [vertices[0].1, vertices[1].1, vertices[2].1],
                    ));
                }
                Polygon::PTN(vertices) if vertices.len() == 3 => {
                    triangles.push((
                        [vertices[0].0, vertices[1].0, vertices[2].0],
                        [vertices[0].2, vertices[1].2, vertices[2].2],
                    ));
                }
                Polygon::P(_) | Polygon::PT(_) => {
                    return Err(MeshError::MissingNormals {
                        path: path.to_path_buf(),
                    });
                }
                _ => {
                    return Err(MeshError::NonTriangleFace {
                        path: path.to_path_buf(),
                    });
                }
            }
        }

        Ok(MeshInfo {
            positions: raw
                .positions
                .iter()
                .map(|&(x, y, z, _)| Vec3::new(x, y, z))
                .collect(),
            normals: raw
                .normals
                .iter()
                .map(|&(x, y, z)| Vec3::new(x, y, z))
                .collect(),
            triangles,
        })
    }
}

pub struct MeshObject {
    pub triangles: Vec<Triangle>,
    pub shader: Arc<dyn Shader>
}

impl MeshObject {
    ///Builds the triangle list, or None when an index points outside
    ///the mesh data.
    pub fn new(mesh_info: &MeshInfo, shader: &Arc<dyn Shader>) -> Option<MeshObject> {
        let mut mesh_object = MeshObject {
            triangles: Vec::with_capacity(mesh_info.triangles.len()),
            shader: shader.clone()
        };

        for &(positions, normals) in &mesh_info.triangles {
            if let (Some(pos0), Some(pos1), Some(pos2),
                Some(norm0), Some(norm1), Some(norm2)) = (
                mesh_info.positions.get(positions[0]),
                mesh_info.positions.get(positions[1]),
                mesh_info.positions.get(positions[2]),
                mesh_info.normals.get(normals[0]),
                mesh_info.normals.get(normals[1]),
                mesh_info.normals.get(normals[2]),
            ) {
                let triangle = Triangle {
                    positions: [*pos0, *pos1, *pos2],
                    normals: [*norm0, *norm1, *norm2],
                    shader: shader.clone()
                };
                mesh_object.triangles.push(triangle);
            } else {
                return None
            }
        }

        Some(mesh_object)
    }
}

impl fmt::Debug for MeshObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MeshObject")
    }
}

///Caches parsed models by path, so a mesh referenced by several
///scene entries is read and parsed once per scene build.
pub struct ModelCache {
    models: HashMap<PathBuf, Arc<MeshInfo>>,
}

impl ModelCache {
    pub fn new() -> ModelCache {
        ModelCache {
            models: HashMap::new(),
        }
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<MeshInfo>, MeshError> {
        if let Some(mesh_info) = self.models.get(path) {
            return Ok(mesh_info.clone());
        }

        let load_start = Instant::now();
        let mesh_info = Arc::new(MeshInfo::load(path)?);
        info!(
            "loaded model {}: {} triangles in {}",
            path.display(),
            mesh_info.triangles.len(),
            humantime::format_duration(load_start.elapsed()),
        );
        self.models.insert(path.to_path_buf(), mesh_info.clone());
        Ok(mesh_info)
    }
}

impl Default for ModelCache {
    fn default() -> ModelCache {
        ModelCache::new()
    }
}
