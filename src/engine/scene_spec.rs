//!Declarative scene description, decoded from config files and resolved
//!into a renderable Scene.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::bvh::splitter::SplitMethod;
use super::camera::Camera;
use super::codable::CodableWrapper;
use super::color::Color3;
use super::math::Vec3;
use super::meshutils::{MeshError, MeshObject, ModelCache};
use super::scene::{Light, Scene};
use super::scene_builder::SceneBuilder;
use super::shader::{DiffuseShader, Shader};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error("scene references shader {name:?} but never defines it")]
    MissingShader { name: String },
    #[error("mesh {} has indices outside its vertex tables", path.display())]
    InvalidMesh { path: PathBuf },
}

#[derive(Debug, Deserialize)]
pub struct SceneSpec {
    pub background_color: CodableWrapper<Color3>,
    pub camera: CameraSpec,
    #[serde(default)]
    pub shaders: HashMap<String, ShaderSpec>,
    #[serde(default)]
    pub meshes: Vec<MeshSpec>,
    #[serde(default)]
    pub lights: Vec<LightSpec>,
    #[serde(default)]
    pub accelerator: AcceleratorSpec,
}

impl SceneSpec {
    ///Resolves shader names, loads every mesh through the cache, and
    ///assembles the scene around the resulting triangle set.
    pub fn into_scene(&self, aspect_ratio: f32, models: &mut ModelCache)
                      -> Result<Scene, SceneError>
    {
        let shaders: HashMap<String, Arc<dyn Shader>> = self.shaders.iter()
            .map(|(name, spec)| (name.clone(), spec.into_shader()))
            .collect();

        let mut meshes = Vec::with_capacity(self.meshes.len());
        for mesh_spec in &self.meshes {
            let shader = shaders.get(&mesh_spec.shader)
                .ok_or_else(|| SceneError::MissingShader {
                    name: mesh_spec.shader.clone(),
                })?;
            let mesh_info = models.load(&mesh_spec.src)?;
            let mesh = MeshObject::new(&mesh_info, shader)
                .ok_or_else(|| SceneError::InvalidMesh {
                    path: mesh_spec.src.clone(),
                })?;
            meshes.push(mesh);
        }

        let lights = self.lights.iter()
            .map(|light| Light {
                position: light.position.get(),
                intensity: light.intensity,
            })
            .collect();

        Ok(SceneBuilder::new()
            .background_color(self.background_color.get())
            .camera(self.camera.into_camera(aspect_ratio))
            .meshes(meshes)
            .lights(lights)
            .split_method(self.accelerator.split_method)
            .max_primitives_per_leaf(self.accelerator.max_primitives_per_leaf)
            .build())
    }
}

#[derive(Debug, Deserialize)]
pub struct CameraSpec {
    pub position: CodableWrapper<Vec3>,
    pub direction: CodableWrapper<Vec3>,
    pub up: CodableWrapper<Vec3>,
    pub plane_distance: f32,
    pub plane_width: f32,
}

impl CameraSpec {
    ///The image plane height follows from the configured width and the
    ///output aspect ratio.
    pub fn into_camera(&self, aspect_ratio: f32) -> Camera {
        Camera::new(self.position.get(), self.direction.get(), self.up.get(),
                    self.plane_width, self.plane_width / aspect_ratio,
                    self.plane_distance)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShaderSpec {
    Diffuse { color: CodableWrapper<Color3> },
}

impl ShaderSpec {
    pub fn into_shader(&self) -> Arc<dyn Shader> {
        match *self {
            ShaderSpec::Diffuse { ref color } => {
                Arc::new(DiffuseShader::new(color.get()))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MeshSpec {
    pub src: PathBuf,
    pub shader: String,
}

#[derive(Debug, Deserialize)]
pub struct LightSpec {
    pub position: CodableWrapper<Vec3>,
    pub intensity: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AcceleratorSpec {
    pub split_method: SplitMethod,
    pub max_primitives_per_leaf: usize,
}

impl Default for AcceleratorSpec {
    fn default() -> AcceleratorSpec {
        AcceleratorSpec {
            split_method: SplitMethod::default(),
            max_primitives_per_leaf: 1,
        }
    }
}
