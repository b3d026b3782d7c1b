use super::scene::*;
use super::color::*;
use super::camera::*;
use super::meshutils::MeshObject;
use super::bvh::splitter::SplitMethod;

pub struct SceneBuilder {
    pub background_color: Color3,
    pub camera: Camera,
    pub meshes: Vec<MeshObject>,
    pub lights: Vec<Light>,
    pub split_method: SplitMethod,
    pub max_primitives_per_leaf: usize,
}

macro_rules! builder_param {
    ($param:ident, $typ:ty) => (
        pub fn $param(mut self, $param: $typ) -> Self {
            self.$param = $param;
            self
        }
    )
}

impl SceneBuilder {
    pub fn new() -> SceneBuilder {
        SceneBuilder {
            background_color: Color3::new(0.0, 0.0, 0.0),
            camera: Camera::new_default(),
            meshes: Vec::new(),
            lights: Vec::new(),
            split_method: SplitMethod::default(),
            max_primitives_per_leaf: 1,
        }
    }

    pub fn build(self) -> Scene {
        Scene::new_from_builder(self)
    }

    builder_param!(background_color, Color3);
    builder_param!(camera, Camera);
    builder_param!(meshes, Vec<MeshObject>);
    builder_param!(lights, Vec<Light>);
    builder_param!(split_method, SplitMethod);
    builder_param!(max_primitives_per_leaf, usize);
}

impl Default for SceneBuilder {
    fn default() -> SceneBuilder {
        SceneBuilder::new()
    }
}
