use std::fmt::{Debug, Formatter};
use std::fmt;
use std::f32;

use super::intersectable::IntersectionRecord;
use super::scene::Scene;
use super::math::*;
use super::color::*;

///Computes the outgoing color at an intersection. Shaders are shared
///between triangles and queried from several render threads at once.
pub trait Shader: Send + Sync {
    fn shade(&self, record: &IntersectionRecord, scene: &Scene) -> Color3;
}

impl Debug for dyn Shader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Shader")
    }
}

pub struct DiffuseShader {
    color: Color3
}

impl DiffuseShader {
    pub fn new(color: Color3) -> DiffuseShader {
        DiffuseShader {
            color
        }
    }
}

impl Shader for DiffuseShader {
    fn shade(&self, record: &IntersectionRecord, scene: &Scene) -> Color3 {
        scene.lights.iter().fold(Color3::new(0.0, 0.0, 0.0), |acc, light| {
            let light_vec = light.position - record.position;
            //lambertian falloff unless something blocks the light
            if scene.obstructed(record.position, light.position) {
                acc
            } else {
                f32::max(0., record.normal.dot(light_vec.normalize())) *
                    self.color * light.intensity / light_vec.magnitude2() + acc
            }
        })
    }
}
