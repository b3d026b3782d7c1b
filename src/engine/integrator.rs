use std::fmt::Debug;

use log::warn;
use rand::Rng;
use serde::Deserialize;

use crate::utilities::math::*;
use crate::utilities::color::*;

use super::scene::Scene;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegratorSpec {
    DirectLighting {
        number_of_samples: u32,
    },
}

impl IntegratorSpec {
    pub fn into_integrator(&self) -> Box<dyn Integrator> {
        use self::IntegratorSpec::*;
        match *self {
            DirectLighting { number_of_samples } => {
                if number_of_samples == 0 {
                    warn!("direct_lighting sample count 0 raised to 1");
                }
                Box::new(DirectLightingIntegrator {
                    number_of_samples: number_of_samples.max(1),
                })
            }
        }
    }
}

impl Default for IntegratorSpec {
    fn default() -> IntegratorSpec {
        IntegratorSpec::DirectLighting { number_of_samples: 1 }
    }
}

///Size of one pixel in uv units, for anti alias jitter.
pub struct UvPixelInfo {
    pub uv_pixel_width: f32,
    pub uv_pixel_height: f32,
}

pub trait Integrator: Debug {
    fn shade_camera_point(&self, scene: &Scene, u: f32, v: f32,
                          pixel_info: &UvPixelInfo) -> Color3;
}

fn sample_anti_alias_uv<R: Rng>(
    u: f32, v: f32, pixel_info: &UvPixelInfo,
    rng: &mut R
) -> (f32, f32) {
    let (rand_0, rand_1) = rng.gen::<(f32, f32)>();
    let (offset_u, offset_v) =
        ((rand_0 - 0.5) * pixel_info.uv_pixel_width,
         (rand_1 - 0.5) * pixel_info.uv_pixel_height);
    (u + offset_u, v + offset_v)
}

///Shades with direct lighting only. Each sample shoots one jittered
///camera ray and lets the hit surface's shader gather the lights.
#[derive(Debug, Clone)]
pub struct DirectLightingIntegrator {
    pub number_of_samples: u32,
}

impl DirectLightingIntegrator {
    fn shade_ray(&self, ray: &RayUnit, scene: &Scene) -> Color3 {
        let record = scene.intersect(ray);
        if !record.intersected() {
            return scene.background_color;
        }
        match record.shader {
            Some(ref shader) => shader.shade(&record, scene),
            None => scene.background_color,
        }
    }
}

impl Integrator for DirectLightingIntegrator {
    fn shade_camera_point(
        &self, scene: &Scene, u: f32, v: f32, pixel_info: &UvPixelInfo
    ) -> Color3 {
        let mut rng = rand::thread_rng();
        let mut acc = Color3::zero();
        for _ in 0..self.number_of_samples {
            let (anti_alias_u, anti_alias_v) =
                sample_anti_alias_uv(u, v, pixel_info, &mut rng);
            let ray = scene.camera.shoot_ray(anti_alias_u, anti_alias_v);
            acc += self.shade_ray(&ray, scene);
        }
        acc / self.number_of_samples as f32
    }
}
