
use super::utilities::math;
use super::utilities::color;
use super::utilities::codable;

mod intersectable;
mod bvh;

pub mod camera;

pub mod scene;
pub mod scene_builder;
pub mod scene_spec;
pub mod meshutils;

pub mod shader;
pub mod renderer;

mod integrator;
