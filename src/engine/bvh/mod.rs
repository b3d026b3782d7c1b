//!Bounding volume hierarchy over scene primitives.

pub mod aabb;
pub mod splitter;
pub mod bvh_accelerator;

#[cfg(test)]
mod bvh_accelerator_test;
