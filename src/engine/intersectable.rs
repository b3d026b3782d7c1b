use std::f32;
use std::sync::Arc;

use super::shader::Shader;
use super::bvh::aabb::*;
use crate::utilities::math::*;

pub trait Intersectable {
    /// check for intersection between ray and surface.
    /// if there is an intersection, fills record with intersection information
    /// only if the new intersection's t is less than the old intersection's t and return true
    /// if there is no intersection, leave record alone and return false
    fn intersect(&self, ray: &RayUnit, record: &mut IntersectionRecord) -> bool;

    /// check whether anything intersects the ray within its t range.
    /// implementations that can answer without finding the nearest
    /// hit override this
    fn intersect_occluded(&self, ray: &RayUnit) -> bool {
        let mut record = IntersectionRecord::no_intersection();
        self.intersect(ray, &mut record)
    }
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub shader: Arc<dyn Shader>
}

impl Boundable for Triangle {
    fn world_bound(&self) -> AABoundingBox {
        AABoundingBox {
            lower: self.positions[0]
                .min_elem_wise(&self.positions[1])
                .min_elem_wise(&self.positions[2]),
            upper: self.positions[0]
                .max_elem_wise(&self.positions[1])
                .max_elem_wise(&self.positions[2])
        }
    }
}

///A triangle prepared for repeated intersection tests, with the
///first vertex and the two edges leaving it held ready.
#[derive(Debug, Clone)]
pub struct IntersectableTriangle {
    triangle: Arc<Triangle>,
    position_0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
}

impl IntersectableTriangle {
    pub fn new_from_triangle(triangle: &Triangle) -> IntersectableTriangle {
        let edge1 = triangle.positions[1] - triangle.positions[0];
        let edge2 = triangle.positions[2] - triangle.positions[0];
        IntersectableTriangle {
            triangle: Arc::new(triangle.clone()),
            position_0: triangle.positions[0],
            edge1,
            edge2,
        }
    }

    //Moller-Trumbore intersection
    //https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm
    //returns (t, u, v) for a hit within the ray's t range
    fn intersect_moller_trumbore(&self, ray: &RayUnit) -> Option<(f32, f32, f32)> {
        let h = ray.direction.vec().cross(self.edge2);
        let a = self.edge1.dot(h);
        if a.abs() < f32::EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.position - self.position_0;
        let u = f * s.dot(h);
        if u < 0.0 || u > 1.0 {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.vec().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        if t <= ray.t_range.start || ray.t_range.end <= t {
            return None;
        }
        Some((t, u, v))
    }
}

impl Boundable for IntersectableTriangle {
    fn world_bound(&self) -> AABoundingBox {
        self.triangle.world_bound()
    }
}

impl Intersectable for IntersectableTriangle {
    fn intersect(&self, ray: &RayUnit, record: &mut IntersectionRecord) -> bool {
        let (t, u, v) = match self.intersect_moller_trumbore(ray) {
            Some(hit) => hit,
            None => return false,
        };
        if t >= record.t {
            return false;
        }

        let beta = u;
        let gamma = v;
        let alpha = 1.0 - beta - gamma;
        *record = IntersectionRecord {
            position: ray.position + *ray.direction.vec() * t,
            normal: self.triangle.normals[0] * alpha +
                self.triangle.normals[1] * beta +
                self.triangle.normals[2] * gamma,
            t,
            shader: Some(self.triangle.shader.clone())
        };
        true
    }

    fn intersect_occluded(&self, ray: &RayUnit) -> bool {
        self.intersect_moller_trumbore(ray).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct IntersectionRecord {
    pub shader: Option<Arc<dyn Shader>>,
    pub position: Vec3,
    pub normal: Vec3,
    pub t: f32
}

impl IntersectionRecord {
    pub fn no_intersection() -> IntersectionRecord {
        IntersectionRecord {
            shader: None,
            position: Vec3::zero(),
            normal: Vec3::zero(),
            t: f32::INFINITY
        }
    }

    pub fn intersected(&self) -> bool {
        self.t.is_finite()
    }
}
