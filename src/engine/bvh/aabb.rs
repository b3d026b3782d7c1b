use std::f32;

use crate::utilities::math::*;

///Anything that can report a world-space axis-aligned bounding box.
pub trait Boundable {
    fn world_bound(&self) -> AABoundingBox;
}

///A ray preprocessed for repeated slab tests. The inverse direction
///and per-axis sign are computed once per traversal, and t_end
///shrinks as closer hits are found.
pub struct AABBIntersectionRay {
    pub position: Vec3,
    pub direction_inverse: Vec3,
    pub dir_is_negative: [bool; 3],
    pub t_start: f32,
    pub t_end: f32
}

impl AABBIntersectionRay {
    pub fn new(ray: &RayUnit) -> AABBIntersectionRay {
        let inverse_direction = Vec3::new(1.0, 1.0, 1.0)
            .div_element_wise(*ray.direction.vec());
        AABBIntersectionRay {
            position: ray.position,
            direction_inverse: inverse_direction,
            dir_is_negative: [
                inverse_direction.x < 0.0,
                inverse_direction.y < 0.0,
                inverse_direction.z < 0.0,
            ],
            t_start: ray.t_range.start,
            t_end: ray.t_range.end
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AABoundingBox {
    pub lower: Vec3,
    pub upper: Vec3
}

impl AABoundingBox {
    ///An inverted box that unions as the identity: any union with it
    ///yields the other operand.
    pub fn empty() -> AABoundingBox {
        AABoundingBox {
            lower: Vec3::new(f32::INFINITY,
                             f32::INFINITY,
                             f32::INFINITY),
            upper: Vec3::new(-f32::INFINITY,
                             -f32::INFINITY,
                             -f32::INFINITY)
        }
    }

    pub fn union(&self, other: &AABoundingBox) -> AABoundingBox {
        AABoundingBox {
            lower: self.lower.min_elem_wise(&other.lower),
            upper: self.upper.max_elem_wise(&other.upper)
        }
    }

    pub fn union_point(&self, point: &Vec3) -> AABoundingBox {
        AABoundingBox {
            lower: self.lower.min_elem_wise(point),
            upper: self.upper.max_elem_wise(point)
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.lower + self.upper) / 2.0
    }

    pub fn surface_area(&self) -> f32 {
        let diagonal = self.upper - self.lower;
        if diagonal.x < 0.0 || diagonal.y < 0.0 || diagonal.z < 0.0 {
            return 0.0;
        }
        2.0 * (diagonal.x * diagonal.y
             + diagonal.y * diagonal.z
             + diagonal.z * diagonal.x)
    }

    ///Index of the axis along which the box is widest.
    pub fn maximum_extent(&self) -> usize {
        let diagonal = self.upper - self.lower;
        if diagonal.x > diagonal.y && diagonal.x > diagonal.z {
            0
        } else if diagonal.y > diagonal.z {
            1
        } else {
            2
        }
    }

    ///Position of a point relative to the box corners, (0,0,0) at
    ///lower and (1,1,1) at upper. Degenerate axes map to 0.
    pub fn offset(&self, point: &Vec3) -> Vec3 {
        let mut relative = point - self.lower;
        if self.upper.x > self.lower.x {
            relative.x /= self.upper.x - self.lower.x;
        }
        if self.upper.y > self.lower.y {
            relative.y /= self.upper.y - self.lower.y;
        }
        if self.upper.z > self.lower.z {
            relative.z /= self.upper.z - self.lower.z;
        }
        relative
    }

    ///Slab test against a preprocessed ray. Walks the near plane
    ///first on each axis using the precomputed direction signs, and
    ///widens the far intersection so rays that graze a slab within
    ///float rounding still count as hits.
    pub fn intersects_ray(&self, ray: &AABBIntersectionRay) -> bool {
        let bb_lower: &[f32; 3] = self.lower.as_ref();
        let bb_upper: &[f32; 3] = self.upper.as_ref();
        let ray_pos: &[f32; 3] = ray.position.as_ref();
        let inv_dir: &[f32; 3] = ray.direction_inverse.as_ref();
        let widen = 1.0 + 2.0 * gamma(3);

        let (mut t_near_max, mut t_far_min) = (ray.t_start, ray.t_end);
        for dimension in 0..3 {
            let (near, far) = if ray.dir_is_negative[dimension] {
                (bb_upper[dimension], bb_lower[dimension])
            } else {
                (bb_lower[dimension], bb_upper[dimension])
            };
            let t_near = (near - ray_pos[dimension]) * inv_dir[dimension];
            let t_far = (far - ray_pos[dimension]) * inv_dir[dimension] * widen;

            //NaN from 0 * inf compares false everywhere, so an axis
            //the ray runs parallel to inside the slab is skipped.
            if t_near > t_far_min || t_far < t_near_max {
                return false;
            }
            if t_near > t_near_max {
                t_near_max = t_near;
            }
            if t_far < t_far_min {
                t_far_min = t_far;
            }
        }

        true
    }
}

impl Boundable for AABoundingBox {
    fn world_bound(&self) -> AABoundingBox {
        *self
    }
}

pub fn get_aa_bounding_box<T: Boundable>(elems: &[T]) -> AABoundingBox {
    let mut full_bounding_box = AABoundingBox::empty();
    for elem in elems {
        full_bounding_box = full_bounding_box.union(&elem.world_bound());
    }
    full_bounding_box
}
