use std::ops::Neg;
use std::ops::Range;
use std::f32;

pub type Vec3 = cgmath::Vector3<f32>;

pub use cgmath::{Zero, InnerSpace, ElementWise};

///Upper bound on the relative error of a single floating point
///operation, half the distance between 1.0 and the next float.
pub const MACHINE_EPSILON: f32 = f32::EPSILON * 0.5;

///Conservative bound on the error accumulated by n floating point
///operations.
pub fn gamma(n: i32) -> f32 {
    (n as f32 * MACHINE_EPSILON) / (1.0 - n as f32 * MACHINE_EPSILON)
}

///Component-wise extrema. cgmath's ElementWise covers arithmetic but
///not min/max, so vectors grow them here.
pub trait ElemWise {
    fn min_elem_wise(&self, other: &Self) -> Self;
    fn max_elem_wise(&self, other: &Self) -> Self;
}

impl ElemWise for Vec3 {
    fn min_elem_wise(&self, other: &Vec3) -> Vec3 {
        Vec3::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    fn max_elem_wise(&self, other: &Vec3) -> Vec3 {
        Vec3::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

///A Vec3 that's always normalized
#[derive(Debug, Clone, Copy)]
pub struct UnitVec3 {
    value: Vec3
}

impl UnitVec3 {
    pub fn new(value: &Vec3) -> UnitVec3 {
        UnitVec3 {
            value: value.normalize()
        }
    }

    pub fn vec(&self) -> &Vec3 {
        &self.value
    }

    pub fn cross(&self, other: UnitVec3) -> UnitVec3 {
        self.value.cross(other.value).unit()
    }
}

impl Neg for UnitVec3 {
    type Output = UnitVec3;
    fn neg(self) -> UnitVec3 {
        UnitVec3 {
            value: -self.value
        }
    }
}

pub trait HasUnit<T> {
    fn unit(&self) -> T;
}

///This converts Vec3 into a unit version of Vec3.
///The converted value's type guarantees that it will have a magnitude of 1
impl HasUnit<UnitVec3> for Vec3 {
    fn unit(&self) -> UnitVec3 {
        UnitVec3::new(self)
    }
}

#[derive(Debug, Clone)]
pub struct RayBase<T> {
    pub position: Vec3,
    pub direction: T,
    pub t_range: Range<f32>,
}

pub type RayUnit = RayBase<UnitVec3>;

impl<T> RayBase<T> {
    pub fn new(position: Vec3, direction: T) -> RayBase<T> {
        RayBase {
            position,
            direction,
            t_range: 0.0..(f32::INFINITY)
        }
    }

    ///A ray whose start is nudged forward so it does not immediately
    ///re-intersect the surface it leaves from.
    pub fn new_shadow(position: Vec3, direction: T) -> RayBase<T> {
        let mut ray = RayBase::<T>::new(position, direction);
        ray.t_range.start = 10.0 * f32::EPSILON;
        ray
    }
}
