use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::intersectable::{
    Intersectable, IntersectableTriangle, IntersectionRecord, Triangle,
};
use crate::engine::shader::{DiffuseShader, Shader};
use crate::utilities::color::Color3;
use crate::utilities::math::*;

use super::aabb::*;
use super::bvh_accelerator::*;
use super::splitter::SplitMethod;

///Analytic sphere, enough of a primitive to exercise the hierarchy
///without dragging meshes in.
#[derive(Debug, Clone)]
struct TestSphere {
    id: usize,
    center: Vec3,
    radius: f32,
}

impl Boundable for TestSphere {
    fn world_bound(&self) -> AABoundingBox {
        let extent = Vec3::new(self.radius, self.radius, self.radius);
        AABoundingBox {
            lower: self.center - extent,
            upper: self.center + extent,
        }
    }
}

impl Intersectable for TestSphere {
    fn intersect(&self, ray: &RayUnit, record: &mut IntersectionRecord) -> bool {
        let offset = ray.position - self.center;
        let half_b = offset.dot(*ray.direction.vec());
        let c = offset.magnitude2() - self.radius * self.radius;
        let discriminant = half_b * half_b - c;
        if discriminant < 0.0 {
            return false;
        }
        let sqrt_discriminant = discriminant.sqrt();
        for t in [-half_b - sqrt_discriminant, -half_b + sqrt_discriminant] {
            if ray.t_range.start < t && t < ray.t_range.end && t < record.t {
                record.position = ray.position + *ray.direction.vec() * t;
                record.normal = (record.position - self.center) / self.radius;
                record.shader = None;
                record.t = t;
                return true;
            }
        }
        false
    }
}

fn sphere(id: usize, x: f32, y: f32, z: f32) -> TestSphere {
    TestSphere {
        id,
        center: Vec3::new(x, y, z),
        radius: 0.5,
    }
}

fn sphere_cloud(count: usize, seed: u64) -> Vec<TestSphere> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|id| TestSphere {
            id,
            center: Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            ),
            radius: rng.gen_range(0.2..1.0),
        })
        .collect()
}

fn all_split_methods() -> [SplitMethod; 3] {
    [SplitMethod::Sah, SplitMethod::Middle, SplitMethod::EqualCounts]
}

fn random_direction<R: Rng>(rng: &mut R) -> UnitVec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
        );
        if candidate.magnitude2() > 1e-3 {
            return candidate.unit();
        }
    }
}

///Axis aligned cube spanning [-1, 1] on every axis, triangulated with
///outward normals.
fn unit_cube_triangles() -> Vec<IntersectableTriangle> {
    let corner = |index: usize| {
        Vec3::new(
            if index & 4 != 0 { 1.0 } else { -1.0 },
            if index & 2 != 0 { 1.0 } else { -1.0 },
            if index & 1 != 0 { 1.0 } else { -1.0 },
        )
    };
    let faces: [([usize; 3], Vec3); 12] = [
        ([0, 1, 3], -Vec3::unit_x()),
        ([0, 3, 2], -Vec3::unit_x()),
        ([4, 6, 7], Vec3::unit_x()),
        ([4, 7, 5], Vec3::unit_x()),
        ([0, 4, 5], -Vec3::unit_y()),
        ([0, 5, 1], -Vec3::unit_y()),
        ([2, 3, 7], Vec3::unit_y()),
        ([2, 7, 6], Vec3::unit_y()),
        ([0, 2, 6], -Vec3::unit_z()),
        ([0, 6, 4], -Vec3::unit_z()),
        ([1, 5, 7], Vec3::unit_z()),
        ([1, 7, 3], Vec3::unit_z()),
    ];
    let shader: Arc<dyn Shader> = Arc::new(DiffuseShader::new(Color3::new(1.0, 1.0, 1.0)));
    faces
        .iter()
        .map(|&(indices, normal)| {
            let triangle = Triangle {
                positions: [corner(indices[0]), corner(indices[1]), corner(indices[2])],
                normals: [normal, normal, normal],
                shader: shader.clone(),
            };
            IntersectableTriangle::new_from_triangle(&triangle)
        })
        .collect()
}

fn leaf_ranges<P: Boundable + Intersectable>(
    accelerator: &BVHAccelerator<P>,
) -> Vec<(usize, usize)> {
    accelerator
        .nodes()
        .iter()
        .filter_map(|node| match node.kind {
            FlatNodeKind::Leaf {
                first_primitive,
                primitive_count,
            } => Some((first_primitive as usize, primitive_count as usize)),
            FlatNodeKind::Interior { .. } => None,
        })
        .collect()
}

fn assert_leaves_cover_all_primitives<P: Boundable + Intersectable>(
    accelerator: &BVHAccelerator<P>,
    total: usize,
) {
    let mut covered = vec![false; total];
    for (start, count) in leaf_ranges(accelerator) {
        for slot in &mut covered[start..start + count] {
            assert!(!*slot, "leaf ranges overlap");
            *slot = true;
        }
    }
    assert!(covered.iter().all(|&slot| slot), "a primitive is in no leaf");
}

#[test]
fn bounding_box_slab_test_accepts_and_rejects() {
    let bb = AABoundingBox {
        lower: Vec3::zero(),
        upper: Vec3::new(1.0, 1.0, 1.0),
    };

    let towards = RayUnit::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0).unit());
    assert!(bb.intersects_ray(&AABBIntersectionRay::new(&towards)));

    let away = RayUnit::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(1.0, 1.0, 1.0).unit());
    assert!(!bb.intersects_ray(&AABBIntersectionRay::new(&away)));

    let from_inside = RayUnit::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.0, 1.0, 0.0).unit());
    assert!(bb.intersects_ray(&AABBIntersectionRay::new(&from_inside)));
}

#[test]
fn axis_parallel_rays_respect_the_slab() {
    let bb = AABoundingBox {
        lower: Vec3::zero(),
        upper: Vec3::new(1.0, 1.0, 1.0),
    };

    let through = RayUnit::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::unit_x().unit());
    assert!(bb.intersects_ray(&AABBIntersectionRay::new(&through)));

    let beside = RayUnit::new(Vec3::new(-2.0, 2.0, 0.5), Vec3::unit_x().unit());
    assert!(!bb.intersects_ray(&AABBIntersectionRay::new(&beside)));

    //0 * inf turns into NaN on the grazed axis; the slab test treats
    //that axis as passing, like the boundary belongs to the box
    let grazing = RayUnit::new(Vec3::new(-2.0, 1.0, 0.5), Vec3::unit_x().unit());
    assert!(bb.intersects_ray(&AABBIntersectionRay::new(&grazing)));
}

#[test]
fn boxes_union_and_measure() {
    let a = AABoundingBox {
        lower: Vec3::new(0.0, 0.0, 0.0),
        upper: Vec3::new(1.0, 2.0, 3.0),
    };
    let b = AABoundingBox {
        lower: Vec3::new(-1.0, 0.5, 1.0),
        upper: Vec3::new(0.5, 4.0, 2.0),
    };

    let joined = a.union(&b);
    assert_vec3_near!(joined.lower, Vec3::new(-1.0, 0.0, 0.0));
    assert_vec3_near!(joined.upper, Vec3::new(1.0, 4.0, 3.0));

    assert_eq!(a.maximum_extent(), 2);
    let unit = AABoundingBox {
        lower: Vec3::zero(),
        upper: Vec3::new(1.0, 1.0, 1.0),
    };
    assert_near!(unit.surface_area(), 6.0);
    assert_vec3_near!(
        unit.offset(&Vec3::new(0.5, 0.25, 1.0)),
        Vec3::new(0.5, 0.25, 1.0)
    );
}

#[test]
fn empty_box_is_a_union_identity() {
    let a = AABoundingBox {
        lower: Vec3::new(-1.0, -2.0, -3.0),
        upper: Vec3::new(4.0, 5.0, 6.0),
    };
    let joined = AABoundingBox::empty().union(&a);
    assert_vec3_near!(joined.lower, a.lower);
    assert_vec3_near!(joined.upper, a.upper);
    assert_near!(AABoundingBox::empty().surface_area(), 0.0);
}

#[test]
fn ordered_primitives_are_a_permutation_of_the_input() {
    for method in all_split_methods() {
        let accelerator = BVHAccelerator::with_split(sphere_cloud(64, 42), method, 4);
        let mut ids: Vec<usize> = accelerator
            .primitives()
            .iter()
            .map(|sphere| sphere.id)
            .collect();
        ids.sort_unstable();
        let expected: Vec<usize> = (0..64).collect();
        assert_eq!(ids, expected, "{:?} build lost or duplicated primitives", method);
        assert_leaves_cover_all_primitives(&accelerator, 64);
    }
}

#[test]
fn world_bound_wraps_every_primitive() {
    for method in all_split_methods() {
        let spheres = sphere_cloud(32, 7);
        let expected = get_aa_bounding_box(&spheres);
        let accelerator = BVHAccelerator::with_split(spheres, method, 2);
        let bound = accelerator.world_bound();
        assert_vec3_near!(bound.lower, expected.lower);
        assert_vec3_near!(bound.upper, expected.upper);
    }
}

#[test]
fn leaves_respect_the_primitive_limit() {
    let accelerator = BVHAccelerator::with_split(sphere_cloud(100, 3), SplitMethod::Sah, 4);
    for (_, count) in leaf_ranges(&accelerator) {
        assert!(count <= 4, "leaf holds {} primitives", count);
    }

    let singles = BVHAccelerator::with_split(sphere_cloud(33, 5), SplitMethod::EqualCounts, 1);
    for (_, count) in leaf_ranges(&singles) {
        assert_eq!(count, 1);
    }
}

#[test]
fn interior_nodes_lay_children_out_depth_first() {
    let accelerator = BVHAccelerator::with_split(sphere_cloud(64, 9), SplitMethod::Sah, 4);
    let nodes = accelerator.nodes();
    for (index, node) in nodes.iter().enumerate() {
        if let FlatNodeKind::Interior { second_child, .. } = node.kind {
            let second = second_child as usize;
            //the first child is implicit at index + 1
            assert!(second > index + 1);
            assert!(second < nodes.len());
        }
    }
}

#[test]
fn empty_hierarchy_reports_no_hits() {
    let accelerator = BVHAccelerator::new(Vec::<TestSphere>::new());
    assert!(accelerator.nodes().is_empty());

    let ray = RayUnit::new(Vec3::zero(), Vec3::unit_x().unit());
    let mut record = IntersectionRecord::no_intersection();
    assert!(!accelerator.intersect(&ray, &mut record));
    assert!(!record.intersected());
    assert!(!accelerator.intersect_occluded(&ray));

    let bound = accelerator.world_bound();
    assert!(bound.lower.x > bound.upper.x);
}

#[test]
fn nearest_hit_wins_regardless_of_input_order() {
    //deliberately out of order along the ray
    let spheres = vec![
        sphere(0, 8.0, 0.0, 0.0),
        sphere(1, 2.0, 0.0, 0.0),
        sphere(2, 6.0, 0.0, 0.0),
        sphere(3, 4.0, 0.0, 0.0),
    ];
    for method in all_split_methods() {
        let accelerator = BVHAccelerator::with_split(spheres.clone(), method, 1);
        let ray = RayUnit::new(Vec3::zero(), Vec3::unit_x().unit());
        let mut record = IntersectionRecord::no_intersection();
        assert!(accelerator.intersect(&ray, &mut record));
        assert_near!(record.t, 1.5);
        assert_vec3_near!(record.position, Vec3::new(1.5, 0.0, 0.0));
        assert_vec3_near!(record.normal, Vec3::new(-1.0, 0.0, 0.0));
    }
}

#[test]
fn hits_never_worsen_an_existing_record() {
    let accelerator = BVHAccelerator::new(vec![sphere(0, 4.0, 0.0, 0.0)]);
    let ray = RayUnit::new(Vec3::zero(), Vec3::unit_x().unit());

    let mut record = IntersectionRecord::no_intersection();
    assert!(accelerator.intersect(&ray, &mut record));
    assert_near!(record.t, 3.5);

    //the same hit again is not an improvement
    assert!(!accelerator.intersect(&ray, &mut record));
    assert_near!(record.t, 3.5);

    //a record that is already closer stays untouched
    record.t = 1.0;
    assert!(!accelerator.intersect(&ray, &mut record));
    assert_near!(record.t, 1.0);
}

#[test]
fn cube_is_hit_from_inside_in_every_direction() {
    let longest_diagonal = 3.0f32.sqrt();
    for method in all_split_methods() {
        let accelerator = BVHAccelerator::with_split(unit_cube_triangles(), method, 1);
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..200 {
            let ray = RayUnit::new(Vec3::zero(), random_direction(&mut rng));
            let mut record = IntersectionRecord::no_intersection();
            assert!(
                accelerator.intersect(&ray, &mut record),
                "{:?} build missed direction {:?}",
                method,
                ray.direction.vec()
            );
            assert!(record.t >= 1.0 - 1e-3 && record.t <= longest_diagonal + 1e-3);
            assert!(accelerator.intersect_occluded(&ray));
        }
    }
}

#[test]
fn rays_outside_the_cube_behave() {
    let accelerator = BVHAccelerator::new(unit_cube_triangles());

    let passing_by = RayUnit::new(Vec3::new(3.0, 0.0, 0.0), Vec3::unit_y().unit());
    let mut record = IntersectionRecord::no_intersection();
    assert!(!accelerator.intersect(&passing_by, &mut record));
    assert!(!accelerator.intersect_occluded(&passing_by));

    let aimed_at_cube = RayUnit::new(Vec3::new(3.0, 0.25, -0.25), (-Vec3::unit_x()).unit());
    assert!(accelerator.intersect(&aimed_at_cube, &mut record));
    assert_near!(record.t, 2.0);
}

#[test]
fn split_methods_agree_on_every_query() {
    let spheres = sphere_cloud(64, 11);
    let accelerators: Vec<BVHAccelerator<TestSphere>> = all_split_methods()
        .iter()
        .map(|&method| BVHAccelerator::with_split(spheres.clone(), method, 4))
        .collect();

    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..100 {
        let origin = Vec3::new(
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
        );
        let ray = RayUnit::new(origin, random_direction(&mut rng));
        let hits: Vec<Option<f32>> = accelerators
            .iter()
            .map(|accelerator| {
                let mut record = IntersectionRecord::no_intersection();
                if accelerator.intersect(&ray, &mut record) {
                    Some(record.t)
                } else {
                    None
                }
            })
            .collect();
        match (hits[0], hits[1], hits[2]) {
            (Some(a), Some(b), Some(c)) => {
                assert_near!(a, b, 1e-4);
                assert_near!(a, c, 1e-4);
            }
            (None, None, None) => {}
            other => panic!("split methods disagree on a ray: {:?}", other),
        }
    }
}

#[test]
fn coincident_primitives_build_a_single_leaf() {
    let clump: Vec<TestSphere> = (0..8).map(|id| sphere(id, 3.0, 0.0, 0.0)).collect();
    let accelerator = BVHAccelerator::with_split(clump, SplitMethod::Sah, 1);

    assert_eq!(accelerator.nodes().len(), 1);
    match accelerator.nodes()[0].kind {
        FlatNodeKind::Leaf {
            primitive_count, ..
        } => assert_eq!(primitive_count, 8),
        FlatNodeKind::Interior { .. } => panic!("coincident centroids must not split"),
    }

    let ray = RayUnit::new(Vec3::zero(), Vec3::unit_x().unit());
    let mut record = IntersectionRecord::no_intersection();
    assert!(accelerator.intersect(&ray, &mut record));
    assert_near!(record.t, 2.5);
    assert!(accelerator.intersect_occluded(&ray));
}

#[test]
fn a_single_primitive_still_builds() {
    let accelerator = BVHAccelerator::new(vec![sphere(0, 0.0, 5.0, 0.0)]);
    assert_eq!(accelerator.nodes().len(), 1);

    let ray = RayUnit::new(Vec3::zero(), Vec3::unit_y().unit());
    let mut record = IntersectionRecord::no_intersection();
    assert!(accelerator.intersect(&ray, &mut record));
    assert_near!(record.t, 4.5);
}

#[test]
fn occlusion_respects_the_ray_range() {
    let accelerator = BVHAccelerator::new(vec![sphere(0, 4.0, 0.0, 0.0)]);

    let mut stops_short = RayUnit::new(Vec3::zero(), Vec3::unit_x().unit());
    stops_short.t_range.end = 2.0;
    assert!(!accelerator.intersect_occluded(&stops_short));

    let mut reaches = RayUnit::new(Vec3::zero(), Vec3::unit_x().unit());
    reaches.t_range.end = 4.0;
    assert!(accelerator.intersect_occluded(&reaches));
}

#[test]
fn concurrent_queries_share_the_hierarchy() {
    let accelerator = BVHAccelerator::new(unit_cube_triangles());
    thread::scope(|scope| {
        for seed in 0..4u64 {
            let accelerator = &accelerator;
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                for _ in 0..50 {
                    let ray = RayUnit::new(Vec3::zero(), random_direction(&mut rng));
                    let mut record = IntersectionRecord::no_intersection();
                    assert!(accelerator.intersect(&ray, &mut record));
                    assert!(accelerator.intersect_occluded(&ray));
                }
            });
        }
    });
}
