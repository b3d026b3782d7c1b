use super::math::*;
use super::color::*;
use super::camera::*;
use super::intersectable::*;
use super::scene_builder::SceneBuilder;
use super::bvh::aabb::{AABoundingBox, Boundable};
use super::bvh::bvh_accelerator::BVHAccelerator;

#[derive(Debug)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32
}

#[derive(Debug)]
pub struct Scene {
    pub background_color: Color3,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub accelerator: BVHAccelerator<IntersectableTriangle>,
}

impl Scene {
    pub fn new_from_builder(builder: SceneBuilder) -> Scene {
        let triangles: Vec<IntersectableTriangle> = builder.meshes.iter()
            .flat_map(|mesh| mesh.triangles.iter())
            .map(IntersectableTriangle::new_from_triangle)
            .collect();

        Scene {
            background_color: builder.background_color,
            camera: builder.camera,
            lights: builder.lights,
            accelerator: BVHAccelerator::with_split(
                triangles,
                builder.split_method,
                builder.max_primitives_per_leaf,
            ),
        }
    }

    ///Nearest intersection along the ray, or the no-intersection
    ///record when the ray escapes the scene.
    pub fn intersect(&self, ray: &RayUnit) -> IntersectionRecord {
        let mut record = IntersectionRecord::no_intersection();
        self.accelerator.intersect(ray, &mut record);
        record
    }

    ///detects whether anything blocks the open segment between
    ///origin and destination
    pub fn obstructed(&self, origin: Vec3, destination: Vec3) -> bool {
        let ray = {
            let mut ray = RayBase::new_shadow(origin, (destination - origin).unit());
            ray.t_range.end = (destination - origin).magnitude();
            ray
        };
        self.accelerator.intersect_occluded(&ray)
    }

    pub fn world_bound(&self) -> AABoundingBox {
        self.accelerator.world_bound()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::engine::meshutils::MeshObject;
    use crate::engine::shader::{DiffuseShader, Shader};

    fn quad_at_z(z: f32, shader: &Arc<dyn Shader>) -> Vec<Triangle> {
        let normals = [Vec3::new(0.0, 0.0, 1.0); 3];
        vec![
            Triangle {
                positions: [
                    Vec3::new(-2.0, -2.0, z),
                    Vec3::new(2.0, -2.0, z),
                    Vec3::new(2.0, 2.0, z),
                ],
                normals,
                shader: shader.clone(),
            },
            Triangle {
                positions: [
                    Vec3::new(-2.0, -2.0, z),
                    Vec3::new(2.0, 2.0, z),
                    Vec3::new(-2.0, 2.0, z),
                ],
                normals,
                shader: shader.clone(),
            },
        ]
    }

    fn two_plane_scene() -> Scene {
        let shader: Arc<dyn Shader> =
            Arc::new(DiffuseShader::new(Color3::new(0.5, 0.5, 0.5)));
        let mut builder = SceneBuilder::new();
        builder = builder.meshes(vec![
            MeshObject {
                triangles: quad_at_z(0.0, &shader),
                shader: shader.clone(),
            },
            MeshObject {
                triangles: quad_at_z(-3.0, &shader),
                shader: shader.clone(),
            },
        ]);
        Scene::new_from_builder(builder)
    }

    #[test]
    fn intersect_finds_the_nearer_plane() {
        let scene = two_plane_scene();
        let ray = RayUnit::new(
            Vec3::new(0.5, 0.5, 5.0),
            Vec3::new(0.0, 0.0, -1.0).unit(),
        );
        let record = scene.intersect(&ray);
        assert!(record.intersected());
        assert_near!(record.t, 5.0);
    }

    #[test]
    fn obstruction_respects_the_segment_end() {
        let scene = two_plane_scene();
        let origin = Vec3::new(0.0, 0.0, 5.0);
        //segment crossing the z=0 plane
        assert!(scene.obstructed(origin, Vec3::new(0.0, 0.0, -1.0)));
        //segment stopping short of it
        assert!(!scene.obstructed(origin, Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn empty_scene_reports_nothing() {
        let scene = Scene::new_from_builder(SceneBuilder::new());
        let ray = RayUnit::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0).unit(),
        );
        assert!(!scene.intersect(&ray).intersected());
        assert!(!scene.obstructed(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)));

        let bound = scene.world_bound();
        assert!(bound.lower.x > bound.upper.x);
    }

    #[test]
    fn scene_bound_wraps_both_planes() {
        let scene = two_plane_scene();
        let bound = scene.world_bound();
        assert_vec3_near!(bound.lower, Vec3::new(-2.0, -2.0, -3.0));
        assert_vec3_near!(bound.upper, Vec3::new(2.0, 2.0, 0.0));
    }
}
