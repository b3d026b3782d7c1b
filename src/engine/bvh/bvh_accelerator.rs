use std::fmt;
use std::time::Instant;

use log::info;

use crate::utilities::math::*;
use crate::engine::intersectable::{Intersectable, IntersectionRecord};
use super::aabb::*;
use super::splitter::*;

///Fixed traversal stack size. Construction asserts the tree never
///grows deeper than this.
pub const TRAVERSAL_STACK_SIZE: usize = 64;

///Leaf counts are stored as u16, and leaves larger than this gain
///nothing over a split anyway.
const MAX_PRIMITIVES_PER_LEAF_LIMIT: usize = 255;

/// Bounding volume hierarchy over an owned set of primitives.
/// Primitives are reordered at build time so that every leaf covers a
/// contiguous range of the list, and the tree itself is stored
/// flattened in depth first order: the first child of an interior
/// node is the next array element, the second child sits at a
/// recorded offset.
pub struct BVHAccelerator<P> {
    nodes: Vec<FlatNode>,
    primitives: Vec<P>,
    split_method: SplitMethod,
}

#[derive(Debug, Clone, Copy)]
pub struct FlatNode {
    pub bound: AABoundingBox,
    pub kind: FlatNodeKind,
}

///Payload of a flattened node. Leaves reference a range of the
///reordered primitive list; interior nodes record where their second
///child landed and the axis they split on.
#[derive(Debug, Clone, Copy)]
pub enum FlatNodeKind {
    Leaf {
        first_primitive: u32,
        primitive_count: u16,
    },
    Interior {
        second_child: u32,
        axis: u8,
    },
}

///Temporary tree the builder produces before flattening.
enum BuildNode {
    Leaf {
        bound: AABoundingBox,
        first_ordered: usize,
        count: usize,
    },
    Interior {
        bound: AABoundingBox,
        axis: usize,
        left: Box<BuildNode>,
        right: Box<BuildNode>,
    },
}

impl BuildNode {
    fn bound(&self) -> &AABoundingBox {
        match self {
            BuildNode::Leaf { bound, .. } => bound,
            BuildNode::Interior { bound, .. } => bound,
        }
    }
}

///Build state threaded through the recursion.
struct TreeBuilder {
    split_method: SplitMethod,
    max_primitives_per_leaf: usize,
    ordered_indices: Vec<usize>,
    node_count: usize,
    max_depth: usize,
}

impl TreeBuilder {
    fn build_range(&mut self, infos: &mut [PrimitiveInfo], depth: usize) -> BuildNode {
        self.node_count += 1;
        self.max_depth = self.max_depth.max(depth + 1);

        let range_bound = infos
            .iter()
            .fold(AABoundingBox::empty(), |acc, info| acc.union(&info.bound));

        if infos.len() <= 1 {
            return self.emit_leaf(infos, range_bound);
        }

        let centroid_bound = infos
            .iter()
            .fold(AABoundingBox::empty(), |acc, info| {
                acc.union_point(&info.centroid)
            });
        let axis = centroid_bound.maximum_extent();

        //every centroid coincides along the widest axis, so no split
        //can separate the primitives
        if centroid_bound.upper[axis] == centroid_bound.lower[axis] {
            return self.emit_leaf(infos, range_bound);
        }

        let mid = match choose_split(
            self.split_method,
            infos,
            axis,
            &range_bound,
            &centroid_bound,
            self.max_primitives_per_leaf,
        ) {
            SplitDecision::MakeLeaf => return self.emit_leaf(infos, range_bound),
            SplitDecision::Split { mid } => mid,
        };

        let (left_infos, right_infos) = infos.split_at_mut(mid);
        let left = self.build_range(left_infos, depth + 1);
        let right = self.build_range(right_infos, depth + 1);
        BuildNode::Interior {
            bound: left.bound().union(right.bound()),
            axis,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn emit_leaf(&mut self, infos: &[PrimitiveInfo], bound: AABoundingBox) -> BuildNode {
        let first_ordered = self.ordered_indices.len();
        self.ordered_indices
            .extend(infos.iter().map(|info| info.index));
        BuildNode::Leaf {
            bound,
            first_ordered,
            count: infos.len(),
        }
    }
}

///Writes the tree into `nodes` in depth first order and returns the
///index the subtree root landed on.
fn flatten_tree(node: BuildNode, nodes: &mut Vec<FlatNode>) -> u32 {
    let flat_index = nodes.len() as u32;
    match node {
        BuildNode::Leaf {
            bound,
            first_ordered,
            count,
        } => {
            assert!(count <= u16::MAX as usize, "leaf of {} primitives overflows its count field", count);
            nodes.push(FlatNode {
                bound,
                kind: FlatNodeKind::Leaf {
                    first_primitive: first_ordered as u32,
                    primitive_count: count as u16,
                },
            });
        }
        BuildNode::Interior {
            bound,
            axis,
            left,
            right,
        } => {
            nodes.push(FlatNode {
                bound,
                kind: FlatNodeKind::Interior {
                    second_child: 0,
                    axis: axis as u8,
                },
            });
            flatten_tree(*left, nodes);
            let second = flatten_tree(*right, nodes);
            match &mut nodes[flat_index as usize].kind {
                FlatNodeKind::Interior { second_child, .. } => *second_child = second,
                FlatNodeKind::Leaf { .. } => unreachable!(),
            }
        }
    }
    flat_index
}

///Moves the primitives into leaf order. The ordering is a
///permutation of the input, so every slot is taken exactly once.
fn apply_ordering<P>(primitives: Vec<P>, ordered_indices: &[usize]) -> Vec<P> {
    debug_assert_eq!(primitives.len(), ordered_indices.len());
    let mut slots: Vec<Option<P>> = primitives.into_iter().map(Some).collect();
    ordered_indices
        .iter()
        .map(|&index| {
            slots[index]
                .take()
                .expect("leaf ordering visited a primitive twice")
        })
        .collect()
}

impl<P: Boundable + Intersectable> BVHAccelerator<P> {
    pub fn new(primitives: Vec<P>) -> BVHAccelerator<P> {
        BVHAccelerator::with_split(primitives, SplitMethod::default(), 1)
    }

    ///Builds the hierarchy. `max_primitives_per_leaf` bounds the
    ///leaves the splitter has a choice about; a clump of primitives
    ///with coincident centroids becomes one leaf whatever its size.
    pub fn with_split(
        primitives: Vec<P>,
        split_method: SplitMethod,
        max_primitives_per_leaf: usize,
    ) -> BVHAccelerator<P> {
        if primitives.is_empty() {
            return BVHAccelerator {
                nodes: Vec::new(),
                primitives,
                split_method,
            };
        }

        let build_start = Instant::now();

        let mut infos: Vec<PrimitiveInfo> = primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| PrimitiveInfo::new(index, primitive.world_bound()))
            .collect();

        let mut builder = TreeBuilder {
            split_method,
            max_primitives_per_leaf: max_primitives_per_leaf
                .clamp(1, MAX_PRIMITIVES_PER_LEAF_LIMIT),
            ordered_indices: Vec::with_capacity(infos.len()),
            node_count: 0,
            max_depth: 0,
        };
        let root = builder.build_range(&mut infos, 0);
        assert!(
            builder.max_depth <= TRAVERSAL_STACK_SIZE,
            "hierarchy depth {} exceeds the traversal stack",
            builder.max_depth
        );

        let primitives = apply_ordering(primitives, &builder.ordered_indices);

        //flattening fills exactly the counted number of nodes, so the
        //array never reallocates
        let mut nodes = Vec::with_capacity(builder.node_count);
        flatten_tree(root, &mut nodes);
        assert_eq!(nodes.len(), builder.node_count);

        info!(
            "built {:?} bvh over {} primitives: {} nodes, depth {}, in {}",
            split_method,
            primitives.len(),
            nodes.len(),
            builder.max_depth,
            humantime::format_duration(build_start.elapsed()),
        );

        BVHAccelerator {
            nodes,
            primitives,
            split_method,
        }
    }

    ///Flattened nodes in depth first order, the root first. Empty
    ///for an empty hierarchy.
    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    ///Primitives in leaf order.
    pub fn primitives(&self) -> &[P] {
        &self.primitives
    }
}

impl<P: Boundable + Intersectable> Intersectable for BVHAccelerator<P> {
    ///Finds the globally nearest hit. Children are visited near side
    ///first, and each accepted hit shrinks the slab test's far bound
    ///so that farther subtrees prune away.
    fn intersect(&self, ray: &RayUnit, record: &mut IntersectionRecord) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let mut aabb_ray = AABBIntersectionRay::new(ray);
        aabb_ray.t_end = aabb_ray.t_end.min(record.t);

        let mut any_hit = false;
        let mut current = 0usize;
        let mut stack = [0u32; TRAVERSAL_STACK_SIZE];
        let mut stack_size = 0usize;

        loop {
            let node = &self.nodes[current];
            if node.bound.intersects_ray(&aabb_ray) {
                match node.kind {
                    FlatNodeKind::Leaf {
                        first_primitive,
                        primitive_count,
                    } => {
                        let start = first_primitive as usize;
                        let end = start + primitive_count as usize;
                        for primitive in &self.primitives[start..end] {
                            if primitive.intersect(ray, record) {
                                any_hit = true;
                                aabb_ray.t_end = record.t;
                            }
                        }
                        if stack_size == 0 {
                            break;
                        }
                        stack_size -= 1;
                        current = stack[stack_size] as usize;
                    }
                    FlatNodeKind::Interior { second_child, axis } => {
                        //the child the ray enters first is visited
                        //now, the other waits on the stack
                        if aabb_ray.dir_is_negative[axis as usize] {
                            stack[stack_size] = current as u32 + 1;
                            stack_size += 1;
                            current = second_child as usize;
                        } else {
                            stack[stack_size] = second_child;
                            stack_size += 1;
                            current += 1;
                        }
                    }
                }
            } else {
                if stack_size == 0 {
                    break;
                }
                stack_size -= 1;
                current = stack[stack_size] as usize;
            }
        }

        any_hit
    }

    ///Reports whether anything lies in the ray's range, returning at
    ///the first hit instead of searching for the nearest one.
    fn intersect_occluded(&self, ray: &RayUnit) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let aabb_ray = AABBIntersectionRay::new(ray);
        let mut current = 0usize;
        let mut stack = [0u32; TRAVERSAL_STACK_SIZE];
        let mut stack_size = 0usize;

        loop {
            let node = &self.nodes[current];
            if node.bound.intersects_ray(&aabb_ray) {
                match node.kind {
                    FlatNodeKind::Leaf {
                        first_primitive,
                        primitive_count,
                    } => {
                        let start = first_primitive as usize;
                        let end = start + primitive_count as usize;
                        if self.primitives[start..end]
                            .iter()
                            .any(|primitive| primitive.intersect_occluded(ray))
                        {
                            return true;
                        }
                        if stack_size == 0 {
                            break;
                        }
                        stack_size -= 1;
                        current = stack[stack_size] as usize;
                    }
                    FlatNodeKind::Interior { second_child, axis } => {
                        if aabb_ray.dir_is_negative[axis as usize] {
                            stack[stack_size] = current as u32 + 1;
                            stack_size += 1;
                            current = second_child as usize;
                        } else {
                            stack[stack_size] = second_child;
                            stack_size += 1;
                            current += 1;
                        }
                    }
                }
            } else {
                if stack_size == 0 {
                    break;
                }
                stack_size -= 1;
                current = stack[stack_size] as usize;
            }
        }

        false
    }
}

impl<P> Boundable for BVHAccelerator<P> {
    ///Bound of the whole hierarchy, taken from the root node. An
    ///empty hierarchy reports the empty bound.
    fn world_bound(&self) -> AABoundingBox {
        match self.nodes.first() {
            Some(node) => node.bound,
            None => AABoundingBox::empty(),
        }
    }
}

impl<P> fmt::Debug for BVHAccelerator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BVHAccelerator")
            .field("split_method", &self.split_method)
            .field("nodes", &self.nodes.len())
            .field("primitives", &self.primitives.len())
            .finish()
    }
}
