//!Split point selection for BVH construction.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::utilities::math::*;
use super::aabb::*;

///Strategy used to pick the split point of a primitive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    Sah,
    Middle,
    EqualCounts
}

impl Default for SplitMethod {
    fn default() -> SplitMethod {
        SplitMethod::Sah
    }
}

///Build-time summary of one primitive: where it started in the
///input list, its bound, and that bound's center.
#[derive(Debug, Clone)]
pub struct PrimitiveInfo {
    pub index: usize,
    pub bound: AABoundingBox,
    pub centroid: Vec3,
}

impl PrimitiveInfo {
    pub fn new(index: usize, bound: AABoundingBox) -> PrimitiveInfo {
        PrimitiveInfo {
            index,
            centroid: bound.center(),
            bound,
        }
    }
}

///What the builder should do with a primitive range.
pub enum SplitDecision {
    Split { mid: usize },
    MakeLeaf,
}

pub const SAH_BUCKET_COUNT: usize = 12;

///Ranges at or below this size gain nothing from the heuristic and
///are split by count instead.
const SAH_SMALL_RANGE: usize = 2;

const COST_TRAVERSAL: f32 = 1.0;

///Picks a split point for a range of at least two primitives whose
///centroid bound is non-degenerate along `axis`. The range is
///reordered in place so that `mid` cuts it into the two children.
pub fn choose_split(
    method: SplitMethod,
    infos: &mut [PrimitiveInfo],
    axis: usize,
    range_bound: &AABoundingBox,
    centroid_bound: &AABoundingBox,
    max_primitives_per_leaf: usize,
) -> SplitDecision {
    match method {
        SplitMethod::Middle => SplitDecision::Split {
            mid: split_middle(infos, axis, centroid_bound),
        },
        SplitMethod::EqualCounts => SplitDecision::Split {
            mid: split_equal_counts(infos, axis),
        },
        SplitMethod::Sah => {
            split_sah(infos, axis, range_bound, centroid_bound, max_primitives_per_leaf)
        }
    }
}

///Partitions around the spatial midpoint of the centroid bound.
///Clumped input can land every centroid on one side, in which case
///this falls back to an equal count split.
fn split_middle(
    infos: &mut [PrimitiveInfo],
    axis: usize,
    centroid_bound: &AABoundingBox,
) -> usize {
    let midpoint = (centroid_bound.lower[axis] + centroid_bound.upper[axis]) / 2.0;
    let mid = partition_by(infos, |info| info.centroid[axis] < midpoint);
    if mid == 0 || mid == infos.len() {
        split_equal_counts(infos, axis)
    } else {
        mid
    }
}

///Selects the median centroid along the axis, leaving smaller
///centroids before it and larger ones after it.
fn split_equal_counts(infos: &mut [PrimitiveInfo], axis: usize) -> usize {
    let mid = infos.len() / 2;
    infos.select_nth_unstable_by(mid, |a, b| {
        a.centroid[axis]
            .partial_cmp(&b.centroid[axis])
            .unwrap_or(Ordering::Equal)
    });
    mid
}

///Surface area heuristic over a fixed number of buckets. Each
///candidate boundary is costed as one traversal step plus the
///expected intersection work of the two sides, measured by surface
///area relative to the whole range. A leaf costs one unit per
///primitive; if no boundary beats that and the range already fits in
///a leaf, no split happens.
fn split_sah(
    infos: &mut [PrimitiveInfo],
    axis: usize,
    range_bound: &AABoundingBox,
    centroid_bound: &AABoundingBox,
    max_primitives_per_leaf: usize,
) -> SplitDecision {
    if infos.len() <= SAH_SMALL_RANGE {
        return SplitDecision::Split {
            mid: split_equal_counts(infos, axis),
        };
    }

    #[derive(Clone, Copy)]
    struct Bucket {
        count: usize,
        bound: AABoundingBox,
    }
    let empty_bucket = Bucket {
        count: 0,
        bound: AABoundingBox::empty(),
    };

    let mut buckets = [empty_bucket; SAH_BUCKET_COUNT];
    for info in infos.iter() {
        let b = bucket_for_centroid(&info.centroid, centroid_bound, axis);
        buckets[b].count += 1;
        buckets[b].bound = buckets[b].bound.union(&info.bound);
    }

    //cost of splitting after bucket i
    let mut costs = [0.0f32; SAH_BUCKET_COUNT - 1];
    for (i, cost) in costs.iter_mut().enumerate() {
        let mut left = empty_bucket;
        let mut right = empty_bucket;
        for bucket in &buckets[..=i] {
            left.count += bucket.count;
            left.bound = left.bound.union(&bucket.bound);
        }
        for bucket in &buckets[i + 1..] {
            right.count += bucket.count;
            right.bound = right.bound.union(&bucket.bound);
        }
        *cost = COST_TRAVERSAL
            + (left.count as f32 * left.bound.surface_area()
                + right.count as f32 * right.bound.surface_area())
                / range_bound.surface_area();
    }

    let mut min_cost = costs[0];
    let mut min_cost_bucket = 0;
    for (i, &cost) in costs.iter().enumerate().skip(1) {
        if cost < min_cost {
            min_cost = cost;
            min_cost_bucket = i;
        }
    }

    let leaf_cost = infos.len() as f32;
    if infos.len() > max_primitives_per_leaf || min_cost < leaf_cost {
        let mid = partition_by(infos, |info| {
            bucket_for_centroid(&info.centroid, centroid_bound, axis) <= min_cost_bucket
        });
        SplitDecision::Split { mid }
    } else {
        SplitDecision::MakeLeaf
    }
}

///The bucket holding a centroid, by its normalized offset along the
///axis. An offset of exactly 1 would index one past the end, so the
///last bucket absorbs it.
fn bucket_for_centroid(
    centroid: &Vec3,
    centroid_bound: &AABoundingBox,
    axis: usize,
) -> usize {
    let scaled = SAH_BUCKET_COUNT as f32 * centroid_bound.offset(centroid)[axis];
    (scaled as usize).min(SAH_BUCKET_COUNT - 1)
}

///In-place partition. Reorders so every element satisfying the
///predicate precedes every element that does not, and returns the
///index of the first non-satisfying element.
fn partition_by<T, F>(items: &mut [T], predicate: F) -> usize
where
    F: Fn(&T) -> bool,
{
    let mut split = 0;
    for i in 0..items.len() {
        if predicate(&items[i]) {
            items.swap(i, split);
            split += 1;
        }
    }
    split
}
