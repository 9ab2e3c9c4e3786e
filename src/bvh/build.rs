//! Recursive BVH construction over primitive digests

use std::str::FromStr;
use std::sync::Arc;

use crate::core::arena::{Arena, Handle};
use crate::core::error::Error;
use crate::core::types::Vec3;
use crate::math::Aabb;

use super::primitive::Primitive;

/// Strategy used to partition a primitive range at each interior node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitMethod {
    /// Partition at the spatial midpoint of the centroid bound; falls back
    /// to `EqualCounts` when every centroid lands on one side
    #[default]
    Middle,
    /// Median split into two count-balanced halves
    EqualCounts,
}

impl std::fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitMethod::Middle => write!(f, "Middle"),
            SplitMethod::EqualCounts => write!(f, "EqualCounts"),
        }
    }
}

impl FromStr for SplitMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "middle" => Ok(SplitMethod::Middle),
            "equalcounts" => Ok(SplitMethod::EqualCounts),
            _ => Err(Error::Config(format!("unknown split method: {s}"))),
        }
    }
}

/// Per-primitive record captured once before building
#[derive(Clone, Copy, Debug)]
pub(crate) struct PrimitiveDigest {
    /// Position in the caller-supplied primitive list
    pub index: usize,
    /// World bound of the primitive
    pub bounds: Aabb,
    /// Bound centroid, the proxy position used for partitioning
    pub centroid: Vec3,
}

impl PrimitiveDigest {
    pub fn new(index: usize, bounds: Aabb) -> Self {
        Self {
            index,
            bounds,
            centroid: bounds.center(),
        }
    }
}

/// Node of the transient build tree, owned by the arena for one build
///
/// A node is a leaf iff `n_primitives > 0`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BuildNode {
    pub bounds: Aabb,
    pub children: Option<(Handle, Handle)>,
    pub split_axis: usize,
    pub first_prim_offset: usize,
    pub n_primitives: usize,
}

impl BuildNode {
    fn leaf(first_prim_offset: usize, n_primitives: usize, bounds: Aabb) -> Self {
        Self {
            bounds,
            children: None,
            split_axis: 0,
            first_prim_offset,
            n_primitives,
        }
    }

    fn interior(split_axis: usize, children: (Handle, Handle), bounds: Aabb) -> Self {
        Self {
            bounds,
            children: Some(children),
            split_axis,
            first_prim_offset: 0,
            n_primitives: 0,
        }
    }
}

/// Recursive builder: partitions digests and emits arena-owned build nodes
///
/// Leaves are emitted for singleton ranges only, so the finished tree always
/// has `2n - 1` nodes for `n` primitives.
pub(crate) struct Builder<'a> {
    primitives: &'a [Arc<dyn Primitive>],
    split_method: SplitMethod,
    /// Primitive list reordered so each leaf addresses a contiguous slice
    pub ordered: Vec<Arc<dyn Primitive>>,
    /// Nodes emitted so far; sizes the flat array exactly
    pub total_nodes: usize,
}

impl<'a> Builder<'a> {
    pub fn new(primitives: &'a [Arc<dyn Primitive>], split_method: SplitMethod) -> Self {
        Self {
            primitives,
            split_method,
            ordered: Vec::with_capacity(primitives.len()),
            total_nodes: 0,
        }
    }

    /// Build the tree over `digests`, returning the root handle
    pub fn build(
        &mut self,
        arena: &mut Arena<BuildNode>,
        digests: &mut [PrimitiveDigest],
    ) -> Handle {
        debug_assert!(!digests.is_empty());
        self.total_nodes += 1;

        let bounds = digests
            .iter()
            .fold(Aabb::EMPTY, |acc, d| acc.merged(&d.bounds));

        if digests.len() == 1 {
            let first_prim_offset = self.ordered.len();
            self.ordered.push(Arc::clone(&self.primitives[digests[0].index]));
            return arena.alloc(BuildNode::leaf(first_prim_offset, 1, bounds));
        }

        let mut centroid_bounds = Aabb::EMPTY;
        for d in digests.iter() {
            centroid_bounds.expand(d.centroid);
        }
        let axis = centroid_bounds.maximum_extent();

        let mid = match self.split_method {
            SplitMethod::Middle => {
                let pivot = (centroid_bounds.min[axis] + centroid_bounds.max[axis]) * 0.5;
                let mid = partition(digests, |d| d.centroid[axis] < pivot);
                if mid == 0 || mid == digests.len() {
                    // Every centroid landed on one side (e.g. coincident
                    // primitives); a median split still makes progress
                    equal_counts_split(digests, axis)
                } else {
                    mid
                }
            }
            SplitMethod::EqualCounts => equal_counts_split(digests, axis),
        };

        let (lo, hi) = digests.split_at_mut(mid);
        let left = self.build(arena, lo);
        let right = self.build(arena, hi);
        let bounds = arena.get(left).bounds.merged(&arena.get(right).bounds);
        arena.alloc(BuildNode::interior(axis, (left, right), bounds))
    }
}

/// Reorder the slice so elements satisfying the predicate precede those
/// that do not; returns the boundary index
fn partition<T>(items: &mut [T], mut pred: impl FnMut(&T) -> bool) -> usize {
    let mut boundary = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}

/// Count-balanced split: partially reorder around the centroid median on
/// `axis` so everything before the median compares at most equal to it
fn equal_counts_split(digests: &mut [PrimitiveDigest], axis: usize) -> usize {
    let mid = digests.len() / 2;
    digests.select_nth_unstable_by(mid, |a, b| {
        a.centroid[axis].total_cmp(&b.centroid[axis])
    });
    mid
}
