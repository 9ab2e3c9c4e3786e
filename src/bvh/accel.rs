//! BVH accelerator: build orchestration and ray traversal

use std::sync::Arc;
use std::time::Instant;

use crate::core::arena::Arena;
use crate::math::{Aabb, Ray};

use super::build::{BuildNode, Builder, PrimitiveDigest, SplitMethod};
use super::flatten::{LinearNode, LinearNodeKind, flatten};
use super::primitive::{Hit, Primitive};

/// Traversal stack capacity
///
/// Trees deeper than this violate a build invariant; the median fallback
/// bounds depth well below it for any realistic primitive count.
const TRAVERSAL_STACK_SIZE: usize = 64;

/// Leaf-count headroom of the flat node encoding
const MAX_PRIMS_IN_NODE: usize = 255;

/// Bounding volume hierarchy over a static set of primitives
///
/// Immutable once built: queries never lock and are safe from any number
/// of threads concurrently. The hierarchy itself satisfies [`Primitive`],
/// so accelerators can be nested inside one another.
pub struct Bvh {
    /// Primitives reordered so each leaf addresses a contiguous slice
    primitives: Vec<Arc<dyn Primitive>>,
    /// Flattened tree in depth-first order; empty for a zero-primitive build
    nodes: Vec<LinearNode>,
}

impl Bvh {
    /// Build a hierarchy over `primitives`
    ///
    /// `max_prims_in_node` is accepted as a hint but not enforced: ranges
    /// larger than one are always split down to singleton leaves.
    /// `split_method` selects the partitioning strategy per interior node.
    pub fn new(
        primitives: Vec<Arc<dyn Primitive>>,
        max_prims_in_node: usize,
        split_method: SplitMethod,
    ) -> Self {
        if primitives.is_empty() {
            log::debug!("BVH build skipped: no primitives");
            return Self {
                primitives,
                nodes: Vec::new(),
            };
        }

        let start = Instant::now();
        let max_prims_in_node = max_prims_in_node.min(MAX_PRIMS_IN_NODE);

        let mut digests: Vec<PrimitiveDigest> = primitives
            .iter()
            .enumerate()
            .map(|(i, p)| PrimitiveDigest::new(i, p.world_bound()))
            .collect();

        let mut arena: Arena<BuildNode> = Arena::new();
        let mut builder = Builder::new(&primitives, split_method);
        let root = builder.build(&mut arena, &mut digests);
        let nodes = flatten(&arena, root, builder.total_nodes);

        log::debug!(
            "built BVH over {} primitives: {} nodes, {} split, {} prims/leaf hint, arena {} kB, {:.2?}",
            primitives.len(),
            nodes.len(),
            split_method,
            max_prims_in_node,
            arena.allocated_bytes() / 1024,
            start.elapsed(),
        );

        Self {
            primitives: builder.ordered,
            nodes,
        }
    }

    /// World-space bound of everything in the hierarchy
    ///
    /// The empty hierarchy reports the empty box.
    pub fn world_bound(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |node| node.bounds)
    }

    /// Number of nodes in the flattened tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of primitives indexed by the hierarchy
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Closest-hit query
    ///
    /// Visits every node whose bound could contain a hit nearer than the
    /// best found so far; `ray.t_max` shrinks with each improvement, so
    /// farther subtrees are pruned by the box tests. Returns the closest
    /// hit along the ray, or None.
    pub fn intersect(&self, ray: &mut Ray) -> Option<Hit> {
        if self.nodes.is_empty() {
            return None;
        }

        let dir_is_neg = ray.dir_is_neg();
        let mut best = None;

        let mut stack = [0u32; TRAVERSAL_STACK_SIZE];
        let mut stack_len = 0usize;
        let mut current = 0usize;

        loop {
            let node = &self.nodes[current];
            if node.bounds.intersect_ray_fast(ray, dir_is_neg) {
                match node.kind {
                    LinearNodeKind::Leaf {
                        first_prim,
                        n_primitives,
                    } => {
                        // Every primitive in the leaf is tested; hits behind
                        // the current best are rejected by the shrunk t_max
                        let first = first_prim as usize;
                        let slice = &self.primitives[first..first + n_primitives as usize];
                        for prim in slice {
                            if let Some(hit) = prim.intersect(ray) {
                                best = Some(hit);
                            }
                        }
                        match pop(&stack, &mut stack_len) {
                            Some(next) => current = next,
                            None => break,
                        }
                    }
                    LinearNodeKind::Interior { second_child, axis } => {
                        debug_assert!(
                            stack_len < TRAVERSAL_STACK_SIZE,
                            "tree deeper than the traversal stack"
                        );
                        // Descend the geometrically nearer child first
                        if dir_is_neg[axis as usize] == 1 {
                            stack[stack_len] = (current + 1) as u32;
                            stack_len += 1;
                            current = second_child as usize;
                        } else {
                            stack[stack_len] = second_child;
                            stack_len += 1;
                            current += 1;
                        }
                    }
                }
            } else {
                match pop(&stack, &mut stack_len) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }

        best
    }

    /// Occlusion query: true as soon as any primitive reports a hit
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let dir_is_neg = ray.dir_is_neg();

        let mut stack = [0u32; TRAVERSAL_STACK_SIZE];
        let mut stack_len = 0usize;
        let mut current = 0usize;

        loop {
            let node = &self.nodes[current];
            if node.bounds.intersect_ray_fast(ray, dir_is_neg) {
                match node.kind {
                    LinearNodeKind::Leaf {
                        first_prim,
                        n_primitives,
                    } => {
                        let first = first_prim as usize;
                        let slice = &self.primitives[first..first + n_primitives as usize];
                        if slice.iter().any(|prim| prim.intersect_p(ray)) {
                            return true;
                        }
                        match pop(&stack, &mut stack_len) {
                            Some(next) => current = next,
                            None => break,
                        }
                    }
                    LinearNodeKind::Interior { second_child, axis } => {
                        debug_assert!(
                            stack_len < TRAVERSAL_STACK_SIZE,
                            "tree deeper than the traversal stack"
                        );
                        if dir_is_neg[axis as usize] == 1 {
                            stack[stack_len] = (current + 1) as u32;
                            stack_len += 1;
                            current = second_child as usize;
                        } else {
                            stack[stack_len] = second_child;
                            stack_len += 1;
                            current += 1;
                        }
                    }
                }
            } else {
                match pop(&stack, &mut stack_len) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }

        false
    }
}

fn pop(stack: &[u32; TRAVERSAL_STACK_SIZE], stack_len: &mut usize) -> Option<usize> {
    if *stack_len == 0 {
        return None;
    }
    *stack_len -= 1;
    Some(stack[*stack_len] as usize)
}

impl Primitive for Bvh {
    fn world_bound(&self) -> Aabb {
        Bvh::world_bound(self)
    }

    fn intersect(&self, ray: &mut Ray) -> Option<Hit> {
        Bvh::intersect(self, ray)
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        Bvh::intersect_p(self, ray)
    }
}
