//! Serialization of the build tree into a flat depth-first array

use crate::core::arena::{Arena, Handle};
use crate::math::Aabb;

use super::build::BuildNode;

/// Node of the flattened tree
///
/// Fixed-size so the node array stays cache friendly. The payload is a
/// tagged variant standing in for the leaf/interior offset union, keeping
/// the convention that a node is a leaf iff its primitive count is nonzero.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LinearNode {
    pub bounds: Aabb,
    pub kind: LinearNodeKind,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum LinearNodeKind {
    Leaf {
        /// Offset of the leaf's slice in the reordered primitive list
        first_prim: u32,
        n_primitives: u16,
    },
    Interior {
        /// Offset of the second child; the first child is always the next
        /// array element
        second_child: u32,
        axis: u8,
    },
}

impl LinearNode {
    fn leaf(bounds: Aabb, first_prim: u32, n_primitives: u16) -> Self {
        Self {
            bounds,
            kind: LinearNodeKind::Leaf {
                first_prim,
                n_primitives,
            },
        }
    }

    fn interior(bounds: Aabb, axis: u8) -> Self {
        Self {
            bounds,
            kind: LinearNodeKind::Interior {
                second_child: 0,
                axis,
            },
        }
    }

    fn set_second_child(&mut self, offset: u32) {
        match &mut self.kind {
            LinearNodeKind::Interior { second_child, .. } => *second_child = offset,
            LinearNodeKind::Leaf { .. } => debug_assert!(false, "patched a leaf node"),
        }
    }
}

/// Serialize the build tree into a contiguous depth-first array
///
/// Iterative with an explicit stack. Visiting a node assigns the next
/// sequential offset; an interior node's left child is pushed last so it
/// serializes at `parent + 1`, while the right child's stack entry carries
/// the parent offset and patches `second_child` the moment the right child
/// is assigned its own slot.
pub(crate) fn flatten(
    arena: &Arena<BuildNode>,
    root: Handle,
    total_nodes: usize,
) -> Vec<LinearNode> {
    let mut nodes: Vec<LinearNode> = Vec::with_capacity(total_nodes);
    // (offset of the interior node this entry's slot gets patched into, node)
    let mut stack: Vec<(Option<usize>, Handle)> = vec![(None, root)];

    while let Some((patch, handle)) = stack.pop() {
        let offset = nodes.len();
        if let Some(parent) = patch {
            nodes[parent].set_second_child(offset as u32);
        }

        let node = arena.get(handle);
        match node.children {
            None => nodes.push(LinearNode::leaf(
                node.bounds,
                node.first_prim_offset as u32,
                node.n_primitives as u16,
            )),
            Some((left, right)) => {
                nodes.push(LinearNode::interior(node.bounds, node.split_axis as u8));
                stack.push((Some(offset), right));
                stack.push((None, left));
            }
        }
    }

    debug_assert_eq!(nodes.len(), total_nodes);
    nodes
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bvh::build::{Builder, PrimitiveDigest, SplitMethod};
    use crate::bvh::primitive::{BoxPrimitive, Primitive};
    use crate::core::types::Vec3;

    fn flat_tree(n: usize, split_method: SplitMethod) -> (Vec<LinearNode>, usize) {
        let primitives: Vec<Arc<dyn Primitive>> = (0..n)
            .map(|i| {
                let center = Vec3::new(i as f32 * 3.0, (i % 4) as f32, (i % 7) as f32);
                Arc::new(BoxPrimitive::new(Aabb::from_center_half_extent(
                    center,
                    Vec3::ONE,
                ))) as Arc<dyn Primitive>
            })
            .collect();
        let mut digests: Vec<PrimitiveDigest> = primitives
            .iter()
            .enumerate()
            .map(|(i, p)| PrimitiveDigest::new(i, p.world_bound()))
            .collect();

        let mut arena = Arena::new();
        let mut builder = Builder::new(&primitives, split_method);
        let root = builder.build(&mut arena, &mut digests);
        (flatten(&arena, root, builder.total_nodes), n)
    }

    /// Walk the subtree rooted at `offset`, checking the first-child and
    /// second-child offset invariants; returns the subtree node count
    fn check_subtree(nodes: &[LinearNode], offset: usize) -> usize {
        match nodes[offset].kind {
            LinearNodeKind::Leaf { .. } => 1,
            LinearNodeKind::Interior { second_child, .. } => {
                let left = check_subtree(nodes, offset + 1);
                assert_eq!(
                    second_child as usize,
                    offset + 1 + left,
                    "second child offset must follow the whole first subtree"
                );
                left + 1 + check_subtree(nodes, second_child as usize)
            }
        }
    }

    #[test]
    fn test_flat_layout_invariants() {
        for method in [SplitMethod::Middle, SplitMethod::EqualCounts] {
            for n in [1usize, 2, 5, 16, 33] {
                let (nodes, n) = flat_tree(n, method);
                assert_eq!(nodes.len(), 2 * n - 1);
                assert_eq!(check_subtree(&nodes, 0), nodes.len());
            }
        }
    }

    #[test]
    fn test_leaves_partition_ordered_primitives() {
        let (nodes, n) = flat_tree(33, SplitMethod::Middle);
        let mut firsts: Vec<u32> = nodes
            .iter()
            .filter_map(|node| match node.kind {
                LinearNodeKind::Leaf { first_prim, n_primitives } => {
                    assert_eq!(n_primitives, 1);
                    Some(first_prim)
                }
                LinearNodeKind::Interior { .. } => None,
            })
            .collect();
        firsts.sort_unstable();
        let expected: Vec<u32> = (0..n as u32).collect();
        assert_eq!(firsts, expected);
    }

    #[test]
    fn test_single_primitive_is_one_leaf() {
        let (nodes, _) = flat_tree(1, SplitMethod::Middle);
        assert_eq!(nodes.len(), 1);
        assert!(matches!(
            nodes[0].kind,
            LinearNodeKind::Leaf { first_prim: 0, n_primitives: 1 }
        ));
    }
}
