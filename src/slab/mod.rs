//! Slab decomposition of trees.
//!
//! A slab is a maximal unbranched leafward run of nodes `[s0, s1, ..., sk]`:
//! * `s0` is the root or a branch,
//! * each consecutive pair is a parent → child edge,
//! * `sk` is a branch or a leaf.
//!
//! The slabs of a tree partition its edge set, each edge belonging to exactly
//! one slab. A tree consisting of a single node has exactly one slab of
//! length 1. Slabs are the basis of topological copies (one edge per slab)
//! and of resampling (each slab resampled with its ends fixed).
//!
//! # Example
//! ```
//! use arbor::model::TreeGraph;
//!
//! let tree = TreeGraph::new([(1, 2), (2, 3), (3, 4), (2, 5), (3, 6)]).unwrap();
//! let slabs: Vec<Vec<i64>> = tree.slabs().unwrap().collect();
//! assert_eq!(slabs, vec![vec![1, 2], vec![2, 3], vec![3, 4], vec![3, 6], vec![2, 5]]);
//! ```

use crate::error::{ArborError, Result};
use crate::model::edge_map::EdgeMap;
use crate::model::node::NodeId;
use crate::model::tree_graph::{DepthFirstEdges, TreeGraph};
use std::collections::BTreeSet;

// =#========================================================================#=
// SLABS ITERATOR
// =#========================================================================#=
/// Iterator over the slabs of a tree in depth-first order,
/// children visited in ascending order of id.
pub struct Slabs<'a> {
    tree: &'a TreeGraph,
    edges: DepthFirstEdges<'a>,
    single: Option<NodeId>,
    current: Vec<NodeId>,
}

impl<'a> Slabs<'a> {
    pub(crate) fn new(tree: &'a TreeGraph) -> Result<Self> {
        let root = tree.traversal_root()?;
        let single = root.filter(|_| tree.len() == 1);
        Ok(Slabs {
            tree,
            edges: DepthFirstEdges::new(tree, root, BTreeSet::new()),
            single,
            current: Vec::new(),
        })
    }
}

impl Iterator for Slabs<'_> {
    type Item = Vec<NodeId>;

    fn next(&mut self) -> Option<Vec<NodeId>> {
        if let Some(node) = self.single.take() {
            return Some(vec![node]);
        }

        for (parent, child) in self.edges.by_ref() {
            if self.current.is_empty() {
                self.current.push(parent);
            }
            self.current.push(child);
            // Branch or leaf
            if self.tree.children(child).len() != 1 {
                return Some(std::mem::take(&mut self.current));
            }
        }
        None
    }
}

// =#========================================================================#=
// SLAB FUNCTIONS
// =#========================================================================#=
/// Returns the slab starting at `start` and continuing leafward until a branch
/// or leaf, together with the (ascending) children of that terminator.
///
/// # Errors
/// [ArborError::NotFound] if `start` is not in the tree.
pub fn leafward_slab(tree: &TreeGraph, start: NodeId) -> Result<(Vec<NodeId>, Vec<NodeId>)> {
    if !tree.contains(start) {
        return Err(ArborError::node_not_found(start));
    }

    let mut slab = vec![start];
    let mut last = start;
    loop {
        match tree.children(last) {
            [only] => {
                slab.push(*only);
                last = *only;
            }
            children => return Ok((slab, children.to_vec())),
        }
    }
}

/// Builds a tree from the first and last node of each slab
/// (i.e. the root, branches and leaves).
///
/// # Returns
/// The reduced tree, and for each of its edges the slab it replaces.
/// Single-node slabs become isolated nodes.
pub fn topological_copy_slabs(
    slabs: impl IntoIterator<Item = Vec<NodeId>>,
) -> (TreeGraph, EdgeMap<Vec<NodeId>>) {
    let mut isolated = Vec::new();
    let mut edges = Vec::new();
    let mut full_slabs = EdgeMap::new();

    for slab in slabs {
        match slab.as_slice() {
            [] => {}
            [node] => isolated.push(*node),
            [first, .., last] => {
                edges.push((*first, *last));
                full_slabs.insert(*first, *last, slab.clone());
            }
        }
    }

    (TreeGraph::assemble(isolated, edges), full_slabs)
}
