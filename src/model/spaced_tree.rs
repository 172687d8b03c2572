//! Trees embedded in 3-D space.
//!
//! A [SpacedTree] is a [TreeGraph] whose nodes all have a [Location] and
//! optionally a radius. On top of the topology it derives edge lengths and
//! distances from the root, and provides geometric operations: topological
//! copies carrying path lengths, resampling, and selection of the most
//! significant branches.

use crate::error::{ArborError, Result};
use crate::model::edge_map::{EdgeMap, path_edge_data};
use crate::model::node::{Location, NodeId};
use crate::model::tree_graph::{TreeGraph, TreeStructure};
use crate::resample::Resampler;
use crate::slab::{leafward_slab, topological_copy_slabs};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use std::sync::OnceLock;
use tracing::{debug, instrument};

// =#========================================================================#=
// SPACED TREE
// =#========================================================================#=
/// A rooted tree whose nodes have 3-D locations and optional radii.
///
/// # Invariants
/// - The topology satisfies the [TreeGraph] invariants
/// - `node_loc` has exactly one finite entry per node
/// - `node_radius` has entries for a subset of the nodes, all non-negative
///
/// Dereferences to its [TreeGraph], so all topological queries are available
/// directly.
///
/// # Example
/// ```
/// use arbor::model::{Location, SpacedTree};
/// use std::collections::BTreeMap;
///
/// let locations = BTreeMap::from([
///     (1, Location::new(0.0, 0.0, 0.0)),
///     (2, Location::new(3.0, 4.0, 0.0)),
///     (3, Location::new(3.0, 4.0, 12.0)),
/// ]);
/// let tree = SpacedTree::from_edges([(1, 2), (2, 3)], locations, BTreeMap::new()).unwrap();
/// assert_eq!(tree.edge_length().get(2, 1), Some(&5.0));
/// assert_eq!(tree.distance_from_root().unwrap()[&3], 17.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpacedTree {
    graph: TreeGraph,
    node_loc: BTreeMap<NodeId, Location>,
    node_radius: BTreeMap<NodeId, f64>,
    is_topological_copy: bool,

    edge_length: OnceLock<EdgeMap<f64>>,
    distance_from_root: OnceLock<BTreeMap<NodeId, f64>>,
}

impl PartialEq for SpacedTree {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph
            && self.node_loc == other.node_loc
            && self.node_radius == other.node_radius
    }
}

impl Deref for SpacedTree {
    type Target = TreeGraph;

    fn deref(&self) -> &TreeGraph {
        &self.graph
    }
}

// ============================================================================
// Construction and validation (pub)
// ============================================================================
impl SpacedTree {
    /// Creates and validates a spaced tree.
    ///
    /// # Errors
    /// [ArborError::Structural] if the topology is invalid, locations do not
    /// cover exactly the node set, or radii are given for unknown nodes or
    /// are negative.
    pub fn new(
        graph: TreeGraph,
        node_loc: BTreeMap<NodeId, Location>,
        node_radius: BTreeMap<NodeId, f64>,
    ) -> Result<Self> {
        let tree = Self::new_unchecked(graph, node_loc, node_radius);
        tree.validate()?;
        Ok(tree)
    }

    /// Same as [`SpacedTree::new()`], under the name of the tree it extends.
    pub fn from_tree(
        tree: TreeGraph,
        node_loc: BTreeMap<NodeId, Location>,
        node_radius: BTreeMap<NodeId, f64>,
    ) -> Result<Self> {
        Self::new(tree, node_loc, node_radius)
    }

    /// Creates and validates a spaced tree from parent → child edges.
    ///
    /// The node set is taken from the keys of `node_loc`, so single-node
    /// trees need no edges.
    ///
    /// # Errors
    /// See [`SpacedTree::new()`].
    pub fn from_edges(
        edges: impl IntoIterator<Item = (NodeId, NodeId)>,
        node_loc: BTreeMap<NodeId, Location>,
        node_radius: BTreeMap<NodeId, f64>,
    ) -> Result<Self> {
        let graph = TreeGraph::with_nodes(node_loc.keys().copied(), edges)?;
        Self::new(graph, node_loc, node_radius)
    }

    /// Creates a spaced tree without validation, for operations that
    /// already guarantee the invariants.
    pub(crate) fn new_unchecked(
        graph: TreeGraph,
        node_loc: BTreeMap<NodeId, Location>,
        node_radius: BTreeMap<NodeId, f64>,
    ) -> Self {
        SpacedTree {
            graph,
            node_loc,
            node_radius,
            is_topological_copy: false,
            edge_length: OnceLock::new(),
            distance_from_root: OnceLock::new(),
        }
    }

    /// Returns a tree with no nodes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Checks the invariants, see [SpacedTree].
    ///
    /// # Errors
    /// [ArborError::Structural] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.graph.validate()?;

        if self.node_loc.len() != self.graph.len()
            || !self.graph.nodes().all(|n| self.node_loc.contains_key(&n))
        {
            return Err(ArborError::Structural(
                "node location keys do not match graph nodes".to_string(),
            ));
        }
        if let Some((node, location)) = self.node_loc.iter().find(|(_, l)| !l.is_finite()) {
            return Err(ArborError::Structural(format!(
                "node {node} has non-finite location {location:?}"
            )));
        }
        if let Some(node) = self.node_radius.keys().find(|n| !self.graph.contains(**n)) {
            return Err(ArborError::Structural(format!(
                "radius given for node {node}, which is not in the graph"
            )));
        }
        if let Some((node, radius)) = self.node_radius.iter().find(|(_, r)| r.is_nan() || **r < 0.0) {
            return Err(ArborError::Structural(format!(
                "node {node} has invalid radius {radius}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Accessors and derived geometry (pub)
// ============================================================================
impl SpacedTree {
    /// Returns the topology of this tree.
    pub fn graph(&self) -> &TreeGraph {
        &self.graph
    }

    /// Returns the location of every node.
    pub fn node_loc(&self) -> &BTreeMap<NodeId, Location> {
        &self.node_loc
    }

    /// Returns the radius of the nodes which have one.
    pub fn node_radius(&self) -> &BTreeMap<NodeId, f64> {
        &self.node_radius
    }

    /// Returns the location of `node`, if it is in the tree.
    pub fn location(&self, node: NodeId) -> Option<&Location> {
        self.node_loc.get(&node)
    }

    /// Returns the radius of `node`, if it has one.
    pub fn radius(&self, node: NodeId) -> Option<f64> {
        self.node_radius.get(&node).copied()
    }

    /// Returns whether this tree was produced by a topological copy,
    /// in which case edge lengths are path lengths in the original tree.
    pub fn is_topological_copy(&self) -> bool {
        self.is_topological_copy
    }

    /// Returns the Euclidean length of every edge.
    ///
    /// For topological copies this is the length of the path each edge
    /// replaces.
    pub fn edge_length(&self) -> &EdgeMap<f64> {
        self.edge_length.get_or_init(|| {
            self.graph
                .edges()
                .filter_map(|(parent, child)| {
                    let (p, c) = (self.node_loc.get(&parent)?, self.node_loc.get(&child)?);
                    Some(((parent, child), p.distance(c)))
                })
                .collect()
        })
    }

    /// Returns the distance along the tree from the root to every node.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn distance_from_root(&self) -> Result<&BTreeMap<NodeId, f64>> {
        if let Some(distances) = self.distance_from_root.get() {
            return Ok(distances);
        }

        let edge_length = self.edge_length();
        let mut distances = BTreeMap::new();
        if let Some(root) = self.graph.traversal_root()? {
            distances.insert(root, 0.0);
            for (parent, child) in self.graph.topological_edges()? {
                let parent_distance = distances.get(&parent).copied().unwrap_or(0.0);
                let length = edge_length
                    .get(parent, child)
                    .copied()
                    .ok_or_else(|| ArborError::missing_node(child))?;
                distances.insert(child, parent_distance + length);
            }
        }
        Ok(self.distance_from_root.get_or_init(|| distances))
    }

    /// Returns the total length of all edges.
    pub fn cable_length(&self) -> f64 {
        self.edge_length().iter().map(|(_, length)| length).sum()
    }
}

// ============================================================================
// Derived trees (pub)
// ============================================================================
impl SpacedTree {
    /// Returns a tree containing only the root, branches and leaves, one edge
    /// per slab; edge lengths are the path lengths of the replaced slabs.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn topological_copy(&self) -> Result<SpacedTree> {
        let (copy, _) = self.reduced()?;
        Ok(copy)
    }

    /// Like [`SpacedTree::topological_copy()`], additionally reducing
    /// per-edge `confidence` onto the new edges: each gets the minimum
    /// confidence along the slab it replaces.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn topological_copy_with_confidence<C>(
        &self,
        confidence: &EdgeMap<C>,
    ) -> Result<(SpacedTree, EdgeMap<C>)>
    where
        C: Copy + PartialOrd,
    {
        let (copy, slabs) = self.reduced()?;
        let reduced_confidence = slabs
            .iter()
            .filter_map(|(&(u, v), slab)| {
                path_edge_data(slab, confidence)
                    .copied()
                    .reduce(|a, b| if b < a { b } else { a })
                    .map(|min| ((u, v), min))
            })
            .collect();
        Ok((copy, reduced_confidence))
    }

    /// Topological copy plus the slab each reduced edge replaces.
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn reduced(&self) -> Result<(SpacedTree, EdgeMap<Vec<NodeId>>)> {
        let (graph, slabs) = topological_copy_slabs(self.graph.slabs()?);
        let distances = self.distance_from_root()?;

        let edge_length: EdgeMap<f64> = graph
            .edges()
            .map(|(u, v)| {
                let (du, dv) = (
                    distances.get(&u).copied().unwrap_or(0.0),
                    distances.get(&v).copied().unwrap_or(0.0),
                );
                ((u, v), dv - du)
            })
            .collect();

        let keep = graph.node_set();
        let mut copy = self.with_graph(graph);
        copy.node_loc.retain(|n, _| keep.contains(n));
        copy.node_radius.retain(|n, _| keep.contains(n));
        copy.edge_length = OnceLock::from(edge_length);
        copy.is_topological_copy = true;

        debug!(nodes = copy.len(), "topological copy");
        Ok((copy, slabs))
    }

    /// Resamples this tree so that no edge is longer than `max_edge_length`.
    ///
    /// See [crate::resample] for details; use a [Resampler] for more control.
    ///
    /// # Panics
    /// Panics if `max_edge_length` is not positive and finite.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn resample(&self, max_edge_length: f64) -> Result<SpacedTree> {
        Resampler::new(max_edge_length).resample(self)
    }

    /// Returns for every branch the length of cable hanging directly off it:
    /// the summed path length from the branch down to the next deeper branch
    /// or leaf, over all its children.
    ///
    /// Computed by walking from every leaf towards the root. A branch is only
    /// walked past once all of its children have credited it.
    ///
    /// # Errors
    /// [ArborError::Structural] if an edge length is missing.
    pub fn length_below_branches(&self) -> Result<BTreeMap<NodeId, f64>> {
        let edge_length = self.edge_length();
        let mut remaining: BTreeMap<NodeId, usize> = self.graph.branches().clone();
        let mut out: BTreeMap<NodeId, f64> = BTreeMap::new();
        let mut starts: Vec<NodeId> = self.graph.leaves().iter().rev().copied().collect();

        while let Some(start) = starts.pop() {
            let mut previous = start;
            let mut accumulated = 0.0;
            while let Some(current) = self.graph.parent(previous) {
                let length = edge_length
                    .get(previous, current)
                    .copied()
                    .ok_or_else(|| ArborError::missing_node(previous))?;

                match remaining.get_mut(&current) {
                    Some(count) => {
                        *out.entry(current).or_insert(0.0) += accumulated + length;
                        *count -= 1;
                        if *count == 0 {
                            // All children in: continue upwards from this branch
                            starts.push(current);
                        }
                        break;
                    }
                    None => {
                        accumulated += length;
                        previous = current;
                    }
                }
            }
        }

        Ok(out)
    }

    /// Returns the tree restricted to the root and the `n_branches` branches
    /// with the most cable directly below them (see
    /// [`SpacedTree::length_below_branches()`]).
    ///
    /// Walks leafward from the root slab by slab, only descending past a
    /// branch if it is retained. Ties are broken in favour of the smaller id.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn significant_branches(&self, n_branches: usize) -> Result<SpacedTree> {
        let keep = self.significant_branch_nodes(n_branches)?;
        Ok(self.induced_copy(&keep))
    }

    /// Node set retained by [`SpacedTree::significant_branches()`].
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn significant_branch_nodes(&self, n_branches: usize) -> Result<BTreeSet<NodeId>> {
        let Some(root) = self.graph.traversal_root()? else {
            return Ok(BTreeSet::new());
        };

        let mut ranked: Vec<(NodeId, f64)> = self.length_below_branches()?.into_iter().collect();
        ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        let retained: BTreeSet<NodeId> =
            ranked.into_iter().take(n_branches).map(|(n, _)| n).collect();

        let mut keep = BTreeSet::from([root]);
        let mut to_visit = vec![root];
        while let Some(start) = to_visit.pop() {
            let (slab, children) = leafward_slab(&self.graph, start)?;
            let Some(&terminator) = slab.last() else {
                continue;
            };
            keep.extend(slab);
            if retained.contains(&terminator) {
                to_visit.extend(children);
            }
        }

        debug!(kept = keep.len(), "significant branches");
        Ok(keep)
    }
}

impl TreeStructure for SpacedTree {
    fn graph(&self) -> &TreeGraph {
        &self.graph
    }

    fn induced_copy(&self, nodes: &BTreeSet<NodeId>) -> Self {
        let mut copy = SpacedTree::new_unchecked(
            self.graph.induced(nodes),
            subset_map(&self.node_loc, nodes),
            subset_map(&self.node_radius, nodes),
        );
        copy.carry_path_lengths(self, |u, v| nodes.contains(&u) && nodes.contains(&v));
        copy
    }

    fn with_graph(&self, graph: TreeGraph) -> Self {
        let mut copy =
            SpacedTree::new_unchecked(graph, self.node_loc.clone(), self.node_radius.clone());
        copy.carry_path_lengths(self, |_, _| true);
        copy
    }

    fn empty_copy(&self) -> Self {
        SpacedTree::empty()
    }
}

impl SpacedTree {
    /// Path lengths of a topological copy cannot be recomputed from the
    /// locations, so derived trees inherit them.
    fn carry_path_lengths<F>(&mut self, source: &SpacedTree, keep: F)
    where
        F: FnMut(NodeId, NodeId) -> bool,
    {
        if !source.is_topological_copy {
            return;
        }
        self.is_topological_copy = true;
        self.edge_length = OnceLock::from(source.edge_length().filtered(keep));
    }
}

/// Entries of `data` whose key is in `keys`.
pub(crate) fn subset_map<V: Clone>(
    data: &BTreeMap<NodeId, V>,
    keys: &BTreeSet<NodeId>,
) -> BTreeMap<NodeId, V> {
    data.iter()
        .filter(|(k, _)| keys.contains(k))
        .map(|(&k, v)| (k, v.clone()))
        .collect()
}
