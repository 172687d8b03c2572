//! Rooted tree topology.
//!
//! Provides the minimal rooted-tree abstraction everything else builds on:
//! * [TreeGraph] - nodes with a parent pointer and a sorted child list,
//!   validated once at construction and immutable afterwards.
//! * [TreeStructure] - trait for tree types (plain, spaced, annotated) which
//!   derive new instances of themselves from a subset of nodes; provides
//!   rerooting, subtree extraction, pruning and cutting for all of them.
//! * Iterators: [AncestorsPath], [DepthFirstEdges], [TopologicalEdges],
//!   [PreOrderIter], [PostOrderIter].
//!
//! Derived quantities (root, leaves, branches, Strahler numbers, steps from
//! root) are computed on first access and cached for the lifetime of the
//! instance.

use crate::error::{ArborError, Result};
use crate::model::node::NodeId;
use crate::slab::{self, Slabs};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;
use tracing::{debug, instrument, trace};

// =#========================================================================#=
// NODE LINKS
// =#========================================================================#=
/// Adjacency of a single node: its parent (`None` for the root) and its
/// children in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct NodeLinks {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl NodeLinks {
    fn add_child(&mut self, child: NodeId) {
        if let Err(pos) = self.children.binary_search(&child) {
            self.children.insert(pos, child);
        }
    }

    fn remove_child(&mut self, child: NodeId) {
        if let Ok(pos) = self.children.binary_search(&child) {
            self.children.remove(pos);
        }
    }
}

/// Lazily computed, immutable-once-set derived values.
#[derive(Debug, Clone, Default)]
struct TreeCache {
    root: OnceLock<Result<NodeId>>,
    leaves_branches: OnceLock<(BTreeSet<NodeId>, BTreeMap<NodeId, usize>)>,
    strahler: OnceLock<BTreeMap<NodeId, u32>>,
    steps_from_root: OnceLock<BTreeMap<NodeId, usize>>,
}

// =#========================================================================#=
// TREE GRAPH
// =#========================================================================#=
/// A rooted out-tree over [NodeId]s, edges pointing parent → child.
///
/// # Invariants
/// Checked by [`TreeGraph::validate()`] at construction and never broken by
/// any operation:
/// - Exactly one node has no parent (the root), unless the tree is empty
/// - Every other node has exactly one parent
/// - Every node is reachable from the root (no cycles)
///
/// # Example
/// ```
/// use arbor::model::TreeGraph;
///
/// //     1
/// //     |
/// //     2
/// //    / \
/// //   3   5
/// //  / \
/// // 4   6
/// let tree = TreeGraph::new([(1, 2), (2, 3), (3, 4), (2, 5), (3, 6)]).unwrap();
/// assert_eq!(tree.root().unwrap(), 1);
/// assert_eq!(tree.branches().get(&2), Some(&2));
/// assert!(tree.leaves().contains(&4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeGraph {
    nodes: BTreeMap<NodeId, NodeLinks>,
    cache: TreeCache,
}

impl PartialEq for TreeGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for TreeGraph {}

// ============================================================================
// Construction and validation (pub)
// ============================================================================
impl TreeGraph {
    /// Builds and validates a tree from parent → child edges.
    ///
    /// # Errors
    /// [ArborError::Structural] if a node has several parents, there is not
    /// exactly one root, or the edges contain a cycle.
    pub fn new(edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> Result<Self> {
        Self::with_nodes(std::iter::empty(), edges)
    }

    /// Builds and validates a tree from a node set and parent → child edges.
    ///
    /// Nodes only need to be listed if they take part in no edge,
    /// i.e. for a single-node tree.
    ///
    /// # Errors
    /// See [`TreeGraph::new()`].
    pub fn with_nodes(
        nodes: impl IntoIterator<Item = NodeId>,
        edges: impl IntoIterator<Item = (NodeId, NodeId)>,
    ) -> Result<Self> {
        let mut links: BTreeMap<NodeId, NodeLinks> =
            nodes.into_iter().map(|n| (n, NodeLinks::default())).collect();

        for (parent, child) in edges {
            links.entry(parent).or_default();
            let child_links = links.entry(child).or_default();
            match child_links.parent {
                Some(existing) if existing == parent => continue,
                Some(existing) => {
                    return Err(ArborError::multiple_parents(child, &[existing, parent]));
                }
                None => child_links.parent = Some(parent),
            }
            if let Some(parent_links) = links.get_mut(&parent) {
                parent_links.add_child(child);
            }
        }

        let tree = Self::from_links(links);
        tree.validate()?;
        Ok(tree)
    }

    /// Returns a tree with no nodes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Checks the tree invariants.
    ///
    /// An empty tree is valid. Otherwise:
    /// - exactly one node has no parent
    /// - parent and child lists agree with each other
    /// - all nodes are reachable from the root
    ///
    /// # Errors
    /// [ArborError::Structural] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Ok(());
        }

        let roots: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, links)| links.parent.is_none())
            .map(|(&n, _)| n)
            .collect();
        if roots.len() != 1 {
            return Err(ArborError::root_count(roots.len()));
        }

        for (&node, links) in &self.nodes {
            if let Some(parent) = links.parent {
                let parent_links = self.nodes.get(&parent).ok_or_else(|| ArborError::missing_node(parent))?;
                if parent_links.children.binary_search(&node).is_err() {
                    return Err(ArborError::Structural(format!(
                        "node {node} names {parent} as parent, but is not its child"
                    )));
                }
            }
            for child in &links.children {
                let child_links = self.nodes.get(child).ok_or_else(|| ArborError::missing_node(*child))?;
                if child_links.parent != Some(node) {
                    return Err(ArborError::Structural(format!(
                        "node {child} is a child of {node}, but names {:?} as parent",
                        child_links.parent
                    )));
                }
            }
        }

        // Single parents and a single root: anything not reachable sits on a cycle
        let mut reached = 0;
        let mut stack = vec![roots[0]];
        while let Some(node) = stack.pop() {
            reached += 1;
            stack.extend(self.children(node));
        }
        if reached != self.nodes.len() {
            return Err(ArborError::unreachable(self.nodes.len() - reached));
        }

        Ok(())
    }

    /// Builds a tree straight from adjacency, skipping validation.
    pub(crate) fn from_links(nodes: BTreeMap<NodeId, NodeLinks>) -> Self {
        TreeGraph {
            nodes,
            cache: TreeCache::default(),
        }
    }

    /// Builds a tree from nodes and edges known to form a tree, skipping validation.
    pub(crate) fn assemble(
        nodes: impl IntoIterator<Item = NodeId>,
        edges: impl IntoIterator<Item = (NodeId, NodeId)>,
    ) -> Self {
        let mut links: BTreeMap<NodeId, NodeLinks> =
            nodes.into_iter().map(|n| (n, NodeLinks::default())).collect();
        for (parent, child) in edges {
            links.entry(parent).or_default().add_child(child);
            links.entry(child).or_default().parent = Some(parent);
        }
        Self::from_links(links)
    }

    /// Copy of the subgraph induced by `keep`, skipping validation.
    ///
    /// Callers guarantee `keep` is connected, so the result is a tree.
    pub(crate) fn induced(&self, keep: &BTreeSet<NodeId>) -> Self {
        let nodes = self
            .nodes
            .iter()
            .filter(|(n, _)| keep.contains(n))
            .map(|(&n, links)| {
                let links = NodeLinks {
                    parent: links.parent.filter(|p| keep.contains(p)),
                    children: links
                        .children
                        .iter()
                        .copied()
                        .filter(|c| keep.contains(c))
                        .collect(),
                };
                (n, links)
            })
            .collect();
        Self::from_links(nodes)
    }
}

// ============================================================================
// Accessors (pub)
// ============================================================================
impl TreeGraph {
    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether `node` is in this tree.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Iterates over all nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Returns the node set.
    pub fn node_set(&self) -> BTreeSet<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Iterates over all parent → child edges, ordered by child.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes
            .iter()
            .filter_map(|(&n, links)| links.parent.map(|p| (p, n)))
    }

    /// Returns the number of edges.
    pub fn num_edges(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Returns the parent of `node`, or `None` for the root and absent nodes.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|links| links.parent)
    }

    /// Returns the children of `node` in ascending order
    /// (empty for leaves and absent nodes).
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|links| links.children.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the unique node without a parent.
    ///
    /// # Errors
    /// [ArborError::Structural] if there are zero (empty tree) or several candidates.
    pub fn root(&self) -> Result<NodeId> {
        self.cache
            .root
            .get_or_init(|| {
                let roots: Vec<NodeId> = self
                    .nodes
                    .iter()
                    .filter(|(_, links)| links.parent.is_none())
                    .map(|(&n, _)| n)
                    .collect();
                match roots.as_slice() {
                    [root] => Ok(*root),
                    _ => Err(ArborError::root_count(roots.len())),
                }
            })
            .clone()
    }

    /// Root to start traversals from; `None` for the empty tree.
    pub(crate) fn traversal_root(&self) -> Result<Option<NodeId>> {
        if self.is_empty() {
            Ok(None)
        } else {
            self.root().map(Some)
        }
    }

    /// Returns the set of leaves (nodes without children).
    pub fn leaves(&self) -> &BTreeSet<NodeId> {
        &self.leaves_branches().0
    }

    /// Returns the branch nodes (more than one child), mapped to their number of children.
    pub fn branches(&self) -> &BTreeMap<NodeId, usize> {
        &self.leaves_branches().1
    }

    fn leaves_branches(&self) -> &(BTreeSet<NodeId>, BTreeMap<NodeId, usize>) {
        self.cache.leaves_branches.get_or_init(|| {
            let mut leaves = BTreeSet::new();
            let mut branches = BTreeMap::new();
            for (&n, links) in &self.nodes {
                match links.children.len() {
                    0 => {
                        leaves.insert(n);
                    }
                    1 => {}
                    degree => {
                        branches.insert(n, degree);
                    }
                }
            }
            (leaves, branches)
        })
    }

    /// Returns the Strahler number of every node.
    ///
    /// Leaves have order 1. An internal node takes the maximum order among its
    /// children, incremented by one if that maximum is shared by more than
    /// one child.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn strahler_numbers(&self) -> Result<&BTreeMap<NodeId, u32>> {
        if let Some(strahler) = self.cache.strahler.get() {
            return Ok(strahler);
        }
        let root = self.traversal_root()?;

        Ok(self.cache.strahler.get_or_init(|| {
            let mut strahler: BTreeMap<NodeId, u32> = BTreeMap::new();
            let Some(root) = root else {
                return strahler;
            };
            for node in self.post_order_iter_from(root) {
                let mut max_order = 0;
                let mut max_count = 0;
                for child in self.children(node) {
                    let order = strahler.get(child).copied().unwrap_or(1);
                    if order > max_order {
                        max_order = order;
                        max_count = 1;
                    } else if order == max_order {
                        max_count += 1;
                    }
                }
                let order = match max_count {
                    0 => 1,
                    1 => max_order,
                    _ => max_order + 1,
                };
                strahler.insert(node, order);
            }
            strahler
        }))
    }

    /// Returns the number of edges between the root and every node.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn steps_from_root(&self) -> Result<&BTreeMap<NodeId, usize>> {
        if let Some(steps) = self.cache.steps_from_root.get() {
            return Ok(steps);
        }
        let mut steps = BTreeMap::new();
        if let Some(root) = self.traversal_root()? {
            steps.insert(root, 0);
            for (parent, child) in self.topological_edges()? {
                let parent_steps = steps.get(&parent).copied().unwrap_or(0);
                steps.insert(child, parent_steps + 1);
            }
        }
        Ok(self.cache.steps_from_root.get_or_init(|| steps))
    }
}

// ============================================================================
// Traversals (pub)
// ============================================================================
impl TreeGraph {
    /// Iterates from `node` up to the root: `node`, its parent, its
    /// grandparent, ..., the root.
    ///
    /// # Errors
    /// [ArborError::NotFound] if `node` is not in the tree.
    pub fn ancestors_path(&self, node: NodeId) -> Result<AncestorsPath<'_>> {
        if !self.contains(node) {
            return Err(ArborError::node_not_found(node));
        }
        Ok(AncestorsPath {
            tree: self,
            next: Some(node),
        })
    }

    /// Iterates over parent → child edges in depth-first order.
    ///
    /// Children are visited in ascending order of id. Nodes in `stop_at` are
    /// not visited, nor is anything below them. Edges are only yielded
    /// within the subtree of `start`, which defaults to the root.
    ///
    /// # Errors
    /// [ArborError::NotFound] if `start` is not in the tree;
    /// [ArborError::Structural] if no start is given and the root cannot be determined.
    pub fn depth_first_edges(
        &self,
        start: Option<NodeId>,
        stop_at: &[NodeId],
    ) -> Result<DepthFirstEdges<'_>> {
        let start = match start {
            Some(node) if !self.contains(node) => return Err(ArborError::node_not_found(node)),
            Some(node) => Some(node),
            None => self.traversal_root()?,
        };
        Ok(DepthFirstEdges::new(self, start, stop_at.iter().copied().collect()))
    }

    /// Iterates over parent → child edges such that every parent is reached
    /// before its children (breadth-first from the root).
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn topological_edges(&self) -> Result<TopologicalEdges<'_>> {
        let mut queue = VecDeque::new();
        if let Some(root) = self.traversal_root()? {
            queue.push_back(root);
        }
        Ok(TopologicalEdges {
            tree: self,
            queue,
            pending: VecDeque::new(),
        })
    }

    /// Iterates over nodes in pre-order (parents before children,
    /// children in ascending order).
    pub fn pre_order_iter(&self) -> Result<PreOrderIter<'_>> {
        let stack = self.traversal_root()?.into_iter().collect();
        Ok(PreOrderIter { tree: self, stack })
    }

    /// Iterates over nodes in post-order (children before parents,
    /// children in ascending order).
    pub fn post_order_iter(&self) -> Result<PostOrderIter<'_>> {
        let stack = self
            .traversal_root()?
            .map(|root| (root, false))
            .into_iter()
            .collect();
        Ok(PostOrderIter { tree: self, stack })
    }

    fn post_order_iter_from(&self, start: NodeId) -> PostOrderIter<'_> {
        PostOrderIter {
            tree: self,
            stack: vec![(start, false)],
        }
    }

    /// Iterates over the slabs of this tree in depth-first order.
    ///
    /// See [crate::slab] for details.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn slabs(&self) -> Result<Slabs<'_>> {
        Slabs::new(self)
    }

    /// Returns a tree containing only the root, branches and leaves,
    /// with one edge per slab from its first to its last node.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    #[instrument(level = "debug", skip(self))]
    pub fn topological_copy(&self) -> Result<TreeGraph> {
        let (graph, _) = slab::topological_copy_slabs(self.slabs()?);
        debug!(nodes = graph.len(), "topological copy");
        Ok(graph)
    }
}

// ============================================================================
// Node sets for derived trees (crate)
// ============================================================================
impl TreeGraph {
    /// `start` plus everything below it, not descending past `stop_at`.
    pub(crate) fn collect_below(&self, start: NodeId, stop_at: &BTreeSet<NodeId>) -> BTreeSet<NodeId> {
        let mut keep = BTreeSet::from([start]);
        keep.extend(DepthFirstEdges::new(self, Some(start), stop_at.clone()).map(|(_, child)| child));
        keep
    }

    /// Adjacency with the path from the old root to `new_root` reversed.
    pub(crate) fn rerooted(&self, new_root: NodeId) -> Result<TreeGraph> {
        let path: Vec<NodeId> = self.ancestors_path(new_root)?.collect();
        let mut nodes = self.nodes.clone();

        for pair in path.windows(2) {
            let (node, parent) = (pair[0], pair[1]);
            if let Some(links) = nodes.get_mut(&parent) {
                links.remove_child(node);
                links.parent = Some(node);
            }
            if let Some(links) = nodes.get_mut(&node) {
                links.add_child(parent);
            }
        }
        if let Some(links) = nodes.get_mut(&new_root) {
            links.parent = None;
        }

        trace!(path_len = path.len(), "reversed edges on path to new root");
        Ok(Self::from_links(nodes))
    }

    /// Nodes kept when pruning at `nodes`; `None` if the whole tree goes.
    pub(crate) fn prune_keep_set(&self, nodes: &[NodeId]) -> Result<Option<BTreeSet<NodeId>>> {
        let Some(root) = self.traversal_root()? else {
            return Ok(None);
        };
        if nodes.contains(&root) {
            return Ok(None);
        }
        let stop_at: BTreeSet<NodeId> = nodes.iter().copied().collect();
        Ok(Some(self.collect_below(root, &stop_at)))
    }

    /// For each node, the child of its nearest enclosing branch on the path
    /// towards it (the node itself if its parent is a branch).
    pub(crate) fn branch_cut_points(&self, nodes: &[NodeId]) -> Result<Vec<NodeId>> {
        let branches = self.branches();
        let mut cut_points = BTreeSet::new();
        for &start in nodes {
            let mut this = start;
            for next in self.ancestors_path(start)? {
                if next != this && branches.contains_key(&next) {
                    cut_points.insert(this);
                    break;
                }
                this = next;
            }
        }
        Ok(cut_points.into_iter().collect())
    }

    /// Node sets of the pieces yielded by cutting at `cuts`, in order.
    pub(crate) fn cut_sets(&self, cuts: &[NodeId]) -> Result<Vec<(NodeId, BTreeSet<NodeId>)>> {
        let Some(root) = self.traversal_root()? else {
            return Ok(Vec::new());
        };

        let mut ordered: Vec<NodeId> = Vec::with_capacity(cuts.len() + 1);
        for &cut in cuts {
            if self.contains(cut) && !ordered.contains(&cut) {
                ordered.push(cut);
            }
        }
        let cut_set: BTreeSet<NodeId> = ordered.iter().copied().collect();
        if !cut_set.contains(&root) {
            ordered.push(root);
        }

        Ok(ordered
            .into_iter()
            .map(|cut| (cut, self.collect_below(cut, &cut_set)))
            .collect())
    }
}

// =#========================================================================#=
// TREE STRUCTURE TRAIT
// =#========================================================================#=
/// Tree types which can produce new instances of themselves from a subset of
/// their nodes or a rerooted topology.
///
/// Implementors only provide access to their [TreeGraph] and the two ways of
/// deriving a copy; rerooting, subtree extraction, pruning and cutting are
/// provided on top. Attribute data (locations, radii, confidences, ...)
/// is filtered to the surviving nodes by the implementor.
pub trait TreeStructure: Sized {
    /// Returns the topology of this tree.
    fn graph(&self) -> &TreeGraph;

    /// Returns a copy restricted to `nodes`, which must be connected.
    fn induced_copy(&self, nodes: &BTreeSet<NodeId>) -> Self;

    /// Returns a copy on the same node set with a new topology.
    fn with_graph(&self, graph: TreeGraph) -> Self;

    /// Returns a copy without any nodes.
    fn empty_copy(&self) -> Self;

    /// Returns a copy with `new_root` as root, reversing the edges on the path
    /// from the old root; all other edges are unchanged.
    ///
    /// # Errors
    /// [ArborError::NotFound] if `new_root` is not in the tree.
    #[instrument(level = "debug", skip(self))]
    fn reroot(&self, new_root: NodeId) -> Result<Self> {
        let graph = self.graph().rerooted(new_root)?;
        Ok(self.with_graph(graph))
    }

    /// Returns the subtree consisting of `node` and all its descendants.
    ///
    /// # Errors
    /// [ArborError::NotFound] if `node` is not in the tree.
    fn subtree_below(&self, node: NodeId) -> Result<Self> {
        if !self.graph().contains(node) {
            return Err(ArborError::node_not_found(node));
        }
        let keep = self.graph().collect_below(node, &BTreeSet::new());
        Ok(self.induced_copy(&keep))
    }

    /// Same as [`TreeStructure::subtree_below()`].
    fn copy_below(&self, node: NodeId) -> Result<Self> {
        self.subtree_below(node)
    }

    /// Returns a copy without `nodes` and all of their descendants.
    ///
    /// Pruning at the root yields an empty tree.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    #[instrument(level = "debug", skip(self))]
    fn prune_at(&self, nodes: &[NodeId]) -> Result<Self> {
        match self.graph().prune_keep_set(nodes)? {
            Some(keep) => {
                debug!(kept = keep.len(), "pruned");
                Ok(self.induced_copy(&keep))
            }
            None => Ok(self.empty_copy()),
        }
    }

    /// Discards, for each of `nodes`, the part of the tree hanging off its
    /// nearest enclosing branch which contains it.
    ///
    /// Walking from each node towards the root, the first branch other than
    /// the node itself marks the cut: its child on that path is pruned.
    /// Nodes without such a branch are ignored.
    ///
    /// # Errors
    /// [ArborError::NotFound] if one of `nodes` is not in the tree.
    fn prune_branches_containing(&self, nodes: &[NodeId]) -> Result<Self> {
        let cut_points = self.graph().branch_cut_points(nodes)?;
        self.prune_at(&cut_points)
    }

    /// Splits the tree at `cuts`.
    ///
    /// For each cut node (in the given order, followed by the original root if
    /// it is not among them) returns a tree rooted there, extending leafward
    /// until a leaf or another cut node, which is excluded. Cut nodes not in
    /// the tree are skipped.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    #[instrument(level = "debug", skip(self))]
    fn cut(&self, cuts: &[NodeId]) -> Result<Vec<Self>> {
        let pieces = self.graph().cut_sets(cuts)?;
        debug!(pieces = pieces.len(), "cut");
        Ok(pieces
            .iter()
            .map(|(_, keep)| self.induced_copy(keep))
            .collect())
    }
}

impl TreeStructure for TreeGraph {
    fn graph(&self) -> &TreeGraph {
        self
    }

    fn induced_copy(&self, nodes: &BTreeSet<NodeId>) -> Self {
        self.induced(nodes)
    }

    fn with_graph(&self, graph: TreeGraph) -> Self {
        graph
    }

    fn empty_copy(&self) -> Self {
        TreeGraph::empty()
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator from a node up to the root, see [`TreeGraph::ancestors_path()`].
pub struct AncestorsPath<'a> {
    tree: &'a TreeGraph,
    next: Option<NodeId>,
}

impl Iterator for AncestorsPath<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.next?;
        self.next = self.tree.parent(node);
        Some(node)
    }
}

/// Depth-first iterator over parent → child edges,
/// see [`TreeGraph::depth_first_edges()`].
pub struct DepthFirstEdges<'a> {
    tree: &'a TreeGraph,
    stack: Vec<(NodeId, NodeId)>, // (parent, child)
    stop_at: BTreeSet<NodeId>,
}

impl<'a> DepthFirstEdges<'a> {
    pub(crate) fn new(tree: &'a TreeGraph, start: Option<NodeId>, stop_at: BTreeSet<NodeId>) -> Self {
        let mut iter = DepthFirstEdges {
            tree,
            stack: Vec::new(),
            stop_at,
        };
        if let Some(start) = start {
            iter.push_children(start);
        }
        iter
    }

    fn push_children(&mut self, node: NodeId) {
        // Reversed, so the smallest child is popped first
        for &child in self.tree.children(node).iter().rev() {
            if !self.stop_at.contains(&child) {
                self.stack.push((node, child));
            }
        }
    }
}

impl Iterator for DepthFirstEdges<'_> {
    type Item = (NodeId, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (parent, child) = self.stack.pop()?;
        self.push_children(child);
        Some((parent, child))
    }
}

/// Breadth-first iterator over parent → child edges,
/// see [`TreeGraph::topological_edges()`].
pub struct TopologicalEdges<'a> {
    tree: &'a TreeGraph,
    queue: VecDeque<NodeId>,
    pending: VecDeque<(NodeId, NodeId)>,
}

impl Iterator for TopologicalEdges<'_> {
    type Item = (NodeId, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(edge) = self.pending.pop_front() {
                self.queue.push_back(edge.1);
                return Some(edge);
            }
            let node = self.queue.pop_front()?;
            self.pending
                .extend(self.tree.children(node).iter().map(|&child| (node, child)));
        }
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// Uses an explicit stack, so arbitrarily deep trees do not recurse.
pub struct PreOrderIter<'a> {
    tree: &'a TreeGraph,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrderIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack.extend(self.tree.children(node).iter().rev());
        Some(node)
    }
}

/// Iterator for post-order traversal (children before parents).
///
/// Uses an explicit stack, so arbitrarily deep trees do not recurse.
pub struct PostOrderIter<'a> {
    tree: &'a TreeGraph,
    stack: Vec<(NodeId, bool)>, // (node, children_visited)
}

impl Iterator for PostOrderIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((node, children_visited)) = self.stack.pop() {
            let children = self.tree.children(node);
            if children_visited || children.is_empty() {
                return Some(node);
            }
            self.stack.push((node, true));
            self.stack
                .extend(children.iter().rev().map(|&child| (child, false)));
        }
        None
    }
}
