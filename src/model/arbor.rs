//! Annotated skeletons.
//!
//! An [Arbor] decorates a [SpacedTree] with the data a tracing tool keeps
//! alongside the geometry:
//! * a skeleton id,
//! * a review confidence per edge,
//! * connector attachments (synapses and the like) per node,
//! * named tags, each naming a list of nodes.
//!
//! None of these change the structural algorithms; derived copies simply keep
//! the annotations of the nodes and edges which survive.

use crate::error::{ArborError, Result};
use crate::model::edge_map::{EdgeMap, edge_key};
use crate::model::node::{Location, NodeId, SkeletonId};
use crate::model::spaced_tree::{SpacedTree, subset_map};
use crate::model::tree_graph::{DepthFirstEdges, TreeGraph, TreeStructure};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;
use tracing::{debug, instrument};

/// Review confidence of an edge.
pub type Confidence = u8;

/// Identifier of a connector node.
pub type ConnectorId = i64;

/// Tag name → tagged nodes.
pub type Tags = BTreeMap<String, Vec<NodeId>>;

/// Tag of the soma node.
pub const SOMA: &str = "soma";
/// Tag of nodes whose branch should not be considered a real branch.
pub const NOT_A_BRANCH: &str = "not a branch";
/// Tag of the node separating axon (distal) from dendrite.
pub const AXON_SPLIT: &str = "mw axon split";
/// Tag of nodes where tracing is known to end.
pub const ENDS: &str = "ends";

// =#========================================================================#=
// CONNECTORS
// =#========================================================================#=
/// Relation of a treenode to a connector.
///
/// A sending treenode is [ConnectorRelation::PresynapticTo] its connector,
/// a receiving one [ConnectorRelation::PostsynapticTo].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ConnectorRelation {
    Other,
    PresynapticTo,
    PostsynapticTo,
    GapJunction,
}

impl From<ConnectorRelation> for i64 {
    fn from(relation: ConnectorRelation) -> i64 {
        match relation {
            ConnectorRelation::Other => -1,
            ConnectorRelation::PresynapticTo => 0,
            ConnectorRelation::PostsynapticTo => 1,
            ConnectorRelation::GapJunction => 2,
        }
    }
}

impl TryFrom<i64> for ConnectorRelation {
    type Error = ArborError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(ConnectorRelation::Other),
            0 => Ok(ConnectorRelation::PresynapticTo),
            1 => Ok(ConnectorRelation::PostsynapticTo),
            2 => Ok(ConnectorRelation::GapJunction),
            other => Err(ArborError::Interchange(format!(
                "unknown connector relation {other}"
            ))),
        }
    }
}

impl fmt::Display for ConnectorRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectorRelation::Other => "other",
            ConnectorRelation::PresynapticTo => "presynaptic_to",
            ConnectorRelation::PostsynapticTo => "postsynaptic_to",
            ConnectorRelation::GapJunction => "gap_junction",
        };
        write!(f, "{name}")
    }
}

/// Attachment of a treenode to a connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreenodeConnector {
    pub treenode: NodeId,
    pub connector: ConnectorId,
    pub relation: ConnectorRelation,
    /// Location of the connector node
    pub location: Location,
}

impl TreenodeConnector {
    pub fn new(
        treenode: NodeId,
        connector: ConnectorId,
        relation: ConnectorRelation,
        location: Location,
    ) -> Self {
        TreenodeConnector {
            treenode,
            connector,
            relation,
            location,
        }
    }
}

// =#========================================================================#=
// ARBOR
// =#========================================================================#=
/// A [SpacedTree] with skeleton id, edge confidences, connectors and tags.
///
/// # Invariants
/// - The spaced tree is valid
/// - Edge confidences are given for exactly the edges of the tree
/// - Connectors are attached to nodes of the tree, listed under their treenode
/// - Tagged nodes are nodes of the tree
///
/// Dereferences to its [SpacedTree]. Structural operations from
/// [TreeStructure] and [`Arbor::topological_copy()`] return [Arbor]s;
/// resampling returns a plain [SpacedTree] as the annotations do not carry
/// over to synthetic nodes.
///
/// # Example
/// ```
/// use arbor::model::{Arbor, EdgeMap, Location, SpacedTree, arbor::SOMA};
/// use std::collections::BTreeMap;
///
/// let locations = BTreeMap::from([
///     (1, Location::new(0.0, 0.0, 0.0)),
///     (2, Location::new(1.0, 0.0, 0.0)),
/// ]);
/// let tree = SpacedTree::from_edges([(1, 2)], locations, BTreeMap::new()).unwrap();
/// let confidence: EdgeMap<u8> = [((1, 2), 5)].into_iter().collect();
/// let tags = BTreeMap::from([(SOMA.to_string(), vec![1])]);
///
/// let arbor = Arbor::new(42, tree, confidence, BTreeMap::new(), tags).unwrap();
/// assert_eq!(arbor.soma().unwrap(), Some(1));
/// assert_eq!(arbor.axon_dendrite_split().unwrap(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Arbor {
    id: SkeletonId,
    tree: SpacedTree,
    edge_confidence: EdgeMap<Confidence>,
    connectors: BTreeMap<NodeId, Vec<TreenodeConnector>>,
    tags: Tags,
}

impl Deref for Arbor {
    type Target = SpacedTree;

    fn deref(&self) -> &SpacedTree {
        &self.tree
    }
}

// ============================================================================
// Construction and validation (pub)
// ============================================================================
impl Arbor {
    /// Creates and validates an annotated skeleton.
    ///
    /// # Errors
    /// [ArborError::Structural] if the tree is invalid or an annotation refers
    /// to nodes or edges not in it.
    pub fn new(
        id: SkeletonId,
        tree: SpacedTree,
        edge_confidence: EdgeMap<Confidence>,
        connectors: BTreeMap<NodeId, Vec<TreenodeConnector>>,
        tags: Tags,
    ) -> Result<Self> {
        let arbor = Self::new_unchecked(id, tree, edge_confidence, connectors, tags);
        arbor.validate()?;
        Ok(arbor)
    }

    pub(crate) fn new_unchecked(
        id: SkeletonId,
        tree: SpacedTree,
        edge_confidence: EdgeMap<Confidence>,
        connectors: BTreeMap<NodeId, Vec<TreenodeConnector>>,
        tags: Tags,
    ) -> Self {
        Arbor {
            id,
            tree,
            edge_confidence,
            connectors,
            tags,
        }
    }

    /// Returns a skeleton with no nodes.
    pub fn empty(id: SkeletonId) -> Self {
        Self::new_unchecked(id, SpacedTree::empty(), EdgeMap::new(), BTreeMap::new(), Tags::new())
    }

    /// Checks the invariants, see [Arbor].
    ///
    /// # Errors
    /// [ArborError::Structural] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.tree.validate()?;

        let edges: BTreeSet<_> = self
            .tree
            .edges()
            .map(|(u, v)| edge_key(u, v))
            .collect();
        if edges != self.edge_confidence.key_set() {
            return Err(ArborError::Structural(
                "edge confidence keys do not match graph edges".to_string(),
            ));
        }

        for (node, connectors) in &self.connectors {
            if !self.tree.contains(*node) {
                return Err(ArborError::Structural(format!(
                    "connectors attached to node {node}, which is not in the graph"
                )));
            }
            if let Some(c) = connectors.iter().find(|c| c.treenode != *node) {
                return Err(ArborError::Structural(format!(
                    "connector {} of treenode {} listed under node {node}",
                    c.connector, c.treenode
                )));
            }
        }

        for (tag, nodes) in &self.tags {
            if let Some(node) = nodes.iter().find(|n| !self.tree.contains(**n)) {
                return Err(ArborError::Structural(format!(
                    "tag '{tag}' attached to node {node}, which is not in the graph"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Accessors (pub)
// ============================================================================
impl Arbor {
    pub fn id(&self) -> SkeletonId {
        self.id
    }

    /// Returns the underlying spaced tree.
    pub fn tree(&self) -> &SpacedTree {
        &self.tree
    }

    pub fn edge_confidence(&self) -> &EdgeMap<Confidence> {
        &self.edge_confidence
    }

    /// Returns connectors grouped by the treenode they are attached to.
    pub fn connectors(&self) -> &BTreeMap<NodeId, Vec<TreenodeConnector>> {
        &self.connectors
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns the nodes carrying `tag` (empty if the tag is unknown).
    pub fn tagged(&self, tag: &str) -> &[NodeId] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the soma, if tagged.
    ///
    /// # Errors
    /// [ArborError::Ambiguity] if more than one node is tagged as soma.
    pub fn soma(&self) -> Result<Option<NodeId>> {
        self.single_tagged(SOMA)
    }

    /// Returns the axon/dendrite split point, if tagged.
    ///
    /// # Errors
    /// [ArborError::Ambiguity] if more than one node is tagged as split point.
    pub fn axon_dendrite_split(&self) -> Result<Option<NodeId>> {
        self.single_tagged(AXON_SPLIT)
    }

    /// Returns the nodes tagged as ends.
    pub fn ends(&self) -> BTreeSet<NodeId> {
        self.tagged(ENDS).iter().copied().collect()
    }

    /// Returns the nodes of the axon, i.e. distal to (and excluding) the split
    /// point, in depth-first order with children visited in ascending order.
    ///
    /// # Errors
    /// [ArborError::NotFound] if no split point is tagged;
    /// [ArborError::Ambiguity] if several are.
    pub fn axon_nodes(&self) -> Result<Vec<NodeId>> {
        let split = self.axon_dendrite_split()?.ok_or_else(|| {
            ArborError::NotFound(format!(
                "unknown axon/dendrite split point: should be tagged with '{AXON_SPLIT}'"
            ))
        })?;
        Ok(DepthFirstEdges::new(self.tree.graph(), Some(split), BTreeSet::new())
            .map(|(_, child)| child)
            .collect())
    }

    fn single_tagged(&self, tag: &str) -> Result<Option<NodeId>> {
        match self.tagged(tag) {
            [] => Ok(None),
            [node] => Ok(Some(*node)),
            nodes => Err(ArborError::Ambiguity(format!(
                "{} nodes tagged with '{tag}'",
                nodes.len()
            ))),
        }
    }
}

// ============================================================================
// Derived skeletons (pub)
// ============================================================================
impl Arbor {
    /// Removes every branch containing a node tagged [NOT_A_BRANCH],
    /// see [`TreeStructure::prune_branches_containing()`].
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn prune_non_branches(&self) -> Result<Arbor> {
        let nodes = self.tagged(NOT_A_BRANCH).to_vec();
        self.prune_branches_containing(&nodes)
    }

    /// Returns a skeleton containing only the root, branches and leaves,
    /// one edge per slab.
    ///
    /// Edge lengths are the path lengths of the replaced slabs and edge
    /// confidences the minimum confidence along them.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    #[instrument(level = "debug", skip(self))]
    pub fn topological_copy(&self) -> Result<Arbor> {
        let (tree, edge_confidence) =
            self.tree.topological_copy_with_confidence(&self.edge_confidence)?;
        let keep = tree.node_set();
        debug!(id = self.id, nodes = keep.len(), "topological copy");
        Ok(Arbor::new_unchecked(
            self.id,
            tree,
            edge_confidence,
            subset_map(&self.connectors, &keep),
            subset_tags(&self.tags, &keep),
        ))
    }

    /// Like [`SpacedTree::significant_branches()`], keeping annotations.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined.
    pub fn significant_branches(&self, n_branches: usize) -> Result<Arbor> {
        let keep = self.tree.significant_branch_nodes(n_branches)?;
        Ok(self.induced_copy(&keep))
    }
}

impl TreeStructure for Arbor {
    fn graph(&self) -> &TreeGraph {
        self.tree.graph()
    }

    fn induced_copy(&self, nodes: &BTreeSet<NodeId>) -> Self {
        Arbor::new_unchecked(
            self.id,
            self.tree.induced_copy(nodes),
            self.edge_confidence
                .filtered(|u, v| nodes.contains(&u) && nodes.contains(&v)),
            subset_map(&self.connectors, nodes),
            subset_tags(&self.tags, nodes),
        )
    }

    fn with_graph(&self, graph: TreeGraph) -> Self {
        // Confidence keys are unordered, so they survive edge reversal
        Arbor::new_unchecked(
            self.id,
            self.tree.with_graph(graph),
            self.edge_confidence.clone(),
            self.connectors.clone(),
            self.tags.clone(),
        )
    }

    fn empty_copy(&self) -> Self {
        Arbor::empty(self.id)
    }
}

/// Tags restricted to `keep`; tags left without nodes are kept, empty.
fn subset_tags(tags: &Tags, keep: &BTreeSet<NodeId>) -> Tags {
    tags.iter()
        .map(|(tag, nodes)| {
            let nodes = nodes.iter().copied().filter(|n| keep.contains(n)).collect();
            (tag.clone(), nodes)
        })
        .collect()
}
