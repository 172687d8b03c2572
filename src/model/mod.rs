//! Tree models.
//!
//! Three layers, each extending the previous one by [Deref](std::ops::Deref):
//! * [TreeGraph] - topology only: a rooted tree over [NodeId]s.
//! * [SpacedTree] - adds a [Location] per node and optional radii; derives
//!   edge lengths and distances from the root.
//! * [Arbor] - adds skeleton id, edge confidence, connectors and tags.
//!
//! All layers are immutable once built: every transformation (reroot, prune,
//! cut, topological copy, resample) returns a new, valid tree. The shared
//! transformations live in the [TreeStructure] trait, so they return the same
//! layer they are called on.
//!
//! Per-edge data is kept in [EdgeMap]s, keyed by unordered node pairs.

/// Node ids, locations and id generation
pub mod node;
/// Per-edge data keyed by unordered node pairs
pub mod edge_map;
/// Rooted tree topology, traversals and the [TreeStructure] trait
pub mod tree_graph;
/// Trees with node locations and radii
pub mod spaced_tree;
/// Annotated skeletons
pub mod arbor;

pub use arbor::{Arbor, Confidence, ConnectorId, ConnectorRelation, Tags, TreenodeConnector};
pub use edge_map::{EdgeKey, EdgeMap, edge_key, path_edge_data};
pub use node::{IdGenerator, Location, NodeId, SkeletonId};
pub use spaced_tree::SpacedTree;
pub use tree_graph::{
    AncestorsPath, DepthFirstEdges, PostOrderIter, PreOrderIter, TopologicalEdges, TreeGraph,
    TreeStructure,
};
