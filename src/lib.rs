//! Arbor is a library for rooted, spatially-embedded trees such as neuron
//! skeletons.
//!
//! A skeleton is a set of nodes with 3-D locations (and optionally radii),
//! connected by a single-parent hierarchy. This crate validates such trees
//! and derives new, equally valid trees from them.
//! Core functionality provided:
//! - Tree models (see [crate::model]):
//!   - [TreeGraph]: topology only, with cached roots, leaves, branches,
//!     Strahler numbers and traversal iterators.
//!   - [SpacedTree]: adds node locations and radii; edge lengths and
//!     distances from the root.
//!   - [Arbor]: adds skeleton id, edge confidence, connectors and tags.
//! - Transformations, returning new trees of the same layer (see
//!   [TreeStructure]): reroot, subtree extraction, pruning, cutting.
//! - Slab decomposition and topological copies (see [crate::slab]).
//! - Significant-branch retention by cable length below each branch.
//! - Arc-length resampling with a maximum edge length (see [crate::resample]).
//! - Interchange tables and JSON round-trip (see [crate::io]).
//!
//! All failures are reported as [ArborError]: structural problems with the
//! input, requests for absent nodes, and ambiguous tags.
//!
//! The library logs through [tracing] and never installs a subscriber.
//!
//! # Example
//! ```
//! use arbor::model::{Location, SpacedTree, TreeStructure};
//! use std::collections::BTreeMap;
//!
//! //     1
//! //     |
//! //     2
//! //    / \
//! //   3   5
//! let locations = BTreeMap::from([
//!     (1, Location::new(0.0, 0.0, 0.0)),
//!     (2, Location::new(0.0, 10.0, 0.0)),
//!     (3, Location::new(-5.0, 20.0, 0.0)),
//!     (5, Location::new(5.0, 20.0, 0.0)),
//! ]);
//! let tree = SpacedTree::from_edges([(1, 2), (2, 3), (2, 5)], locations, BTreeMap::new())?;
//!
//! let rerooted = tree.reroot(3)?;
//! assert_eq!(rerooted.root()?, 3);
//! assert_eq!(rerooted.leaves().iter().copied().collect::<Vec<_>>(), vec![1, 5]);
//!
//! let resampled = tree.resample(2.0)?;
//! assert!(resampled.edge_length().iter().all(|(_, &length)| length <= 2.0 + 1e-9));
//! # Ok::<(), arbor::error::ArborError>(())
//! ```

pub mod error;
pub mod io;
pub mod model;
pub mod resample;
pub mod slab;

pub use error::{ArborError, ArborErrorKind, Result};
pub use model::{Arbor, EdgeMap, Location, NodeId, SpacedTree, TreeGraph, TreeStructure};
pub use resample::Resampler;

// ============================================================================
// Quick API
// ============================================================================
/// Builds and validates a [TreeGraph] from parent → child edges.
///
/// See [`TreeGraph::new()`] for details.
pub fn tree_from_edges(edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> Result<TreeGraph> {
    TreeGraph::new(edges)
}

/// Reads an [Arbor] from JSON interchange text.
///
/// See [`io::arbor_from_json()`] for details.
pub fn arbor_from_json(text: &str) -> Result<Arbor> {
    io::arbor_from_json(text)
}

/// Writes an [Arbor] as JSON interchange text.
///
/// See [`io::arbor_to_json()`] for details.
pub fn arbor_to_json(arbor: &Arbor) -> Result<String> {
    io::arbor_to_json(arbor)
}
