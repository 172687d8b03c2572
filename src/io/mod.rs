//! Interchange of annotated skeletons.
//!
//! A [SkeletonTable] is the tabular form of an [Arbor]: a graph table with
//! one row per node `(treenode, parent, x, y, z, radius, confidence)`, a
//! connector table `(treenode, connector, relation, x, y, z)` and the tags.
//! The root row comes first, with null parent and confidence; the other rows
//! follow in topological order, so every parent precedes its children.
//!
//! Tables (de)serialize to JSON with `serde_json`:
//! ```json
//! {
//!   "id": 42,
//!   "graph": {"columns": ["treenode", "parent", "x", "y", "z", "radius", "confidence"],
//!             "data": [[1, null, 0.0, 0.0, 0.0, 1.5, null], [2, 1, 1.0, 0.0, 0.0, null, 5]]},
//!   "connectors": {"columns": ["treenode", "connector", "relation", "x", "y", "z"],
//!                  "data": [[2, 100, 0, 1.0, 1.0, 0.0]]},
//!   "tags": {"soma": [1]}
//! }
//! ```
//!
//! # Example
//! ```
//! use arbor::io::{arbor_from_json, arbor_to_json};
//! use arbor::model::{Arbor, EdgeMap, Location, SpacedTree};
//! use std::collections::BTreeMap;
//!
//! let locations = BTreeMap::from([
//!     (1, Location::new(0.0, 0.0, 0.0)),
//!     (2, Location::new(1.0, 0.0, 0.0)),
//! ]);
//! let tree = SpacedTree::from_edges([(1, 2)], locations, BTreeMap::new()).unwrap();
//! let confidence: EdgeMap<u8> = [((1, 2), 5)].into_iter().collect();
//! let arbor = Arbor::new(42, tree, confidence, BTreeMap::new(), BTreeMap::new()).unwrap();
//!
//! let text = arbor_to_json(&arbor).unwrap();
//! assert_eq!(arbor_from_json(&text).unwrap(), arbor);
//! ```

mod defs;
mod table;

pub use defs::{CONNECTOR_COLUMNS, GRAPH_COLUMNS};
pub use table::{ConnectorRow, GraphRow, SkeletonTable, Table};

use crate::error::Result;
use crate::model::Arbor;

// =#========================================================================#=
// QUICK ACCESS
// =#========================================================================#=
/// Serializes `arbor` as a JSON [SkeletonTable].
///
/// # Errors
/// See [`SkeletonTable::from_arbor()`].
pub fn arbor_to_json(arbor: &Arbor) -> Result<String> {
    SkeletonTable::from_arbor(arbor)?.to_json()
}

/// Reads an [Arbor] from a JSON [SkeletonTable].
///
/// # Errors
/// [ArborError::Json](crate::error::ArborError::Json) for malformed JSON,
/// otherwise see [`SkeletonTable::to_arbor()`].
pub fn arbor_from_json(text: &str) -> Result<Arbor> {
    SkeletonTable::from_json(text)?.to_arbor()
}
