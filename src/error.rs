//! Error type shared by all tree operations.
//!
//! Every failure is a data-integrity problem rather than a transient
//! condition, so nothing in this crate retries: an [ArborError] is handed
//! straight back to the caller and no partial result is produced.

use crate::model::NodeId;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ArborError>;

// =#========================================================================#=
// ERROR KIND
// =#========================================================================#=
/// Discriminant of an [ArborError], handy for matching in tests and callers
/// which do not care about the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArborErrorKind {
    Structural,
    NotFound,
    Ambiguity,
    Interchange,
}

// =#========================================================================#=
// ERROR
// =#========================================================================#=
/// Errors raised while constructing or transforming trees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArborError {
    /// A tree invariant is violated: wrong number of roots, a node with
    /// several parents, a cycle, or attribute maps not matching the node set.
    #[error("structural error: {0}")]
    Structural(String),

    /// A node (or tagged node) was requested which is not in the tree.
    #[error("not found: {0}")]
    NotFound(String),

    /// A query expected a single answer but found several.
    #[error("ambiguous: {0}")]
    Ambiguity(String),

    /// Interchange tables are malformed.
    #[error("invalid interchange table: {0}")]
    Interchange(String),

    /// Interchange text could not be (de)serialized.
    #[error("json error: {0}")]
    Json(String),
}

impl ArborError {
    /// Convenience constructor for a root count other than one
    pub fn root_count(count: usize) -> Self {
        ArborError::Structural(format!("found {count} possible roots"))
    }

    /// Convenience constructor for a node with more than one parent
    pub fn multiple_parents(node: NodeId, parents: &[NodeId]) -> Self {
        ArborError::Structural(format!("node {node} has more than one parent ({parents:?})"))
    }

    /// Convenience constructor for nodes not reachable from the root
    pub fn unreachable(count: usize) -> Self {
        ArborError::Structural(format!(
            "{count} node(s) not reachable from the root (graph contains a cycle)"
        ))
    }

    /// Convenience constructor for an edge or lookup referring to a missing node
    pub fn missing_node(node: NodeId) -> Self {
        ArborError::Structural(format!("node {node} referenced but absent from the graph"))
    }

    /// Convenience constructor for a requested node not in the tree
    pub fn node_not_found(node: NodeId) -> Self {
        ArborError::NotFound(format!("node {node} not in graph"))
    }

    /// Convenience constructor for a slab whose sample count does not fit
    pub fn too_many_samples(length: f64, max_edge_length: f64) -> Self {
        ArborError::Structural(format!(
            "slab of length {length} cannot be resampled at max edge length {max_edge_length}"
        ))
    }

    /// Convenience constructor for running out of synthetic node ids
    pub fn ids_exhausted() -> Self {
        ArborError::Structural("no synthetic node ids left".to_string())
    }

    /// Get the error kind
    pub fn kind(&self) -> ArborErrorKind {
        match self {
            ArborError::Structural(_) => ArborErrorKind::Structural,
            ArborError::NotFound(_) => ArborErrorKind::NotFound,
            ArborError::Ambiguity(_) => ArborErrorKind::Ambiguity,
            ArborError::Interchange(_) | ArborError::Json(_) => ArborErrorKind::Interchange,
        }
    }
}

impl From<serde_json::Error> for ArborError {
    fn from(err: serde_json::Error) -> Self {
        ArborError::Json(err.to_string())
    }
}
