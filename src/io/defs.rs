//! Column layouts of the interchange tables.

/// Columns of the graph table, one row per node.
pub const GRAPH_COLUMNS: [&str; 7] = ["treenode", "parent", "x", "y", "z", "radius", "confidence"];

/// Columns of the connector table, one row per treenode-connector attachment.
pub const CONNECTOR_COLUMNS: [&str; 6] = ["treenode", "connector", "relation", "x", "y", "z"];
