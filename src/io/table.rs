use crate::error::{ArborError, Result};
use crate::io::defs::{CONNECTOR_COLUMNS, GRAPH_COLUMNS};
use crate::model::{
    Arbor, Confidence, ConnectorId, ConnectorRelation, EdgeMap, Location, NodeId, SkeletonId,
    SpacedTree, Tags, TreenodeConnector,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// =#========================================================================#=
// ROWS
// =#========================================================================#=
type GraphRecord = (
    NodeId,
    Option<NodeId>,
    f64,
    f64,
    f64,
    Option<f64>,
    Option<Confidence>,
);

/// One node of the graph table; serialized as a plain array in
/// [GRAPH_COLUMNS] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "GraphRecord", into = "GraphRecord")]
pub struct GraphRow {
    pub node: NodeId,
    /// `None` for the root
    pub parent: Option<NodeId>,
    pub location: Location,
    pub radius: Option<f64>,
    /// Confidence of the edge to the parent; `None` for the root
    pub confidence: Option<Confidence>,
}

impl From<GraphRecord> for GraphRow {
    fn from((node, parent, x, y, z, radius, confidence): GraphRecord) -> Self {
        GraphRow {
            node,
            parent,
            location: Location::new(x, y, z),
            radius,
            confidence,
        }
    }
}

impl From<GraphRow> for GraphRecord {
    fn from(row: GraphRow) -> Self {
        let Location { x, y, z } = row.location;
        (row.node, row.parent, x, y, z, row.radius, row.confidence)
    }
}

type ConnectorRecord = (NodeId, ConnectorId, ConnectorRelation, f64, f64, f64);

/// One connector attachment; serialized as a plain array in
/// [CONNECTOR_COLUMNS] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConnectorRecord", into = "ConnectorRecord")]
pub struct ConnectorRow(pub TreenodeConnector);

impl From<ConnectorRecord> for ConnectorRow {
    fn from((treenode, connector, relation, x, y, z): ConnectorRecord) -> Self {
        ConnectorRow(TreenodeConnector::new(
            treenode,
            connector,
            relation,
            Location::new(x, y, z),
        ))
    }
}

impl From<ConnectorRow> for ConnectorRecord {
    fn from(ConnectorRow(c): ConnectorRow) -> Self {
        let Location { x, y, z } = c.location;
        (c.treenode, c.connector, c.relation, x, y, z)
    }
}

/// Column names plus rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table<R> {
    pub columns: Vec<String>,
    pub data: Vec<R>,
}

impl<R> Table<R> {
    fn with_columns(columns: &[&str], data: Vec<R>) -> Self {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            data,
        }
    }

    fn check_columns(&self, name: &str, expected: &[&str]) -> Result<()> {
        if self.columns.iter().map(String::as_str).eq(expected.iter().copied()) {
            Ok(())
        } else {
            Err(ArborError::Interchange(format!(
                "{name} table has columns {:?}, expected {expected:?}",
                self.columns
            )))
        }
    }
}

// =#========================================================================#=
// SKELETON TABLE
// =#========================================================================#=
/// Tabular interchange form of an [Arbor].
///
/// * `graph`: one row per node, the root first (with null parent and
///   confidence), then every other node in topological order
/// * `connectors`: one row per attachment, sorted
/// * `tags`: tag name → node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonTable {
    pub id: SkeletonId,
    pub graph: Table<GraphRow>,
    pub connectors: Table<ConnectorRow>,
    pub tags: Tags,
}

impl SkeletonTable {
    /// Tabulates `arbor`.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined or the
    /// arbor lacks the location or confidence of a node.
    #[instrument(level = "debug", skip_all)]
    pub fn from_arbor(arbor: &Arbor) -> Result<Self> {
        let mut rows = Vec::with_capacity(arbor.len());
        if !arbor.is_empty() {
            let root = arbor.root()?;
            rows.push(graph_row(arbor, root, None)?);
            for (parent, node) in arbor.topological_edges()? {
                rows.push(graph_row(arbor, node, Some(parent))?);
            }
        }

        let mut connectors: Vec<TreenodeConnector> =
            arbor.connectors().values().flatten().copied().collect();
        connectors.sort_by(compare_connectors);

        debug!(id = arbor.id(), rows = rows.len(), "tabulated");
        Ok(SkeletonTable {
            id: arbor.id(),
            graph: Table::with_columns(&GRAPH_COLUMNS, rows),
            connectors: Table::with_columns(
                &CONNECTOR_COLUMNS,
                connectors.into_iter().map(ConnectorRow).collect(),
            ),
            tags: arbor.tags().clone(),
        })
    }

    /// Rebuilds and validates the arbor described by this table.
    ///
    /// # Errors
    /// [ArborError::Interchange] if the columns are unexpected, the root row
    /// is not first, a node appears twice or an edge lacks its confidence;
    /// [ArborError::Structural] if the result is not a valid arbor.
    #[instrument(level = "debug", skip_all)]
    pub fn to_arbor(&self) -> Result<Arbor> {
        self.graph.check_columns("graph", &GRAPH_COLUMNS)?;
        self.connectors.check_columns("connectors", &CONNECTOR_COLUMNS)?;

        let mut node_loc = BTreeMap::new();
        let mut node_radius = BTreeMap::new();
        let mut edges = Vec::with_capacity(self.graph.data.len());
        let mut edge_confidence = EdgeMap::with_capacity(self.graph.data.len());

        for (index, row) in self.graph.data.iter().enumerate() {
            if node_loc.insert(row.node, row.location).is_some() {
                return Err(ArborError::Interchange(format!(
                    "node {} appears more than once",
                    row.node
                )));
            }
            if let Some(radius) = row.radius {
                node_radius.insert(row.node, radius);
            }
            match (index, row.parent) {
                (0, None) => {}
                (0, Some(_)) => {
                    return Err(ArborError::Interchange(
                        "first row must be the root (null parent)".to_string(),
                    ));
                }
                (_, None) => {
                    return Err(ArborError::Interchange(format!(
                        "node {} has no parent but is not in the first row",
                        row.node
                    )));
                }
                (_, Some(parent)) => {
                    let confidence = row.confidence.ok_or_else(|| {
                        ArborError::Interchange(format!("edge to node {} has no confidence", row.node))
                    })?;
                    edges.push((parent, row.node));
                    edge_confidence.insert(parent, row.node, confidence);
                }
            }
        }

        let mut connectors: BTreeMap<NodeId, Vec<TreenodeConnector>> = BTreeMap::new();
        for ConnectorRow(connector) in &self.connectors.data {
            connectors.entry(connector.treenode).or_default().push(*connector);
        }

        let tree = SpacedTree::from_edges(edges, node_loc, node_radius)?;
        debug!(id = self.id, nodes = tree.len(), "read table");
        Arbor::new(self.id, tree, edge_confidence, connectors, self.tags.clone())
    }

    /// Serializes this table as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes this table as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a table from JSON.
    ///
    /// # Errors
    /// [ArborError::Json] if `text` is not a valid table.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn graph_row(arbor: &Arbor, node: NodeId, parent: Option<NodeId>) -> Result<GraphRow> {
    let location = arbor
        .location(node)
        .copied()
        .ok_or_else(|| ArborError::missing_node(node))?;
    let confidence = match parent {
        Some(parent) => Some(
            arbor
                .edge_confidence()
                .get(parent, node)
                .copied()
                .ok_or_else(|| {
                    ArborError::Structural(format!("edge ({parent}, {node}) has no confidence"))
                })?,
        ),
        None => None,
    };
    Ok(GraphRow {
        node,
        parent,
        location,
        radius: arbor.radius(node),
        confidence,
    })
}

fn compare_connectors(a: &TreenodeConnector, b: &TreenodeConnector) -> Ordering {
    (a.treenode, a.connector, a.relation)
        .cmp(&(b.treenode, b.connector, b.relation))
        .then_with(|| a.location.x.total_cmp(&b.location.x))
        .then_with(|| a.location.y.total_cmp(&b.location.y))
        .then_with(|| a.location.z.total_cmp(&b.location.z))
}
