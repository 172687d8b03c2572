//! Containers for per-edge data.
//!
//! Edges of a tree are stored as parent → child pairs, but most per-edge
//! data (length, confidence, slab provenance) does not care about direction.
//! [EdgeMap] canonicalizes its keys so that `(u, v)` and `(v, u)` address the
//! same slot, which keeps the data valid across rerooting.

use crate::model::node::NodeId;
use ahash::AHashMap;
use std::collections::BTreeSet;

/// Unordered pair of nodes, stored smaller id first.
pub type EdgeKey = (NodeId, NodeId);

/// Returns the canonical (smaller id first) form of an edge.
pub fn edge_key(u: NodeId, v: NodeId) -> EdgeKey {
    if u > v { (v, u) } else { (u, v) }
}

// =#========================================================================#=
// EDGE MAP
// =#========================================================================#=
/// Associative container keyed by an unordered pair of nodes.
///
/// # Example
/// ```
/// use arbor::model::EdgeMap;
///
/// let mut confidence = EdgeMap::new();
/// confidence.insert(5, 2, 3);
/// assert_eq!(confidence.get(2, 5), Some(&3));
/// assert!(confidence.contains(5, 2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap<V> {
    data: AHashMap<EdgeKey, V>,
}

impl<V> Default for EdgeMap<V> {
    fn default() -> Self {
        EdgeMap {
            data: AHashMap::new(),
        }
    }
}

impl<V> EdgeMap<V> {
    /// Creates a new, empty edge map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty edge map with space for `capacity` edges.
    pub fn with_capacity(capacity: usize) -> Self {
        EdgeMap {
            data: AHashMap::with_capacity(capacity),
        }
    }

    /// Stores `value` for the edge between `u` and `v`,
    /// returning the value previously stored there.
    pub fn insert(&mut self, u: NodeId, v: NodeId, value: V) -> Option<V> {
        self.data.insert(edge_key(u, v), value)
    }

    /// Returns the value stored for the edge between `u` and `v`.
    pub fn get(&self, u: NodeId, v: NodeId) -> Option<&V> {
        self.data.get(&edge_key(u, v))
    }

    /// Returns a mutable reference to the value stored for the edge between `u` and `v`.
    pub fn get_mut(&mut self, u: NodeId, v: NodeId) -> Option<&mut V> {
        self.data.get_mut(&edge_key(u, v))
    }

    /// Removes the edge between `u` and `v`, returning its value.
    pub fn remove(&mut self, u: NodeId, v: NodeId) -> Option<V> {
        self.data.remove(&edge_key(u, v))
    }

    /// Returns whether a value is stored for the edge between `u` and `v`.
    pub fn contains(&self, u: NodeId, v: NodeId) -> bool {
        self.data.contains_key(&edge_key(u, v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over canonical keys and values, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &V)> {
        self.data.iter()
    }

    /// Iterates over canonical keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &EdgeKey> {
        self.data.keys()
    }

    /// Returns the set of canonical keys, sorted.
    pub fn key_set(&self) -> BTreeSet<EdgeKey> {
        self.data.keys().copied().collect()
    }

    /// Returns a new map holding only the entries whose key satisfies `keep`.
    pub fn filtered<F>(&self, mut keep: F) -> EdgeMap<V>
    where
        V: Clone,
        F: FnMut(NodeId, NodeId) -> bool,
    {
        EdgeMap {
            data: self
                .data
                .iter()
                .filter(|((u, v), _)| keep(*u, *v))
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }
}

impl<V> FromIterator<((NodeId, NodeId), V)> for EdgeMap<V> {
    fn from_iter<I: IntoIterator<Item = ((NodeId, NodeId), V)>>(iter: I) -> Self {
        EdgeMap {
            data: iter
                .into_iter()
                .map(|((u, v), value)| (edge_key(u, v), value))
                .collect(),
        }
    }
}

/// Yields the values stored for each consecutive pair of nodes along `path`.
///
/// Pairs without a stored value are skipped.
pub fn path_edge_data<'a, V>(
    path: &'a [NodeId],
    edge_data: &'a EdgeMap<V>,
) -> impl Iterator<Item = &'a V> + 'a {
    path.windows(2).filter_map(move |pair| edge_data.get(pair[0], pair[1]))
}
