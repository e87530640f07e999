//! Nodes of a Kripke structure

use crate::edge::{EdgeKey, KripkeEdge};
use crate::property::KripkeStatePropertyList;
use indexmap::IndexMap;

/// A node of a Kripke structure: the properties observed in one machine
/// configuration and the edges recorded out of it.
///
/// Edges that differ only in their constraint are kept as a single edge
/// whose constraint covers all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KripkeState {
    is_initial: bool,
    properties: KripkeStatePropertyList,
    edges: IndexMap<EdgeKey, KripkeEdge>,
}

impl KripkeState {
    /// A state without edges
    pub fn new(is_initial: bool, properties: KripkeStatePropertyList) -> Self {
        Self {
            is_initial,
            properties,
            edges: IndexMap::new(),
        }
    }

    /// Whether exploration may start here
    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    /// The observed properties
    pub fn properties(&self) -> &KripkeStatePropertyList {
        &self.properties
    }

    /// Outgoing edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &KripkeEdge> {
        self.edges.values()
    }

    /// Number of distinct outgoing edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// No outgoing edges
    pub fn is_accepting(&self) -> bool {
        self.edges.is_empty()
    }

    /// Record an edge.
    ///
    /// A new key is inserted as is. For a known key, an unconstrained
    /// existing edge absorbs the new one; otherwise the existing constraint
    /// is widened with the new edge's constraint.
    pub fn add_edge(&mut self, edge: KripkeEdge) {
        let key = edge.key();
        match self.edges.get_mut(&key) {
            None => {
                self.edges.insert(key, edge);
            }
            Some(existing) if existing.constraint.is_none() => {
                tracing::trace!(target_state = %edge.target, "Edge absorbed by unconstrained edge");
            }
            Some(existing) => {
                existing.merge_constraint(edge.constraint.as_ref());
                tracing::debug!(target_state = %edge.target, "Edge constraints merged");
            }
        }
    }
}
