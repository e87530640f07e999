//! Storage for recorded Kripke structures

use crate::edge::KripkeEdge;
use crate::errors::{KripkeError, Result};
use crate::property::KripkeStatePropertyList;
use crate::state::KripkeState;
use indexmap::IndexMap;

/// A labelled transition graph whose nodes are identified by their
/// property lists.
///
/// Ids are dense, start at zero and are handed out in insertion order.
pub trait KripkeStructure {
    /// Name of the structure
    fn identifier(&self) -> &str;

    /// Record a node, returning its id.
    ///
    /// A list that is already known keeps its id and its original
    /// `is_initial` flag.
    fn add(&mut self, properties: KripkeStatePropertyList, is_initial: bool) -> usize;

    /// Record an edge out of the node `from`
    fn add_edge(&mut self, edge: KripkeEdge, from: usize) -> Result<()>;

    /// Id of a known property list
    fn id_for(&self, properties: &KripkeStatePropertyList) -> Option<usize>;

    /// Whether a property list has been recorded
    fn exists(&self, properties: &KripkeStatePropertyList) -> bool {
        self.id_for(properties).is_some()
    }

    /// Look up a node
    fn state(&self, id: usize) -> Result<&KripkeState>;

    /// All nodes with their ids, in id order
    fn states(&self) -> Vec<(usize, &KripkeState)>;

    /// Number of nodes
    fn len(&self) -> usize {
        self.states().len()
    }

    /// True when nothing has been recorded
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nodes exploration starts from
    fn initial_states(&self) -> Vec<(usize, &KripkeState)> {
        self.states()
            .into_iter()
            .filter(|(_, state)| state.is_initial())
            .collect()
    }

    /// Nodes without outgoing edges
    fn accepting_states(&self) -> Vec<(usize, &KripkeState)> {
        self.states()
            .into_iter()
            .filter(|(_, state)| state.is_accepting())
            .collect()
    }
}

/// A [`KripkeStructure`] held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryKripkeStructure {
    identifier: String,
    states: IndexMap<KripkeStatePropertyList, KripkeState>,
}

impl InMemoryKripkeStructure {
    /// An empty structure
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            states: IndexMap::new(),
        }
    }

    /// Rebuild a structure from existing nodes, merging their edges
    pub fn from_states(identifier: impl Into<String>, states: impl IntoIterator<Item = KripkeState>) -> Self {
        let mut structure = Self::new(identifier);
        for state in states {
            let id = structure.add(state.properties().clone(), state.is_initial());
            if let Some((_, node)) = structure.states.get_index_mut(id) {
                for edge in state.edges() {
                    node.add_edge(edge.clone());
                }
            }
        }
        structure
    }
}

impl KripkeStructure for InMemoryKripkeStructure {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn add(&mut self, properties: KripkeStatePropertyList, is_initial: bool) -> usize {
        if let Some(id) = self.states.get_index_of(&properties) {
            return id;
        }
        let state = KripkeState::new(is_initial, properties.clone());
        let (id, _) = self.states.insert_full(properties, state);
        tracing::debug!(structure = %self.identifier, id, is_initial, "Kripke state recorded");
        id
    }

    fn add_edge(&mut self, edge: KripkeEdge, from: usize) -> Result<()> {
        let (_, state) = self
            .states
            .get_index_mut(from)
            .ok_or_else(|| KripkeError::unknown_state(from))?;
        state.add_edge(edge);
        Ok(())
    }

    fn id_for(&self, properties: &KripkeStatePropertyList) -> Option<usize> {
        self.states.get_index_of(properties)
    }

    fn state(&self, id: usize) -> Result<&KripkeState> {
        self.states
            .get_index(id)
            .map(|(_, state)| state)
            .ok_or_else(|| KripkeError::unknown_state(id))
    }

    fn states(&self) -> Vec<(usize, &KripkeState)> {
        self.states.values().enumerate().collect()
    }

    fn len(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn plist(n: i64) -> KripkeStatePropertyList {
        KripkeStatePropertyList::new().with("n", n)
    }

    #[test]
    fn test_ids_are_memoized_by_properties() {
        let mut structure = InMemoryKripkeStructure::new("memo");
        assert_eq!(structure.add(plist(0), true), 0);
        assert_eq!(structure.add(plist(1), false), 1);
        assert_eq!(structure.add(plist(0), false), 0);
        assert_eq!(structure.len(), 2);
        assert!(structure.state(0).unwrap().is_initial());
        assert_eq!(structure.id_for(&plist(1)), Some(1));
        assert!(!structure.exists(&plist(2)));
    }

    #[test]
    fn test_initial_and_accepting_states() {
        let mut structure = InMemoryKripkeStructure::new("graph");
        let a = structure.add(plist(0), true);
        let b = structure.add(plist(1), false);
        structure.add_edge(KripkeEdge::new(plist(1)), a).unwrap();

        let initial: Vec<_> = structure.initial_states().into_iter().map(|(id, _)| id).collect();
        let accepting: Vec<_> = structure.accepting_states().into_iter().map(|(id, _)| id).collect();
        assert_eq!(initial, vec![a]);
        assert_eq!(accepting, vec![b]);
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut structure = InMemoryKripkeStructure::new("empty");
        assert_matches!(structure.state(3), Err(KripkeError::UnknownState { id: 3 }));
        assert_matches!(
            structure.add_edge(KripkeEdge::new(plist(0)), 0),
            Err(KripkeError::UnknownState { id: 0 })
        );
    }

    #[test]
    fn test_rebuilding_from_states_keeps_edges() {
        let mut original = InMemoryKripkeStructure::new("a");
        let a = original.add(plist(0), true);
        original.add(plist(1), false);
        original.add_edge(KripkeEdge::new(plist(1)), a).unwrap();

        let copy = InMemoryKripkeStructure::from_states(
            "b",
            original.states().into_iter().map(|(_, state)| state.clone()),
        );
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.state(0).unwrap(), original.state(0).unwrap());
    }
}
