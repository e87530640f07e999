//! State identifiers and the per-build name registrar

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a state within a single machine.
///
/// Ids are dense: the registrar hands them out in registration order, so an
/// id doubles as the state's index in the machine's state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(usize);

impl StateId {
    /// Wrap a raw index
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Index of the state within its machine's state table
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interns state names to stable ids for one build session.
///
/// A registrar is owned by the machine builder rather than shared process
/// wide; two machines built in the same process never observe each other's
/// names.
#[derive(Debug, Clone, Default)]
pub struct StateRegistrar {
    ids: HashMap<String, StateId>,
    names: Vec<String>,
}

impl StateRegistrar {
    /// Create an empty registrar
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, registering it if it has not been seen.
    pub fn id_of(&mut self, name: &str) -> StateId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = StateId::new(self.names.len());
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    /// Look up an already registered name without registering it
    pub fn lookup(&self, name: &str) -> Option<StateId> {
        self.ids.get(name).copied()
    }

    /// Reverse lookup of a registered id
    pub fn name_of(&self, id: StateId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered `(id, name)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (StateId::new(index), name.as_str()))
    }
}
