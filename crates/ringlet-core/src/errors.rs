//! Error types for machine construction and variable access
//!
//! Construction failures are authoring errors: a machine either builds
//! completely or not at all. Variable access failures come from the typed
//! getters on the flat key/value maps and never panic.

use serde::{Deserialize, Serialize};

/// Authoring errors detected while building a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BuildError {
    /// Two states share the same name
    #[error("Duplicate state: `{name}` is declared more than once")]
    DuplicateState {
        /// The repeated state name
        name: String,
    },

    /// A state uses a name reserved for a pseudo-state
    #[error("Reserved state name: `{name}` is reserved, please rename the state")]
    ReservedStateName {
        /// The offending state name
        name: String,
    },

    /// A transition points at a state that was never declared
    #[error("Unknown transition target: state `{state}` transitions to undeclared state `{target}`")]
    UnknownTransitionTarget {
        /// The state declaring the transition
        state: String,
        /// The undeclared target
        target: String,
    },

    /// The initial or suspend state refers to an undeclared state
    #[error("Unknown state: `{name}` was referenced as the {role} state but never declared")]
    UnknownState {
        /// The referenced name
        name: String,
        /// Which role the reference was made for
        role: String,
    },

    /// No initial state was configured
    #[error("Missing initial state for machine `{machine}`")]
    MissingInitialState {
        /// The machine being built
        machine: String,
    },

    /// A state declares an environment variable with no bound handler
    #[error("Missing handler: state `{state}` uses environment variable `{key}` which has no handler")]
    MissingHandler {
        /// The state declaring the variable
        state: String,
        /// The unbound key
        key: String,
    },

    /// An environment key was bound to more than one handler
    #[error("Duplicate handler: environment variable `{key}` is already bound")]
    DuplicateHandler {
        /// The key bound twice
        key: String,
    },
}

impl BuildError {
    /// Create a duplicate state error
    pub fn duplicate_state(name: impl Into<String>) -> Self {
        Self::DuplicateState { name: name.into() }
    }

    /// Create a reserved state name error
    pub fn reserved_state_name(name: impl Into<String>) -> Self {
        Self::ReservedStateName { name: name.into() }
    }

    /// Create an unknown transition target error
    pub fn unknown_transition_target(state: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnknownTransitionTarget {
            state: state.into(),
            target: target.into(),
        }
    }

    /// Create an unknown state reference error
    pub fn unknown_state(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self::UnknownState {
            name: name.into(),
            role: role.into(),
        }
    }

    /// Create a missing initial state error
    pub fn missing_initial_state(machine: impl Into<String>) -> Self {
        Self::MissingInitialState {
            machine: machine.into(),
        }
    }

    /// Create a missing handler error
    pub fn missing_handler(state: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingHandler {
            state: state.into(),
            key: key.into(),
        }
    }

    /// Create a duplicate handler error
    pub fn duplicate_handler(key: impl Into<String>) -> Self {
        Self::DuplicateHandler { key: key.into() }
    }
}

/// Failures of the typed getters on variables and environment snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VariableError {
    /// No value is stored under the key
    #[error("Not found: no value stored for `{key}`")]
    NotFound {
        /// The missing key
        key: String,
    },

    /// A value exists but has a different type
    #[error("Type mismatch: `{key}` holds a {found}, expected {expected}")]
    TypeMismatch {
        /// The key that was read
        key: String,
        /// The requested type
        expected: String,
        /// The stored value's type
        found: String,
    },
}

impl VariableError {
    /// Create a not found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Result type for machine construction
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Result type for variable access
pub type VariableResult<T> = std::result::Result<T, VariableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_messages_name_the_culprit() {
        let err = BuildError::missing_handler("Idle", "switch");
        assert!(matches!(err, BuildError::MissingHandler { .. }));
        assert_eq!(
            err.to_string(),
            "Missing handler: state `Idle` uses environment variable `switch` which has no handler"
        );
    }

    #[test]
    fn test_variable_error_creation() {
        let err = VariableError::type_mismatch("speed", "bool", "int");
        assert_eq!(err.to_string(), "Type mismatch: `speed` holds a int, expected bool");
    }
}
