//! Error types for Kripke structure recording and export

/// Errors raised while recording, exploring or rendering a Kripke structure
#[derive(Debug, thiserror::Error)]
pub enum KripkeError {
    /// A state id that the structure never assigned
    #[error("Unknown Kripke state: id {id} is not part of the structure")]
    UnknownState {
        /// The requested id
        id: usize,
    },

    /// An edge leads to a property list with no state in the structure
    #[error("Unknown edge target: no state is labelled {target}")]
    UnknownTarget {
        /// The rendered target property list
        target: String,
    },

    /// Exploration discovered more states than allowed
    #[error("State limit exceeded: exploration stopped after {limit} states")]
    StateLimitExceeded {
        /// The configured limit
        limit: usize,
    },

    /// Writing a view failed
    #[error("View output failed: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl KripkeError {
    /// Create an unknown state error
    pub fn unknown_state(id: usize) -> Self {
        Self::UnknownState { id }
    }

    /// Create an unknown edge target error
    pub fn unknown_target(target: impl Into<String>) -> Self {
        Self::UnknownTarget {
            target: target.into(),
        }
    }

    /// Create a state limit error
    pub fn state_limit_exceeded(limit: usize) -> Self {
        Self::StateLimitExceeded { limit }
    }
}

/// Result alias for Kripke operations
pub type Result<T> = std::result::Result<T, KripkeError>;
