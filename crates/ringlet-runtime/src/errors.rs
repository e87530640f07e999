//! Error types for the runtime layer

use crate::config::ValidationError;
use ringlet_kripke::KripkeError;

/// Errors raised while configuring or driving machines
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A configuration file could not be read
    #[error("Failed to read configuration file `{path}`: {source}")]
    ConfigRead {
        /// The file that was requested
        path: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A configuration document is not valid TOML for the config schema
    #[error("Invalid configuration: {source}")]
    ConfigParse {
        /// The parser error
        #[from]
        source: toml::de::Error,
    },

    /// A configuration could not be rendered as TOML
    #[error("Failed to serialize configuration: {source}")]
    ConfigSerialize {
        /// The serializer error
        #[from]
        source: toml::ser::Error,
    },

    /// An environment override could not be parsed
    #[error("Invalid environment override `{key}`: {message}")]
    InvalidOverride {
        /// The environment variable
        key: String,
        /// What was wrong with its value
        message: String,
    },

    /// Validation rejected the configuration
    #[error("Configuration validation failed: {message}")]
    Validation {
        /// Every rule that failed
        errors: Vec<ValidationError>,
        /// The failures joined for display
        message: String,
    },

    /// The log filter directive could not be parsed
    #[error("Invalid log filter `{filter}`: {message}")]
    InvalidLogFilter {
        /// The rejected directive
        filter: String,
        /// Parser message
        message: String,
    },

    /// A scheduler slot index that does not exist
    #[error("Unknown scheduler slot {index}")]
    UnknownSlot {
        /// The requested index
        index: usize,
    },

    /// Kripke exploration failed
    #[error("Verification failed: {source}")]
    Verification {
        /// The exploration error
        #[from]
        source: KripkeError,
    },
}

impl RuntimeError {
    /// Create a config read error
    pub fn config_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ConfigRead {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid override error
    pub fn invalid_override(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a validation error from every failed rule
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation { errors, message }
    }

    /// Create an invalid log filter error
    pub fn invalid_log_filter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLogFilter {
            filter: filter.into(),
            message: message.into(),
        }
    }

    /// Create an unknown slot error
    pub fn unknown_slot(index: usize) -> Self {
        Self::UnknownSlot { index }
    }
}

/// Result alias for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
