//! Ringlet Runtime - scheduling, configuration and logging
//!
//! Ties the execution engine to an application: a [`RoundRobinScheduler`]
//! drives [`ringlet_core::Executable`] machines, [`RuntimeConfig`] bounds
//! the scheduler and Kripke exploration, and [`init_tracing`] installs the
//! log subscriber.

#![forbid(unsafe_code)]

/// TOML configuration with environment overrides
pub mod config;

/// Runtime errors
pub mod errors;

/// Subscriber setup
pub mod logging;

/// Round-robin scheduler
pub mod scheduler;

pub use config::{
    ConfigValidator, LoggingConfig, RuntimeConfig, SchedulerConfig, ValidationError,
    VerificationConfig, ENV_PREFIX,
};
pub use errors::{Result, RuntimeError};
pub use logging::{env_filter, init_tracing};
pub use scheduler::{RoundRobinScheduler, RunSummary};
