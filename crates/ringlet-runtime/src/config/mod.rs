//! Runtime configuration
//!
//! Configuration is read from TOML, then overridden by `RINGLET_`-prefixed
//! environment variables, then validated. Every section falls back to its
//! defaults for missing fields.
//!
//! ```toml
//! [scheduler]
//! max_cycles = 500
//! stop_when_finished = true
//!
//! [verification]
//! max_states = 2000
//!
//! [logging]
//! level = "ringlet_core=debug,info"
//! ```

mod validation;

pub use validation::{ConfigValidator, ValidationError};

use crate::errors::{Result, RuntimeError};
use ringlet_kripke::{MachineKripkeGenerator, DEFAULT_MAX_STATES};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "RINGLET_";

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scheduler loop settings
    pub scheduler: SchedulerConfig,
    /// Kripke exploration settings
    pub verification: VerificationConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// How long the scheduler runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on scheduler cycles
    pub max_cycles: u64,
    /// Stop early once every machine is finished or suspended
    pub stop_when_finished: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_cycles: 1_000,
            stop_when_finished: true,
        }
    }
}

/// Bounds on Kripke structure generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Give up after this many states
    pub max_states: usize,
    /// Label states with their environment snapshot
    pub record_environment: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_MAX_STATES,
            record_environment: false,
        }
    }
}

impl VerificationConfig {
    /// A generator with these bounds and no spinners
    pub fn generator(&self) -> MachineKripkeGenerator {
        MachineKripkeGenerator::new(self.max_states).with_environment(self.record_environment)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Colored output
    pub ansi: bool,
    /// Print the event target
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
            with_target: false,
        }
    }
}

impl RuntimeConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::config_read(path.display().to_string(), e))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `RINGLET_<SECTION>_<FIELD>` overrides from `vars`.
    ///
    /// Unknown keys with the prefix are ignored.
    pub fn merge_with_vars(&mut self, vars: impl IntoIterator<Item = (String, String)>) -> Result<()> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "SCHEDULER_MAX_CYCLES" => self.scheduler.max_cycles = parse(&key, &value)?,
                "SCHEDULER_STOP_WHEN_FINISHED" => self.scheduler.stop_when_finished = parse(&key, &value)?,
                "VERIFICATION_MAX_STATES" => self.verification.max_states = parse(&key, &value)?,
                "VERIFICATION_RECORD_ENVIRONMENT" => {
                    self.verification.record_environment = parse(&key, &value)?;
                }
                "LOGGING_LEVEL" => self.logging.level = value,
                "LOGGING_ANSI" => self.logging.ansi = parse(&key, &value)?,
                "LOGGING_WITH_TARGET" => self.logging.with_target = parse(&key, &value)?,
                _ => {
                    tracing::trace!(key = %key, "Ignoring unknown configuration override");
                    continue;
                }
            }
            tracing::debug!(key = %key, "Configuration override applied");
        }
        Ok(())
    }

    /// Check every section, reporting all failures at once
    pub fn validate(&self) -> Result<()> {
        let mut validator = ConfigValidator::new();

        let mut scheduler = validator.for_field("scheduler");
        scheduler.at_least("max_cycles", self.scheduler.max_cycles, 1);
        validator.merge(scheduler);

        let mut verification = validator.for_field("verification");
        verification.at_least("max_states", self.verification.max_states as u64, 1);
        validator.merge(verification);

        let mut logging = validator.for_field("logging");
        logging.custom(
            "level",
            self.logging.level.as_str(),
            |level: &str| EnvFilter::try_new(level).is_ok(),
            "is not a valid log filter directive",
        );
        validator.merge(logging);

        validator.result().map_err(RuntimeError::validation)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| RuntimeError::invalid_override(key, e.to_string()))
}
