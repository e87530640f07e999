//! Environment snapshots and the handlers that synchronize them
//!
//! A machine never touches hardware or shared variables directly. Before a
//! ringlet the handlers bound to the current state's keys fill a fresh
//! [`Environment`]; after the ringlet the values are written back out.
//!
//! - Sensors are read-only.
//! - Actuators are write-only. Their readable value is the machine's own
//!   last write, cached in the execution data at the handler's index.
//! - External variables are read and written.

use crate::errors::{BuildError, BuildResult, VariableResult};
use crate::value::{read_typed, FromValue, Value};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Stable identifier of an environment variable slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableKey(String);

impl VariableKey {
    /// Create a key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VariableKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariableKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for VariableKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory copy of the environment values relevant to one state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(BTreeMap<VariableKey, Value>);

impl Environment {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Typed access
    pub fn get_as<T: FromValue>(&self, key: &str) -> VariableResult<T> {
        read_typed(key, self.0.get(key))
    }

    /// Store a value
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(VariableKey::new(key), value.into());
    }

    pub(crate) fn insert(&mut self, key: VariableKey, value: Value) {
        self.0.insert(key, value);
    }

    /// True when `key` has a value in this snapshot
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys present in this snapshot
    pub fn keys(&self) -> impl Iterator<Item = &VariableKey> {
        self.0.keys()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&VariableKey, &Value)> {
        self.0.iter()
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read-only source of an environment value
pub trait SensorHandler: Send + Sync {
    /// Read a fresh value
    fn take_snapshot(&self) -> Value;
}

impl<F> SensorHandler for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn take_snapshot(&self) -> Value {
        self()
    }
}

/// Write-only sink for an environment value
pub trait ActuatorHandler: Send + Sync {
    /// Value reported before the machine's first write
    fn initial_value(&self) -> Value;

    /// Write a value out
    fn save_snapshot(&self, value: &Value);
}

/// Readable and writable environment value
pub trait ExternalVariableHandler: Send + Sync {
    /// Read the current value
    fn take_snapshot(&self) -> Value;

    /// Write a value out
    fn save_snapshot(&self, value: &Value);
}

/// Actuator that keeps its last written value in memory
#[derive(Debug)]
pub struct InMemoryActuator {
    initial: Value,
    last: Mutex<Option<Value>>,
}

impl InMemoryActuator {
    /// Create an actuator starting at `initial`
    pub fn new(initial: impl Into<Value>) -> Self {
        Self {
            initial: initial.into(),
            last: Mutex::new(None),
        }
    }

    /// The last value written, if any
    pub fn last_written(&self) -> Option<Value> {
        self.last.lock().clone()
    }
}

impl ActuatorHandler for InMemoryActuator {
    fn initial_value(&self) -> Value {
        self.initial.clone()
    }

    fn save_snapshot(&self, value: &Value) {
        *self.last.lock() = Some(value.clone());
    }
}

/// External variable backed by a shared in-memory cell
#[derive(Debug)]
pub struct InMemoryExternalVariable {
    value: Mutex<Value>,
}

impl InMemoryExternalVariable {
    /// Create a variable holding `value`
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Mutex::new(value.into()),
        }
    }

    /// Current value
    pub fn get(&self) -> Value {
        self.value.lock().clone()
    }

    /// Overwrite from outside the machine
    pub fn set(&self, value: impl Into<Value>) {
        *self.value.lock() = value.into();
    }
}

impl ExternalVariableHandler for InMemoryExternalVariable {
    fn take_snapshot(&self) -> Value {
        self.get()
    }

    fn save_snapshot(&self, value: &Value) {
        *self.value.lock() = value.clone();
    }
}

/// The kind of handler bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerKind {
    /// Read-only input
    Sensor,
    /// Write-only output
    Actuator,
    /// Read and write
    ExternalVariable,
}

/// Resolved handler for one key
pub enum HandlerSlot<'a> {
    /// A sensor
    Sensor(&'a dyn SensorHandler),
    /// An actuator and its stable cache index
    Actuator {
        /// Index into the machine's cached actuator values
        index: usize,
        /// The handler
        handler: &'a dyn ActuatorHandler,
    },
    /// An external variable
    ExternalVariable(&'a dyn ExternalVariableHandler),
}

impl HandlerSlot<'_> {
    /// Which kind of handler this is
    pub fn kind(&self) -> HandlerKind {
        match self {
            HandlerSlot::Sensor(_) => HandlerKind::Sensor,
            HandlerSlot::Actuator { .. } => HandlerKind::Actuator,
            HandlerSlot::ExternalVariable(_) => HandlerKind::ExternalVariable,
        }
    }
}

impl fmt::Debug for HandlerSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerSlot::Sensor(_) => f.write_str("Sensor"),
            HandlerSlot::Actuator { index, .. } => {
                f.debug_struct("Actuator").field("index", index).finish_non_exhaustive()
            }
            HandlerSlot::ExternalVariable(_) => f.write_str("ExternalVariable"),
        }
    }
}

/// Handler table keyed by environment key.
///
/// An actuator's index is its registration position, which stays stable for
/// the life of the machine.
#[derive(Clone, Default)]
pub struct EnvironmentHandlers {
    sensors: IndexMap<VariableKey, Arc<dyn SensorHandler>>,
    actuators: IndexMap<VariableKey, Arc<dyn ActuatorHandler>>,
    externals: IndexMap<VariableKey, Arc<dyn ExternalVariableHandler>>,
}

impl EnvironmentHandlers {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_unbound(&self, key: &VariableKey) -> BuildResult<()> {
        if self.contains(key.as_str()) {
            return Err(BuildError::duplicate_handler(key.as_str()));
        }
        Ok(())
    }

    /// Bind a sensor
    pub fn add_sensor(&mut self, key: VariableKey, handler: Arc<dyn SensorHandler>) -> BuildResult<()> {
        self.ensure_unbound(&key)?;
        self.sensors.insert(key, handler);
        Ok(())
    }

    /// Bind an actuator, assigning it the next cache index
    pub fn add_actuator(
        &mut self,
        key: VariableKey,
        handler: Arc<dyn ActuatorHandler>,
    ) -> BuildResult<usize> {
        self.ensure_unbound(&key)?;
        let (index, _) = self.actuators.insert_full(key, handler);
        Ok(index)
    }

    /// Bind an external variable
    pub fn add_external_variable(
        &mut self,
        key: VariableKey,
        handler: Arc<dyn ExternalVariableHandler>,
    ) -> BuildResult<()> {
        self.ensure_unbound(&key)?;
        self.externals.insert(key, handler);
        Ok(())
    }

    /// True when any handler is bound to `key`
    pub fn contains(&self, key: &str) -> bool {
        self.sensors.contains_key(key)
            || self.actuators.contains_key(key)
            || self.externals.contains_key(key)
    }

    /// Look up the handler bound to `key`
    pub fn resolve(&self, key: &str) -> Option<HandlerSlot<'_>> {
        if let Some(handler) = self.sensors.get(key) {
            return Some(HandlerSlot::Sensor(handler.as_ref()));
        }
        if let Some(handler) = self.externals.get(key) {
            return Some(HandlerSlot::ExternalVariable(handler.as_ref()));
        }
        self.actuators
            .get_full(key)
            .map(|(index, _, handler)| HandlerSlot::Actuator {
                index,
                handler: handler.as_ref(),
            })
    }

    /// Kind of handler bound to `key`
    pub fn kind_of(&self, key: &str) -> Option<HandlerKind> {
        self.resolve(key).map(|slot| slot.kind())
    }

    /// Initial cached values, one per actuator in index order
    pub fn initial_actuator_values(&self) -> Vec<Value> {
        self.actuators
            .values()
            .map(|handler| handler.initial_value())
            .collect()
    }

    /// Number of bound actuators
    pub fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    /// Every bound key with its kind, sensors first
    pub fn keys(&self) -> impl Iterator<Item = (&VariableKey, HandlerKind)> {
        self.sensors
            .keys()
            .map(|key| (key, HandlerKind::Sensor))
            .chain(self.actuators.keys().map(|key| (key, HandlerKind::Actuator)))
            .chain(
                self.externals
                    .keys()
                    .map(|key| (key, HandlerKind::ExternalVariable)),
            )
    }
}

impl fmt::Debug for EnvironmentHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentHandlers")
            .field("sensors", &self.sensors.keys().collect::<Vec<_>>())
            .field("actuators", &self.actuators.keys().collect::<Vec<_>>())
            .field("externals", &self.externals.keys().collect::<Vec<_>>())
            .finish()
    }
}
