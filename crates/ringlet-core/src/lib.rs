//! Ringlet Core - finite-state-machine execution runtime
//!
//! Machines are assembled explicitly with a [`MachineBuilder`] and executed
//! one ringlet at a time. Each scheduler tick reads the current state's
//! environment variables, runs the ringlet, then writes the results back.
//!
//! # Layers
//!
//! - [`StateId`] and [`StateRegistrar`]: per-build name interning
//! - [`FsmStatus`]: suspend/resume/restart control status, orthogonal to
//!   the state graph
//! - [`Ringlet`] and [`LlfsmRinglet`]: the execution step
//! - [`FiniteStateMachine`] and [`FsmData`]: immutable definition and
//!   mutable execution data
//! - [`EnvironmentHandlers`]: sensor, actuator and external variable
//!   synchronization
//! - [`Machine`] and [`Executable`]: the handle schedulers drive

#![forbid(unsafe_code)]

/// Machine assembly
pub mod builder;

/// The mutable handle behaviors operate on
pub mod context;

/// Environment snapshots and handlers
pub mod environment;

/// Authoring and variable access errors
pub mod errors;

/// State ids and the registrar
pub mod ids;

/// Definitions, execution data and the runnable wrapper
pub mod machine;

/// The execution step
pub mod ringlet;

/// State table entries and behaviors
pub mod state;

/// Control status
pub mod status;

/// Guarded transitions
pub mod transition;

/// Dynamic values
pub mod value;

/// Instrumented mocks for tests
#[doc(hidden)]
pub mod testing;

pub use builder::{
    MachineBuilder, StateDefinition, INITIAL_PSEUDO_STATE, PREVIOUS_PSEUDO_STATE,
    RESERVED_STATE_NAMES, SUSPEND_PSEUDO_STATE,
};
pub use context::{FsmContext, MachineContext};
pub use environment::{
    ActuatorHandler, Environment, EnvironmentHandlers, ExternalVariableHandler, HandlerKind,
    HandlerSlot, InMemoryActuator, InMemoryExternalVariable, SensorHandler, VariableKey,
};
pub use errors::{BuildError, BuildResult, VariableError, VariableResult};
pub use ids::{StateId, StateRegistrar};
pub use machine::{Executable, FiniteStateMachine, FsmData, Machine};
pub use ringlet::{LlfsmRinglet, Ringlet, RingletContext, RingletStep};
pub use state::{CallbackState, EmptyState, FsmState, StateBehavior};
pub use status::{ControlRequest, FsmStatus, TransitionKind};
pub use transition::{Predicate, Transition};
pub use value::{FromValue, Value, Variables};
