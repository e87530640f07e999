//! Explicit machine assembly
//!
//! Authors enumerate states, transitions and environment handlers; the
//! builder validates the whole description and either returns a runnable
//! [`Machine`] or the first authoring error. There is no partially built
//! machine.
//!
//! ```
//! use ringlet_core::{CallbackState, MachineBuilder, StateDefinition, Variables};
//!
//! let machine = MachineBuilder::new("Counter", Variables::new())
//!     .state(
//!         StateDefinition::<Variables>::new("Count")
//!             .with_behavior(CallbackState::<Variables>::new().with_internal(|ctx| {
//!                 let n = ctx.context.get_as::<i64>("n").unwrap_or(0);
//!                 ctx.context.set("n", n + 1);
//!             }))
//!             .transition("Done", |ctx| ctx.context.get_as::<i64>("n").unwrap_or(0) >= 3),
//!     )
//!     .state(StateDefinition::new("Done"))
//!     .initial_state("Count")
//!     .build()
//!     .unwrap();
//! assert_eq!(machine.current_state_name(), "__Initial");
//! ```

use crate::context::{FsmContext, MachineContext};
use crate::environment::{
    ActuatorHandler, EnvironmentHandlers, ExternalVariableHandler, SensorHandler, VariableKey,
};
use crate::errors::{BuildError, BuildResult};
use crate::ids::{StateId, StateRegistrar};
use crate::machine::{FiniteStateMachine, Machine};
use crate::ringlet::{LlfsmRinglet, Ringlet};
use crate::state::{EmptyState, FsmState, StateBehavior};
use crate::transition::{Predicate, Transition};
use crate::value::Variables;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Pseudo-state the machine starts and restarts in
pub const INITIAL_PSEUDO_STATE: &str = "__Initial";
/// Pseudo-state used as the previous state before the first ringlet
pub const PREVIOUS_PSEUDO_STATE: &str = "__Previous";
/// Pseudo-state used as the suspend state when none is declared
pub const SUSPEND_PSEUDO_STATE: &str = "__Suspend";

/// Names authors may not use
pub const RESERVED_STATE_NAMES: [&str; 3] = [
    INITIAL_PSEUDO_STATE,
    PREVIOUS_PSEUDO_STATE,
    SUSPEND_PSEUDO_STATE,
];

/// Declaration of one state
pub struct StateDefinition<C> {
    name: String,
    behavior: Arc<dyn StateBehavior<C>>,
    transitions: Vec<(String, Predicate<C>)>,
    environment_variables: BTreeSet<VariableKey>,
}

impl<C: 'static> StateDefinition<C> {
    /// A state with no behavior and no transitions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: Arc::new(EmptyState),
            transitions: Vec::new(),
            environment_variables: BTreeSet::new(),
        }
    }

    /// Attach the state's callbacks
    pub fn with_behavior(mut self, behavior: impl StateBehavior<C> + 'static) -> Self {
        self.behavior = Arc::new(behavior);
        self
    }

    /// Attach callbacks that are already shared
    pub fn with_shared_behavior(mut self, behavior: Arc<dyn StateBehavior<C>>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Add a guarded transition; transitions are checked in the order added
    pub fn transition<F>(mut self, target: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FsmContext<C>) -> bool + Send + Sync + 'static,
    {
        self.transitions.push((target.into(), Arc::new(predicate)));
        self
    }

    /// Add a transition that always fires
    pub fn always(self, target: impl Into<String>) -> Self {
        self.transition(target, |_| true)
    }

    /// Declare environment variables synchronized while this state runs
    pub fn uses<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<VariableKey>,
    {
        self.environment_variables
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for a [`Machine`]
pub struct MachineBuilder<C, R = LlfsmRinglet> {
    name: String,
    context: C,
    parameters: Variables,
    ringlet: R,
    states: Vec<StateDefinition<C>>,
    initial_state: Option<String>,
    suspend_state: Option<String>,
    handlers: EnvironmentHandlers,
    error: Option<BuildError>,
}

impl<C: MachineContext> MachineBuilder<C, LlfsmRinglet> {
    /// Start a machine using the default ringlet
    pub fn new(name: impl Into<String>, context: C) -> Self {
        Self {
            name: name.into(),
            context,
            parameters: Variables::new(),
            ringlet: LlfsmRinglet,
            states: Vec::new(),
            initial_state: None,
            suspend_state: None,
            handlers: EnvironmentHandlers::new(),
            error: None,
        }
    }
}

impl<C, R> MachineBuilder<C, R>
where
    C: MachineContext,
    R: Ringlet<C>,
{
    /// Swap the ringlet
    pub fn with_ringlet<R2: Ringlet<C>>(self, ringlet: R2) -> MachineBuilder<C, R2> {
        MachineBuilder {
            name: self.name,
            context: self.context,
            parameters: self.parameters,
            ringlet,
            states: self.states,
            initial_state: self.initial_state,
            suspend_state: self.suspend_state,
            handlers: self.handlers,
            error: self.error,
        }
    }

    /// Read-only parameters exposed to every state
    pub fn parameters(mut self, parameters: Variables) -> Self {
        self.parameters = parameters;
        self
    }

    /// Declare a state
    pub fn state(mut self, state: StateDefinition<C>) -> Self {
        self.states.push(state);
        self
    }

    /// Name the state executed after the initial pseudo-state
    pub fn initial_state(mut self, name: impl Into<String>) -> Self {
        self.initial_state = Some(name.into());
        self
    }

    /// Name the state the machine parks in while suspended
    pub fn suspend_state(mut self, name: impl Into<String>) -> Self {
        self.suspend_state = Some(name.into());
        self
    }

    fn record(&mut self, result: BuildResult<()>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }

    /// Bind a sensor handler
    pub fn sensor(mut self, key: impl Into<VariableKey>, handler: impl SensorHandler + 'static) -> Self {
        let result = self.handlers.add_sensor(key.into(), Arc::new(handler));
        self.record(result);
        self
    }

    /// Bind an actuator handler
    pub fn actuator(
        mut self,
        key: impl Into<VariableKey>,
        handler: Arc<dyn ActuatorHandler>,
    ) -> Self {
        let result = self.handlers.add_actuator(key.into(), handler).map(|_| ());
        self.record(result);
        self
    }

    /// Bind an external variable handler
    pub fn external_variable(
        mut self,
        key: impl Into<VariableKey>,
        handler: Arc<dyn ExternalVariableHandler>,
    ) -> Self {
        let result = self.handlers.add_external_variable(key.into(), handler);
        self.record(result);
        self
    }

    /// Bind a sensor handler that is already shared
    pub fn shared_sensor(mut self, key: impl Into<VariableKey>, handler: Arc<dyn SensorHandler>) -> Self {
        let result = self.handlers.add_sensor(key.into(), handler);
        self.record(result);
        self
    }

    fn validate_names(&self) -> BuildResult<()> {
        let mut seen = HashSet::new();
        for state in &self.states {
            if RESERVED_STATE_NAMES.contains(&state.name.as_str()) {
                return Err(BuildError::reserved_state_name(&state.name));
            }
            if !seen.insert(state.name.as_str()) {
                return Err(BuildError::duplicate_state(&state.name));
            }
        }
        Ok(())
    }

    fn resolve(registrar: &StateRegistrar, name: &str, role: &str) -> BuildResult<StateId> {
        registrar
            .lookup(name)
            .ok_or_else(|| BuildError::unknown_state(name, role))
    }

    /// Validate the description and assemble the machine
    pub fn build(self) -> BuildResult<Machine<C, R>> {
        self.build_definition().map(|definition| Machine::new(Arc::new(definition)))
    }

    /// Validate the description and assemble only the shared definition
    pub fn build_definition(mut self) -> BuildResult<FiniteStateMachine<C, R>> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.validate_names()?;
        let initial_name = self
            .initial_state
            .clone()
            .ok_or_else(|| BuildError::missing_initial_state(&self.name))?;

        let mut registrar = StateRegistrar::new();
        for state in &self.states {
            registrar.id_of(&state.name);
        }
        let author_initial = Self::resolve(&registrar, &initial_name, "initial")?;
        let author_suspend = match &self.suspend_state {
            Some(name) => Some(Self::resolve(&registrar, name, "suspend")?),
            None => None,
        };

        for state in &self.states {
            for (target, _) in &state.transitions {
                if registrar.lookup(target).is_none() {
                    return Err(BuildError::unknown_transition_target(&state.name, target));
                }
            }
            if let Some(key) = state
                .environment_variables
                .iter()
                .find(|key| !self.handlers.contains(key.as_str()))
            {
                return Err(BuildError::missing_handler(&state.name, key.as_str()));
            }
        }

        let mut states = Vec::with_capacity(self.states.len() + 3);
        for definition in self.states {
            let id = registrar.id_of(&definition.name);
            let transitions = definition
                .transitions
                .into_iter()
                .map(|(target, predicate)| {
                    Transition::from_predicate(registrar.id_of(&target), predicate)
                })
                .collect();
            states.push(FsmState::new(
                id,
                definition.name,
                transitions,
                definition.environment_variables,
                definition.behavior,
            ));
        }

        let initial_state = registrar.id_of(INITIAL_PSEUDO_STATE);
        states.push(FsmState::new(
            initial_state,
            INITIAL_PSEUDO_STATE.to_string(),
            vec![Transition::always(author_initial)],
            BTreeSet::new(),
            Arc::new(EmptyState),
        ));
        let previous_state = registrar.id_of(PREVIOUS_PSEUDO_STATE);
        states.push(FsmState::new(
            previous_state,
            PREVIOUS_PSEUDO_STATE.to_string(),
            Vec::new(),
            BTreeSet::new(),
            Arc::new(EmptyState),
        ));
        let suspend_state = match author_suspend {
            Some(id) => id,
            None => {
                let id = registrar.id_of(SUSPEND_PSEUDO_STATE);
                states.push(FsmState::new(
                    id,
                    SUSPEND_PSEUDO_STATE.to_string(),
                    Vec::new(),
                    BTreeSet::new(),
                    Arc::new(EmptyState),
                ));
                id
            }
        };

        tracing::debug!(
            machine = %self.name,
            states = states.len(),
            actuators = self.handlers.actuator_count(),
            "Machine built"
        );

        Ok(FiniteStateMachine {
            name: self.name,
            states,
            handlers: self.handlers,
            ringlet: self.ringlet,
            registrar,
            initial_state,
            previous_state,
            suspend_state,
            initial_context: self.context,
            parameters: self.parameters,
        })
    }
}
