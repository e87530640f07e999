//! The immutable part of a machine

use super::data::FsmData;
use crate::context::{FsmContext, MachineContext};
use crate::environment::{Environment, EnvironmentHandlers};
use crate::ids::{StateId, StateRegistrar};
use crate::ringlet::{LlfsmRinglet, Ringlet, RingletContext, RingletStep};
use crate::state::FsmState;
use crate::value::Variables;

/// A built machine: its state table, handlers and ringlet.
///
/// Nothing here changes while the machine runs. Execution data lives in
/// [`FsmData`], so many runs can share one definition.
#[derive(Debug)]
pub struct FiniteStateMachine<C, R = LlfsmRinglet> {
    pub(crate) name: String,
    pub(crate) states: Vec<FsmState<C>>,
    pub(crate) handlers: EnvironmentHandlers,
    pub(crate) ringlet: R,
    pub(crate) registrar: StateRegistrar,
    pub(crate) initial_state: StateId,
    pub(crate) previous_state: StateId,
    pub(crate) suspend_state: StateId,
    pub(crate) initial_context: C,
    pub(crate) parameters: Variables,
}

impl<C, R> FiniteStateMachine<C, R>
where
    C: MachineContext,
    R: Ringlet<C>,
{
    /// Machine name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The state table indexed by id
    pub fn states(&self) -> &[FsmState<C>] {
        &self.states
    }

    /// Look up a state
    pub fn state(&self, id: StateId) -> Option<&FsmState<C>> {
        self.states.get(id.index())
    }

    /// Look up a state id by name
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.registrar.lookup(name)
    }

    /// Name of a state, or `"?"` for an unknown id
    pub fn state_name(&self, id: StateId) -> &str {
        self.registrar.name_of(id).unwrap_or("?")
    }

    /// Environment handler table
    pub fn handlers(&self) -> &EnvironmentHandlers {
        &self.handlers
    }

    /// The ringlet driving this machine
    pub fn ringlet(&self) -> &R {
        &self.ringlet
    }

    /// Pseudo-state the machine starts and restarts in
    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }

    /// State the machine parks in while suspended
    pub fn suspend_state(&self) -> StateId {
        self.suspend_state
    }

    /// Fresh execution data positioned before the first ringlet
    pub fn initial_data(&self) -> FsmData<C> {
        FsmData {
            accepting: self.states.iter().map(FsmState::is_accepting).collect(),
            fsm_context: FsmContext::new(self.initial_context.clone(), self.parameters.clone()),
            ringlet_context: RingletContext::default(),
            actuator_values: self.handlers.initial_actuator_values(),
            initial_state: self.initial_state,
            current_state: self.initial_state,
            previous_state: self.previous_state,
            suspend_state: self.suspend_state,
            suspended_state: None,
        }
    }

    fn current(&self, data: &FsmData<C>) -> Option<&FsmState<C>> {
        self.states.get(data.current_state.index())
    }

    fn previous(&self, data: &FsmData<C>) -> Option<&FsmState<C>> {
        self.states.get(data.previous_state.index())
    }

    /// Execute one ringlet and apply any pending control request
    pub fn next(&self, data: &mut FsmData<C>) {
        let current = data.current_state;
        let (Some(state), Some(suspend_state)) = (
            self.states.get(current.index()),
            self.states.get(self.suspend_state.index()),
        ) else {
            tracing::warn!(machine = %self.name, state = %current, "Current state is not in the state table");
            return;
        };
        let step = RingletStep {
            current,
            state,
            suspend_state,
            suspended: data.suspended_state.is_some(),
        };
        let next = self
            .ringlet
            .execute(step, &mut data.fsm_context, &mut data.ringlet_context);
        data.advance(next);

        tracing::trace!(
            machine = %self.name,
            state = %state.name(),
            status = %data.status(),
            "Ringlet executed"
        );
        if data.current_state != current {
            tracing::debug!(
                machine = %self.name,
                from = %state.name(),
                to = %self.state_name(data.current_state),
                "State changed"
            );
        }
    }

    /// Read the current state's environment variables
    pub fn take_snapshot(&self, data: &mut FsmData<C>) {
        if let Some(state) = self.current(data) {
            data.take_snapshot(state.environment_variables(), &self.handlers);
        }
    }

    /// Read the current state's environment variables, taking sensor and
    /// external values from `inputs`
    pub fn take_snapshot_from(&self, data: &mut FsmData<C>, inputs: &Environment) {
        if let Some(state) = self.current(data) {
            data.take_snapshot_from(state.environment_variables(), &self.handlers, inputs);
        }
    }

    /// Write out the environment variables of the state that just executed
    pub fn save_snapshot(&self, data: &mut FsmData<C>) {
        if let Some(state) = self.previous(data) {
            data.save_snapshot(state.environment_variables(), &self.handlers);
        }
    }

    /// Cache the actuator writes of the state that just executed without
    /// touching any handler
    pub fn capture_actuators(&self, data: &mut FsmData<C>) {
        if let Some(state) = self.previous(data) {
            data.capture_actuators(state.environment_variables(), &self.handlers);
        }
    }
}
