//! Mutable execution data of a machine

use crate::context::FsmContext;
use crate::environment::{Environment, EnvironmentHandlers, HandlerSlot, VariableKey};
use crate::ids::StateId;
use crate::ringlet::RingletContext;
use crate::status::{ControlRequest, FsmStatus, TransitionKind};
use crate::value::Value;
use std::collections::BTreeSet;

/// Everything that changes while a machine runs.
///
/// The state pointers are always valid ids of the owning machine. A clone is
/// a fully independent copy; the state table it refers to is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct FsmData<C> {
    pub(crate) accepting: Vec<bool>,
    pub(crate) fsm_context: FsmContext<C>,
    pub(crate) ringlet_context: RingletContext,
    pub(crate) actuator_values: Vec<Value>,
    pub(crate) initial_state: StateId,
    pub(crate) current_state: StateId,
    pub(crate) previous_state: StateId,
    pub(crate) suspend_state: StateId,
    pub(crate) suspended_state: Option<StateId>,
}

impl<C> FsmData<C> {
    /// State that executes on the next ringlet
    pub fn current_state(&self) -> StateId {
        self.current_state
    }

    /// State that executed on the last ringlet
    pub fn previous_state(&self) -> StateId {
        self.previous_state
    }

    /// State a restart returns to
    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }

    /// State the machine parks in while suspended
    pub fn suspend_state(&self) -> StateId {
        self.suspend_state
    }

    /// State a resume returns to
    pub fn suspended_state(&self) -> Option<StateId> {
        self.suspended_state
    }

    /// Accepting flags indexed by state id
    pub fn accepting_states(&self) -> &[bool] {
        &self.accepting
    }

    /// The context handed to state behaviors
    pub fn fsm_context(&self) -> &FsmContext<C> {
        &self.fsm_context
    }

    /// Mutable access to the context handed to state behaviors
    pub fn fsm_context_mut(&mut self) -> &mut FsmContext<C> {
        &mut self.fsm_context
    }

    /// Ringlet scratch data
    pub fn ringlet_context(&self) -> &RingletContext {
        &self.ringlet_context
    }

    /// Cached actuator values indexed by handler index
    pub fn actuator_values(&self) -> &[Value] {
        &self.actuator_values
    }

    /// Current control status
    pub fn status(&self) -> FsmStatus {
        self.fsm_context.status()
    }

    /// Settled into an accepting state across two consecutive ringlets
    pub fn is_finished(&self) -> bool {
        self.current_state == self.previous_state
            && self.current_state != self.suspend_state
            && self
                .accepting
                .get(self.current_state.index())
                .copied()
                .unwrap_or(false)
    }

    /// Parked in the suspend state
    pub fn is_suspended(&self) -> bool {
        self.current_state == self.suspend_state
    }

    fn kind(&self) -> TransitionKind {
        TransitionKind::between(self.previous_state, self.current_state, false)
    }

    /// Park the machine in its suspend state.
    ///
    /// Suspending an already suspended machine is absorbed: the original
    /// suspended state and the status are kept. Returns whether the
    /// suspend applied.
    pub fn suspend(&mut self) -> bool {
        if self.suspended_state.is_some() {
            tracing::debug!(state = %self.current_state, "Suspend absorbed, already suspended");
            return false;
        }
        let suspended = self.current_state;
        self.suspended_state = Some(suspended);
        self.current_state = self.suspend_state;
        let kind = self.kind();
        self.fsm_context.set_status(FsmStatus::Suspended(kind));
        tracing::debug!(suspended = %suspended, "Machine suspended");
        true
    }

    /// Return to the state that was suspended.
    ///
    /// Without a prior suspend this is absorbed and changes nothing.
    /// Returns whether the resume applied.
    pub fn resume(&mut self) -> bool {
        let Some(state) = self.suspended_state.take() else {
            tracing::debug!(state = %self.current_state, "Resume absorbed, not suspended");
            return false;
        };
        self.current_state = state;
        let kind = self.kind();
        self.fsm_context.set_status(FsmStatus::Resumed(kind));
        tracing::debug!(state = %state, "Machine resumed");
        true
    }

    /// Return to the initial state, discarding any suspension
    pub fn restart(&mut self) {
        self.current_state = self.initial_state;
        self.suspended_state = None;
        let kind = self.kind();
        self.fsm_context.set_status(FsmStatus::Restarted(kind));
        tracing::debug!(state = %self.current_state, "Machine restarted");
    }

    /// Queue a control request for the next ringlet
    pub(crate) fn request(&mut self, request: ControlRequest) {
        self.fsm_context.request(request);
    }

    pub(crate) fn settle(&mut self, taken: bool) {
        let status = if self.is_finished() {
            FsmStatus::Finished
        } else {
            FsmStatus::Executing(TransitionKind::between(
                self.previous_state,
                self.current_state,
                taken,
            ))
        };
        self.fsm_context.set_status(status);
    }

    /// Advance the state pointers after a ringlet and apply any pending
    /// control request.
    pub(crate) fn advance(&mut self, next: StateId) {
        let taken = self.ringlet_context.taken_transition.is_some();
        self.previous_state = self.current_state;
        self.current_state = next;
        let applied = match self.fsm_context.take_request() {
            Some(ControlRequest::Suspend) => self.suspend(),
            Some(ControlRequest::Resume) => self.resume(),
            Some(ControlRequest::Restart) => {
                self.restart();
                true
            }
            None => false,
        };
        if !applied {
            self.settle(taken);
        }
    }

    /// Fill a fresh environment with the values of `variables`.
    ///
    /// Sensors and external variables are read from their handlers,
    /// actuators report the machine's last write.
    pub fn take_snapshot(&mut self, variables: &BTreeSet<VariableKey>, handlers: &EnvironmentHandlers) {
        let mut environment = Environment::new();
        for key in variables {
            let value = match handlers.resolve(key.as_str()) {
                Some(HandlerSlot::Sensor(handler)) => handler.take_snapshot(),
                Some(HandlerSlot::ExternalVariable(handler)) => handler.take_snapshot(),
                Some(HandlerSlot::Actuator { index, .. }) => match self.actuator_values.get(index) {
                    Some(value) => value.clone(),
                    None => continue,
                },
                None => continue,
            };
            environment.insert(key.clone(), value);
        }
        self.fsm_context.environment = environment;
    }

    /// Like [`FsmData::take_snapshot`], but sensor and external values come
    /// from `inputs` instead of the handlers.
    pub fn take_snapshot_from(
        &mut self,
        variables: &BTreeSet<VariableKey>,
        handlers: &EnvironmentHandlers,
        inputs: &Environment,
    ) {
        let mut environment = Environment::new();
        for key in variables {
            let value = match handlers.resolve(key.as_str()) {
                Some(HandlerSlot::Actuator { index, .. }) => self.actuator_values.get(index).cloned(),
                Some(_) => inputs.get(key.as_str()).cloned(),
                None => None,
            };
            if let Some(value) = value {
                environment.insert(key.clone(), value);
            }
        }
        self.fsm_context.environment = environment;
    }

    /// Write actuator and external values of `variables` out.
    ///
    /// Actuator writes are also cached so the next snapshot can report
    /// them. Sensors are never written.
    pub fn save_snapshot(&mut self, variables: &BTreeSet<VariableKey>, handlers: &EnvironmentHandlers) {
        for key in variables {
            let Some(value) = self.fsm_context.environment.get(key.as_str()) else {
                continue;
            };
            match handlers.resolve(key.as_str()) {
                Some(HandlerSlot::Actuator { index, handler }) => {
                    handler.save_snapshot(value);
                    if let Some(slot) = self.actuator_values.get_mut(index) {
                        *slot = value.clone();
                    }
                }
                Some(HandlerSlot::ExternalVariable(handler)) => handler.save_snapshot(value),
                Some(HandlerSlot::Sensor(_)) | None => {}
            }
        }
    }

    /// Cache actuator values of `variables` without calling any handler
    pub fn capture_actuators(&mut self, variables: &BTreeSet<VariableKey>, handlers: &EnvironmentHandlers) {
        for key in variables {
            if let Some(HandlerSlot::Actuator { index, .. }) = handlers.resolve(key.as_str()) {
                if let (Some(value), Some(slot)) = (
                    self.fsm_context.environment.get(key.as_str()),
                    self.actuator_values.get_mut(index),
                ) {
                    *slot = value.clone();
                }
            }
        }
    }
}
