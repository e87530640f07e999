//! The runnable machine handle schedulers drive

use super::data::FsmData;
use super::definition::FiniteStateMachine;
use crate::context::MachineContext;
use crate::environment::Environment;
use crate::ids::StateId;
use crate::ringlet::{LlfsmRinglet, Ringlet};
use crate::status::{ControlRequest, FsmStatus};
use std::sync::Arc;

/// Object-safe interface a scheduler uses to drive a machine.
///
/// One tick is `take_snapshot`, `next`, `save_snapshot`, in that order.
pub trait Executable {
    /// Machine name
    fn name(&self) -> &str;

    /// Read the current state's environment variables
    fn take_snapshot(&mut self);

    /// Execute one ringlet
    fn next(&mut self);

    /// Write out the environment variables of the state that just executed
    fn save_snapshot(&mut self);

    /// Settled in an accepting state
    fn is_finished(&self) -> bool;

    /// Parked in the suspend state
    fn is_suspended(&self) -> bool;

    /// Queue a control request for the next ringlet
    fn control(&mut self, request: ControlRequest);
}

/// A machine definition paired with its own execution data.
///
/// Cloning copies the execution data and shares the definition, so a clone
/// can be run independently, for example to explore alternative futures.
#[derive(Debug)]
pub struct Machine<C, R = LlfsmRinglet> {
    definition: Arc<FiniteStateMachine<C, R>>,
    data: FsmData<C>,
}

impl<C: Clone, R> Clone for Machine<C, R> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            data: self.data.clone(),
        }
    }
}

impl<C, R> Machine<C, R>
where
    C: MachineContext,
    R: Ringlet<C>,
{
    /// Wrap a definition with fresh execution data
    pub fn new(definition: Arc<FiniteStateMachine<C, R>>) -> Self {
        let data = definition.initial_data();
        Self { definition, data }
    }

    /// The shared definition
    pub fn definition(&self) -> &FiniteStateMachine<C, R> {
        &self.definition
    }

    /// Execution data
    pub fn data(&self) -> &FsmData<C> {
        &self.data
    }

    /// Mutable execution data
    pub fn data_mut(&mut self) -> &mut FsmData<C> {
        &mut self.data
    }

    /// The author's context value
    pub fn context(&self) -> &C {
        &self.data.fsm_context.context
    }

    /// Current control status
    pub fn status(&self) -> FsmStatus {
        self.data.status()
    }

    /// Id of the state that executes next
    pub fn current_state(&self) -> StateId {
        self.data.current_state
    }

    /// Name of the state that executes next
    pub fn current_state_name(&self) -> &str {
        self.definition.state_name(self.data.current_state)
    }

    /// One full tick: take, execute, save
    pub fn tick(&mut self) {
        Executable::take_snapshot(self);
        Executable::next(self);
        Executable::save_snapshot(self);
    }

    /// Execute one ringlet with `inputs` standing in for every sensor and
    /// external variable, and cache actuator writes without calling any
    /// handler.
    pub fn tick_isolated(&mut self, inputs: &Environment) {
        self.definition.take_snapshot_from(&mut self.data, inputs);
        self.definition.next(&mut self.data);
        self.definition.capture_actuators(&mut self.data);
    }

    /// Discard all execution data and start over
    pub fn reset(&mut self) {
        self.data = self.definition.initial_data();
    }
}

impl<C, R> Executable for Machine<C, R>
where
    C: MachineContext,
    R: Ringlet<C>,
{
    fn name(&self) -> &str {
        self.definition.name()
    }

    fn take_snapshot(&mut self) {
        self.definition.take_snapshot(&mut self.data);
    }

    fn next(&mut self) {
        self.definition.next(&mut self.data);
    }

    fn save_snapshot(&mut self) {
        self.definition.save_snapshot(&mut self.data);
    }

    fn is_finished(&self) -> bool {
        self.data.is_finished()
    }

    fn is_suspended(&self) -> bool {
        self.data.is_suspended()
    }

    fn control(&mut self, request: ControlRequest) {
        tracing::debug!(machine = %self.definition.name(), request = ?request, "Control request queued");
        self.data.request(request);
    }
}
