//! One discrete execution step of a machine
//!
//! A ringlet decides which callbacks of the current state run and which
//! state comes next. It never moves the machine's state pointers itself;
//! the execution data applies the returned id and any pending control
//! request afterwards.

use crate::context::FsmContext;
use crate::ids::StateId;
use crate::state::FsmState;
use crate::status::{ControlRequest, FsmStatus};
use serde::{Deserialize, Serialize};

/// Per-machine scratch data carried between ringlets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingletContext {
    /// Index of the transition taken by the last ringlet, if any
    pub taken_transition: Option<usize>,
    /// Number of ringlets executed so far
    pub executions: u64,
}

/// Inputs of a single ringlet
pub struct RingletStep<'a, C> {
    /// Id of the state being executed
    pub current: StateId,
    /// The state being executed
    pub state: &'a FsmState<C>,
    /// The machine's suspend state
    pub suspend_state: &'a FsmState<C>,
    /// Whether a suspended state is waiting to be resumed
    pub suspended: bool,
}

/// Strategy for executing one step of a machine
pub trait Ringlet<C>: Send + Sync {
    /// Execute the current state and return the id of the next state
    fn execute(
        &self,
        step: RingletStep<'_, C>,
        context: &mut FsmContext<C>,
        ringlet_context: &mut RingletContext,
    ) -> StateId;
}

/// The logic-labelled FSM ringlet.
///
/// Entry runs whenever the last step transitioned, including a transition
/// back into the same state. Transitions are checked in declaration order
/// and the first enabled one is taken without evaluating the rest. When a
/// transition is taken the state's exit runs, otherwise its internal.
///
/// A control request that is already pending when the step starts replaces
/// the normal phases: suspending runs the suspend hooks, resuming and
/// restarting run nothing. A request that does not apply (suspending while
/// suspended, resuming while running) is dropped and the step runs as if it
/// had never been made. A suspend requested during the step runs the
/// suspend hooks after the normal phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlfsmRinglet;

impl LlfsmRinglet {
    fn suspend_hooks<C>(step: &RingletStep<'_, C>, context: &mut FsmContext<C>) {
        step.state.behavior().on_suspend(context);
        if step.current != step.suspend_state.id() {
            step.suspend_state.behavior().on_suspend(context);
        }
    }
}

impl<C> Ringlet<C> for LlfsmRinglet {
    fn execute(
        &self,
        step: RingletStep<'_, C>,
        context: &mut FsmContext<C>,
        ringlet_context: &mut RingletContext,
    ) -> StateId {
        ringlet_context.taken_transition = None;
        ringlet_context.executions += 1;

        match context.pending_request() {
            Some(ControlRequest::Suspend) if !step.suspended => {
                Self::suspend_hooks(&step, context);
                return step.current;
            }
            Some(ControlRequest::Resume) if step.suspended => return step.current,
            Some(ControlRequest::Restart) => return step.current,
            Some(request) => {
                tracing::debug!(request = ?request, state = %step.current, "Control request absorbed");
                context.take_request();
            }
            None => {}
        }

        if let FsmStatus::Resumed(_) = context.settled_status() {
            if step.current != step.suspend_state.id() {
                step.suspend_state.behavior().on_resume(context);
            }
            step.state.behavior().on_resume(context);
        }

        let behavior = step.state.behavior();
        if context.settled_status().transitioned() {
            behavior.on_entry(context);
        }

        let taken = step
            .state
            .transitions()
            .iter()
            .position(|transition| transition.can_transition(context));

        let next = match taken {
            Some(index) => {
                behavior.on_exit(context);
                ringlet_context.taken_transition = Some(index);
                step.state.transitions()[index].target()
            }
            None => {
                behavior.internal(context);
                step.current
            }
        };

        if !step.suspended && context.pending_request() == Some(ControlRequest::Suspend) {
            Self::suspend_hooks(&step, context);
        }
        next
    }
}
