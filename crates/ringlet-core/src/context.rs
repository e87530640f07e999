//! The mutable handle state behaviors and guards operate on

use crate::environment::Environment;
use crate::errors::VariableResult;
use crate::status::{ControlRequest, FsmStatus};
use crate::value::{FromValue, Value, Variables};
use std::fmt;

/// Author-defined machine context.
///
/// `record` exposes the fields that identify a configuration when a machine
/// is explored for verification. Contexts that do not take part in
/// verification can keep the default empty record.
pub trait MachineContext: Clone + fmt::Debug + Send + Sync + 'static {
    /// Flatten the context into named values
    fn record(&self) -> Variables {
        Variables::new()
    }
}

impl MachineContext for () {}

impl MachineContext for Variables {
    fn record(&self) -> Variables {
        self.clone()
    }
}

/// Everything a state sees while it executes.
///
/// Behaviors never write the control status directly. They queue a
/// suspend, resume or restart, which is kept apart from the settled status
/// and consumed once the current ringlet has finished. A request that does
/// not apply (resuming a running machine, suspending a suspended one) is
/// absorbed and leaves the settled status untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct FsmContext<C> {
    /// The author's context value
    pub context: C,
    /// Environment snapshot for the current state
    pub environment: Environment,
    /// Optional result slot for parameterised machines
    pub result: Option<Value>,
    parameters: Variables,
    status: FsmStatus,
    request: Option<ControlRequest>,
}

impl<C> FsmContext<C> {
    /// Create a context in the default executing status
    pub fn new(context: C, parameters: Variables) -> Self {
        Self {
            context,
            environment: Environment::new(),
            result: None,
            parameters,
            status: FsmStatus::default(),
            request: None,
        }
    }

    /// Current control status, reporting a pending request as its `*ing`
    /// variant
    pub fn status(&self) -> FsmStatus {
        self.request.map_or(self.status, ControlRequest::status)
    }

    /// Status left by the last ringlet, ignoring any pending request
    pub fn settled_status(&self) -> FsmStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: FsmStatus) {
        self.status = status;
    }

    /// Request queued for the end of the current ringlet
    pub fn pending_request(&self) -> Option<ControlRequest> {
        self.request
    }

    /// Queue `request`, replacing any earlier one
    pub fn request(&mut self, request: ControlRequest) {
        self.request = Some(request);
    }

    pub(crate) fn take_request(&mut self) -> Option<ControlRequest> {
        self.request.take()
    }

    /// Request a suspend, applied after the current ringlet
    pub fn suspend(&mut self) {
        self.request(ControlRequest::Suspend);
    }

    /// Request a resume, applied after the current ringlet
    pub fn resume(&mut self) {
        self.request(ControlRequest::Resume);
    }

    /// Request a restart, applied after the current ringlet
    pub fn restart(&mut self) {
        self.request(ControlRequest::Restart);
    }

    /// True once the machine has settled in an accepting state
    pub fn is_finished(&self) -> bool {
        matches!(self.status, FsmStatus::Finished)
    }

    /// True right after the machine was moved into its suspend state
    pub fn is_suspended(&self) -> bool {
        matches!(self.status, FsmStatus::Suspended(_))
    }

    /// Read-only machine parameters
    pub fn parameters(&self) -> &Variables {
        &self.parameters
    }

    /// Typed parameter access
    pub fn parameter<T: FromValue>(&self, key: &str) -> VariableResult<T> {
        self.parameters.get_as(key)
    }

    /// Typed environment access
    pub fn env<T: FromValue>(&self, key: &str) -> VariableResult<T> {
        self.environment.get_as(key)
    }

    /// Write an environment value, picked up by the next save
    pub fn set_env(&mut self, key: &str, value: impl Into<Value>) {
        self.environment.set(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VariableError;
    use crate::status::TransitionKind;

    #[test]
    fn test_requests_set_transient_status() {
        let mut ctx = FsmContext::new((), Variables::new());
        assert_eq!(ctx.status(), FsmStatus::default());
        ctx.suspend();
        assert_eq!(ctx.status(), FsmStatus::Suspending);
        ctx.resume();
        assert_eq!(ctx.status(), FsmStatus::Resuming);
        ctx.restart();
        assert_eq!(ctx.status(), FsmStatus::Restarting);
        assert_eq!(ctx.pending_request(), Some(ControlRequest::Restart));
        assert_eq!(ctx.settled_status(), FsmStatus::default());
        assert!(!ctx.is_finished());
    }

    #[test]
    fn test_taking_a_request_restores_the_settled_status() {
        let mut ctx = FsmContext::new((), Variables::new());
        ctx.resume();
        assert_eq!(ctx.take_request(), Some(ControlRequest::Resume));
        assert_eq!(ctx.pending_request(), None);
        assert_eq!(ctx.status(), FsmStatus::Executing(TransitionKind::New));
    }

    #[test]
    fn test_parameters_are_typed() {
        let ctx = FsmContext::new((), Variables::new().with("limit", 10_u64));
        assert_eq!(ctx.parameter::<u64>("limit"), Ok(10));
        assert_eq!(
            ctx.parameter::<String>("limit"),
            Err(VariableError::type_mismatch("limit", "string", "uint"))
        );
    }

    #[test]
    fn test_environment_access() {
        let mut ctx = FsmContext::new((), Variables::new());
        assert_eq!(ctx.env::<bool>("button"), Err(VariableError::not_found("button")));
        ctx.set_env("button", true);
        assert_eq!(ctx.env::<bool>("button"), Ok(true));
    }
}
