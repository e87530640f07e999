//! States and the behavior callbacks the ringlet drives

use crate::context::FsmContext;
use crate::environment::VariableKey;
use crate::ids::StateId;
use crate::transition::Transition;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Callbacks a state exposes to the ringlet.
///
/// Every hook defaults to a no-op, so a behavior only implements the phases
/// it cares about. Behaviors are shared between clones of a machine and
/// must not hold per-run mutable data; that belongs in the machine context.
pub trait StateBehavior<C>: Send + Sync {
    /// Runs on the first ringlet after arriving in the state
    fn on_entry(&self, _context: &mut FsmContext<C>) {}

    /// Runs when no transition fires
    fn internal(&self, _context: &mut FsmContext<C>) {}

    /// Runs when a transition fires, before leaving the state
    fn on_exit(&self, _context: &mut FsmContext<C>) {}

    /// Runs when the machine is suspended out of this state
    fn on_suspend(&self, _context: &mut FsmContext<C>) {}

    /// Runs when the machine is resumed back into this state
    fn on_resume(&self, _context: &mut FsmContext<C>) {}
}

/// Behavior that does nothing, used for pseudo-states
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyState;

impl<C> StateBehavior<C> for EmptyState {}

type Hook<C> = Box<dyn Fn(&mut FsmContext<C>) + Send + Sync>;

/// Behavior assembled from optional closures
pub struct CallbackState<C> {
    entry: Option<Hook<C>>,
    internal: Option<Hook<C>>,
    exit: Option<Hook<C>>,
    suspend: Option<Hook<C>>,
    resume: Option<Hook<C>>,
}

impl<C> Default for CallbackState<C> {
    fn default() -> Self {
        Self {
            entry: None,
            internal: None,
            exit: None,
            suspend: None,
            resume: None,
        }
    }
}

impl<C> CallbackState<C> {
    /// Behavior with every hook unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry hook
    pub fn with_entry(mut self, hook: impl Fn(&mut FsmContext<C>) + Send + Sync + 'static) -> Self {
        self.entry = Some(Box::new(hook));
        self
    }

    /// Set the internal hook
    pub fn with_internal(
        mut self,
        hook: impl Fn(&mut FsmContext<C>) + Send + Sync + 'static,
    ) -> Self {
        self.internal = Some(Box::new(hook));
        self
    }

    /// Set the exit hook
    pub fn with_exit(mut self, hook: impl Fn(&mut FsmContext<C>) + Send + Sync + 'static) -> Self {
        self.exit = Some(Box::new(hook));
        self
    }

    /// Set the suspend hook
    pub fn with_suspend(
        mut self,
        hook: impl Fn(&mut FsmContext<C>) + Send + Sync + 'static,
    ) -> Self {
        self.suspend = Some(Box::new(hook));
        self
    }

    /// Set the resume hook
    pub fn with_resume(
        mut self,
        hook: impl Fn(&mut FsmContext<C>) + Send + Sync + 'static,
    ) -> Self {
        self.resume = Some(Box::new(hook));
        self
    }
}

fn run_hook<C>(hook: &Option<Hook<C>>, context: &mut FsmContext<C>) {
    if let Some(hook) = hook {
        hook(context);
    }
}

impl<C> StateBehavior<C> for CallbackState<C> {
    fn on_entry(&self, context: &mut FsmContext<C>) {
        run_hook(&self.entry, context);
    }

    fn internal(&self, context: &mut FsmContext<C>) {
        run_hook(&self.internal, context);
    }

    fn on_exit(&self, context: &mut FsmContext<C>) {
        run_hook(&self.exit, context);
    }

    fn on_suspend(&self, context: &mut FsmContext<C>) {
        run_hook(&self.suspend, context);
    }

    fn on_resume(&self, context: &mut FsmContext<C>) {
        run_hook(&self.resume, context);
    }
}

impl<C> fmt::Debug for CallbackState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackState")
            .field("entry", &self.entry.is_some())
            .field("internal", &self.internal.is_some())
            .field("exit", &self.exit.is_some())
            .field("suspend", &self.suspend.is_some())
            .field("resume", &self.resume.is_some())
            .finish()
    }
}

/// A state in a built machine's state table
pub struct FsmState<C> {
    id: StateId,
    name: String,
    transitions: Vec<Transition<C>>,
    environment_variables: BTreeSet<VariableKey>,
    behavior: Arc<dyn StateBehavior<C>>,
}

impl<C> FsmState<C> {
    pub(crate) fn new(
        id: StateId,
        name: String,
        transitions: Vec<Transition<C>>,
        environment_variables: BTreeSet<VariableKey>,
        behavior: Arc<dyn StateBehavior<C>>,
    ) -> Self {
        Self {
            id,
            name,
            transitions,
            environment_variables,
            behavior,
        }
    }

    /// State id
    pub fn id(&self) -> StateId {
        self.id
    }

    /// State name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outgoing transitions in declaration order
    pub fn transitions(&self) -> &[Transition<C>] {
        &self.transitions
    }

    /// Environment keys synchronized while this state is current
    pub fn environment_variables(&self) -> &BTreeSet<VariableKey> {
        &self.environment_variables
    }

    /// The state's callbacks
    pub fn behavior(&self) -> &dyn StateBehavior<C> {
        self.behavior.as_ref()
    }

    /// A state with no outgoing transitions
    pub fn is_accepting(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl<C> Clone for FsmState<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            transitions: self.transitions.clone(),
            environment_variables: self.environment_variables.clone(),
            behavior: Arc::clone(&self.behavior),
        }
    }
}

impl<C> fmt::Debug for FsmState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmState")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("transitions", &self.transitions)
            .field("environment_variables", &self.environment_variables)
            .finish_non_exhaustive()
    }
}
