//! Guarded transitions between states

use crate::context::FsmContext;
use crate::ids::StateId;
use std::fmt;
use std::sync::Arc;

/// Guard evaluated against the machine context before a transition fires
pub type Predicate<C> = Arc<dyn Fn(&FsmContext<C>) -> bool + Send + Sync>;

/// A predicate and the state it leads to.
///
/// Transitions are immutable once built. They are owned by the state that
/// declares them and evaluated in declaration order by the ringlet.
pub struct Transition<C> {
    target: StateId,
    predicate: Predicate<C>,
}

impl<C> Transition<C> {
    /// Create a guarded transition
    pub fn new<F>(target: StateId, predicate: F) -> Self
    where
        F: Fn(&FsmContext<C>) -> bool + Send + Sync + 'static,
    {
        Self {
            target,
            predicate: Arc::new(predicate),
        }
    }

    /// Create a transition from an already shared predicate
    pub fn from_predicate(target: StateId, predicate: Predicate<C>) -> Self {
        Self { target, predicate }
    }

    /// Create a transition that always fires
    pub fn always(target: StateId) -> Self
    where
        C: 'static,
    {
        Self::new(target, |_| true)
    }

    /// The state this transition leads to
    pub fn target(&self) -> StateId {
        self.target
    }

    /// Evaluate the guard
    pub fn can_transition(&self, context: &FsmContext<C>) -> bool {
        (self.predicate)(context)
    }
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Transition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Variables;

    #[test]
    fn test_guard_reads_context() {
        let transition = Transition::new(StateId::new(3), |ctx: &FsmContext<Variables>| {
            ctx.context.get_as::<bool>("ready").unwrap_or(false)
        });
        let mut ctx = FsmContext::new(Variables::new(), Variables::new());
        assert!(!transition.can_transition(&ctx));
        ctx.context.set("ready", true);
        assert!(transition.can_transition(&ctx));
        assert_eq!(transition.target(), StateId::new(3));
    }

    #[test]
    fn test_clones_share_the_guard() {
        let transition = Transition::<()>::always(StateId::new(1));
        let copy = transition.clone();
        let ctx = FsmContext::new((), Variables::new());
        assert!(copy.can_transition(&ctx));
        assert_eq!(copy.target(), transition.target());
    }
}
