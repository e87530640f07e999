//! Ringlet Semantics Tests
//!
//! Entry/internal/exit ordering, first-match transitions and the finished
//! condition of built machines.

use ringlet_core::testing::{CallCounts, CountingBehavior};
use ringlet_core::{
    CallbackState, Executable, FsmContext, FsmStatus, LlfsmRinglet, Machine, MachineBuilder,
    Ringlet, RingletContext, RingletStep, StateDefinition, TransitionKind, Variables,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn assert_finished_invariant<C: ringlet_core::MachineContext>(machine: &Machine<C>) {
    let data = machine.data();
    let expected = data.current_state() == data.previous_state()
        && data.current_state() != data.suspend_state()
        && data.accepting_states()[data.current_state().index()];
    assert_eq!(data.is_finished(), expected);
}

#[test]
fn test_ringlet_is_deterministic() {
    let (behavior, counts) = CountingBehavior::<()>::new();
    let machine = MachineBuilder::new("Determinism", ())
        .state(
            StateDefinition::new("A")
                .with_behavior(behavior)
                .transition("B", |_| false),
        )
        .state(StateDefinition::new("B"))
        .initial_state("A")
        .build()
        .unwrap();
    let definition = machine.definition();
    let a = definition.state_id("A").unwrap();
    let step = || RingletStep {
        current: a,
        state: definition.state(a).unwrap(),
        suspend_state: definition.state(definition.suspend_state()).unwrap(),
        suspended: false,
    };

    let mut first_context = FsmContext::new((), Variables::new());
    let mut first_ringlet = RingletContext::default();
    let first = LlfsmRinglet.execute(step(), &mut first_context, &mut first_ringlet);
    let after_first = counts.get();

    let mut second_context = FsmContext::new((), Variables::new());
    let mut second_ringlet = RingletContext::default();
    let second = LlfsmRinglet.execute(step(), &mut second_context, &mut second_ringlet);

    assert_eq!(first, second);
    assert_eq!(first, a);
    assert_eq!(first_context, second_context);
    assert_eq!(first_ringlet, second_ringlet);
    assert_eq!(
        after_first,
        CallCounts {
            entry: 1,
            internal: 1,
            ..CallCounts::default()
        }
    );
    assert_eq!(
        counts.get(),
        CallCounts {
            entry: 2,
            internal: 2,
            ..CallCounts::default()
        }
    );
}

#[test]
fn test_first_enabled_transition_wins() {
    let evaluated_last = Arc::new(AtomicUsize::new(0));
    let witness = Arc::clone(&evaluated_last);
    let (behavior, counts) = CountingBehavior::<()>::new();
    let machine = MachineBuilder::new("FirstMatch", ())
        .state(
            StateDefinition::new("S")
                .with_behavior(behavior)
                .transition("A", |_| false)
                .transition("B", |_| true)
                .transition("C", move |_| {
                    witness.fetch_add(1, Ordering::SeqCst);
                    true
                }),
        )
        .state(StateDefinition::new("A"))
        .state(StateDefinition::new("B"))
        .state(StateDefinition::new("C"))
        .initial_state("S")
        .build()
        .unwrap();
    let definition = machine.definition();
    let s = definition.state_id("S").unwrap();
    let step = RingletStep {
        current: s,
        state: definition.state(s).unwrap(),
        suspend_state: definition.state(definition.suspend_state()).unwrap(),
        suspended: false,
    };

    let mut context = FsmContext::new((), Variables::new());
    let mut ringlet_context = RingletContext::default();
    let next = LlfsmRinglet.execute(step, &mut context, &mut ringlet_context);

    assert_eq!(next, definition.state_id("B").unwrap());
    assert_eq!(ringlet_context.taken_transition, Some(1));
    assert_eq!(evaluated_last.load(Ordering::SeqCst), 0);
    assert_eq!(counts.get().exit, 1);
    assert_eq!(counts.get().internal, 0);
}

#[test]
fn test_accepting_state_finishes_and_stays_finished() {
    let (behavior, counts) = CountingBehavior::<()>::new();
    let mut machine = MachineBuilder::new("Finish", ())
        .state(StateDefinition::new("A").always("Done"))
        .state(StateDefinition::new("Done").with_behavior(behavior))
        .initial_state("A")
        .build()
        .unwrap();
    let done = machine.definition().state_id("Done").unwrap();

    machine.tick();
    assert_eq!(machine.current_state_name(), "A");
    assert_finished_invariant(&machine);

    machine.tick();
    assert_eq!(machine.current_state(), done);
    assert!(!machine.is_finished());
    assert_finished_invariant(&machine);

    machine.tick();
    assert!(machine.is_finished());
    assert_eq!(machine.status(), FsmStatus::Finished);
    assert_finished_invariant(&machine);

    machine.tick();
    assert!(machine.is_finished());
    assert_eq!(machine.current_state(), done);
    assert_finished_invariant(&machine);

    assert_eq!(
        counts.get(),
        CallCounts {
            entry: 1,
            internal: 2,
            ..CallCounts::default()
        }
    );
}

#[test]
fn test_self_transition_reenters_the_state() {
    let entries = Arc::new(AtomicUsize::new(0));
    let entered = Arc::clone(&entries);
    let looping = CallbackState::<Variables>::new()
        .with_entry(move |_| {
            entered.fetch_add(1, Ordering::SeqCst);
        })
        .with_exit(|ctx| {
            let n = ctx.context.get_as::<i64>("n").unwrap_or(0);
            ctx.context.set("n", n + 1);
        });
    let mut machine = MachineBuilder::new("Loop", Variables::new())
        .state(
            StateDefinition::<Variables>::new("Loop")
                .with_behavior(looping)
                .transition("Loop", |ctx| ctx.context.get_as::<i64>("n").unwrap_or(0) < 2)
                .always("Done"),
        )
        .state(StateDefinition::new("Done"))
        .initial_state("Loop")
        .build()
        .unwrap();

    machine.tick();
    assert_eq!(machine.status(), FsmStatus::Executing(TransitionKind::New));
    machine.tick();
    assert_eq!(machine.current_state_name(), "Loop");
    assert_eq!(machine.status(), FsmStatus::Executing(TransitionKind::Same));
    machine.tick();
    assert_eq!(machine.status(), FsmStatus::Executing(TransitionKind::Same));
    machine.tick();
    assert_eq!(machine.current_state_name(), "Done");
    assert_eq!(machine.status(), FsmStatus::Executing(TransitionKind::New));

    assert_eq!(entries.load(Ordering::SeqCst), 3);
    assert_eq!(machine.context().get_as::<i64>("n"), Ok(3));
}

#[test]
fn test_state_without_enabled_transition_runs_internal() {
    let (behavior, counts) = CountingBehavior::<()>::new();
    let mut machine = MachineBuilder::new("Idle", ())
        .state(
            StateDefinition::new("Wait")
                .with_behavior(behavior)
                .transition("Never", |_| false),
        )
        .state(StateDefinition::new("Never"))
        .initial_state("Wait")
        .build()
        .unwrap();

    for _ in 0..4 {
        machine.tick();
    }
    assert_eq!(machine.current_state_name(), "Wait");
    assert_eq!(machine.status(), FsmStatus::Executing(TransitionKind::None));
    assert!(!machine.is_finished());
    assert_eq!(
        counts.get(),
        CallCounts {
            entry: 1,
            internal: 3,
            ..CallCounts::default()
        }
    );
}

#[test]
fn test_clones_execute_independently() {
    let mut machine = MachineBuilder::new("Clone", Variables::new())
        .state(
            StateDefinition::<Variables>::new("Count").with_behavior(
                CallbackState::<Variables>::new().with_internal(|ctx| {
                    let n = ctx.context.get_as::<i64>("n").unwrap_or(0);
                    ctx.context.set("n", n + 1);
                }),
            ),
        )
        .initial_state("Count")
        .build()
        .unwrap();
    machine.tick();
    machine.tick();

    let mut fork = machine.clone();
    fork.tick();
    fork.tick();

    assert_eq!(machine.context().get_as::<i64>("n"), Ok(1));
    assert_eq!(fork.context().get_as::<i64>("n"), Ok(3));
    assert!(std::ptr::eq(machine.definition(), fork.definition()));
}
