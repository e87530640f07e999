//! Suspend, Resume and Restart Tests
//!
//! Control requests issued by a scheduler or by a state body, including the
//! no-op cases that must be absorbed silently.

use proptest::prelude::*;
use ringlet_core::testing::{CallCounts, CountingBehavior, BehaviorCounts};
use ringlet_core::{
    ControlRequest, Executable, FsmStatus, Machine, MachineBuilder, StateDefinition,
    TransitionKind, Variables,
};
use std::sync::Arc;

fn two_state_machine() -> (Machine<Variables>, Arc<BehaviorCounts>) {
    let (behavior, counts) = CountingBehavior::<Variables>::new();
    let machine = MachineBuilder::new("Control", Variables::new())
        .state(
            StateDefinition::<Variables>::new("A")
                .with_behavior(behavior)
                .transition("B", |ctx| ctx.context.get_as::<bool>("go").unwrap_or(false)),
        )
        .state(StateDefinition::new("B"))
        .initial_state("A")
        .build()
        .unwrap();
    (machine, counts)
}

#[test]
fn test_suspend_then_resume_returns_to_the_same_state() {
    let (mut machine, counts) = two_state_machine();
    machine.tick();
    machine.tick();
    let before = machine.current_state();
    assert_eq!(machine.current_state_name(), "A");

    machine.control(ControlRequest::Suspend);
    machine.tick();
    assert!(machine.is_suspended());
    assert_eq!(machine.current_state_name(), "__Suspend");
    assert_eq!(machine.data().suspended_state(), Some(before));
    assert_eq!(machine.status(), FsmStatus::Suspended(TransitionKind::New));
    assert_eq!(counts.get().suspend, 1);

    machine.tick();
    assert!(machine.is_suspended());

    machine.control(ControlRequest::Resume);
    machine.tick();
    assert_eq!(machine.current_state(), before);
    assert_eq!(machine.data().suspended_state(), None);
    assert_eq!(machine.status(), FsmStatus::Resumed(TransitionKind::New));

    machine.tick();
    assert_eq!(counts.get().resume, 1);
    assert_eq!(counts.get().entry, 2);
    assert!(!machine.is_suspended());
}

fn parked_machine() -> (Machine<()>, Arc<BehaviorCounts>, Arc<BehaviorCounts>) {
    let (work, work_counts) = CountingBehavior::<()>::new();
    let (parked, parked_counts) = CountingBehavior::<()>::new();
    let machine = MachineBuilder::new("Parked", ())
        .state(
            StateDefinition::new("Work")
                .with_behavior(work)
                .transition("Parked", |_| false),
        )
        .state(StateDefinition::new("Parked").with_behavior(parked))
        .initial_state("Work")
        .suspend_state("Parked")
        .build()
        .unwrap();
    (machine, work_counts, parked_counts)
}

#[test]
fn test_suspending_twice_is_the_same_as_once() {
    let (mut machine, counts) = two_state_machine();
    machine.tick();
    machine.tick();
    let before = machine.current_state();

    machine.control(ControlRequest::Suspend);
    machine.tick();
    let mut once = machine.clone();
    once.tick();

    machine.control(ControlRequest::Suspend);
    machine.tick();
    assert_eq!(machine.data(), once.data());
    assert_eq!(machine.data().suspended_state(), Some(before));
    assert_eq!(counts.get().suspend, 1);

    machine.control(ControlRequest::Resume);
    machine.tick();
    assert_eq!(machine.current_state(), before);
}

#[test]
fn test_second_suspend_does_not_rerun_suspend_hooks() {
    let (mut machine, work_counts, parked_counts) = parked_machine();
    machine.tick();
    machine.tick();

    machine.control(ControlRequest::Suspend);
    machine.tick();
    assert_eq!(machine.status(), FsmStatus::Suspended(TransitionKind::New));

    machine.control(ControlRequest::Suspend);
    machine.tick();
    machine.tick();

    assert_eq!(machine.current_state_name(), "Parked");
    assert_eq!(machine.data().suspended_state(), machine.definition().state_id("Work"));
    assert_eq!(work_counts.get().suspend, 1);
    assert_eq!(
        parked_counts.get(),
        CallCounts {
            entry: 1,
            internal: 2,
            suspend: 1,
            ..CallCounts::default()
        }
    );
}

#[test]
fn test_resume_without_suspend_is_a_noop() {
    let (mut requested, requested_counts) = two_state_machine();
    let (mut plain, plain_counts) = two_state_machine();
    requested.tick();
    plain.tick();

    requested.control(ControlRequest::Resume);
    for _ in 0..2 {
        requested.tick();
        plain.tick();
    }

    assert_eq!(requested_counts.get(), plain_counts.get());
    assert_eq!(requested_counts.get().entry, 1);
    assert_eq!(requested_counts.get().internal, 2);
    assert_eq!(requested.data(), plain.data());
    assert_eq!(requested.data().suspended_state(), None);

    assert!(!requested.data_mut().resume());
    assert_eq!(requested.data(), plain.data());
}

#[test]
fn test_resume_after_a_transition_keeps_the_entry() {
    let (behavior, counts) = CountingBehavior::<()>::new();
    let mut machine = MachineBuilder::new("Arrive", ())
        .state(StateDefinition::new("A").always("B"))
        .state(StateDefinition::new("B").with_behavior(behavior))
        .initial_state("A")
        .build()
        .unwrap();

    machine.tick();
    machine.tick();
    assert_eq!(machine.current_state_name(), "B");
    assert_eq!(machine.status(), FsmStatus::Executing(TransitionKind::New));

    machine.control(ControlRequest::Resume);
    assert_eq!(machine.status(), FsmStatus::Resuming);
    machine.tick();
    machine.tick();

    assert_eq!(
        counts.get(),
        CallCounts {
            entry: 1,
            internal: 2,
            ..CallCounts::default()
        }
    );
    assert!(machine.is_finished());
}

#[test]
fn test_suspend_requested_by_state_body() {
    let (behavior, counts) = CountingBehavior::<()>::new();
    let mut machine = MachineBuilder::new("SelfSuspend", ())
        .state(
            StateDefinition::new("Work")
                .with_behavior(behavior.with_internal(|ctx| ctx.suspend()))
                .transition("Never", |_| false),
        )
        .state(StateDefinition::new("Never"))
        .initial_state("Work")
        .build()
        .unwrap();

    machine.tick();
    machine.tick();
    assert!(machine.is_suspended());
    assert_eq!(machine.data().suspended_state(), machine.definition().state_id("Work"));
    assert_eq!(counts.get().internal, 1);
    assert_eq!(counts.get().suspend, 1);
}

#[test]
fn test_declared_suspend_state_runs_its_hooks() {
    let (mut machine, work_counts, parked_counts) = parked_machine();

    machine.tick();
    machine.tick();
    machine.control(ControlRequest::Suspend);
    machine.tick();
    assert_eq!(machine.current_state_name(), "Parked");
    assert_eq!(work_counts.get().suspend, 1);
    assert_eq!(parked_counts.get().suspend, 1);

    machine.tick();
    assert_eq!(parked_counts.get().entry, 1);
    assert!(!machine.is_finished());

    machine.control(ControlRequest::Resume);
    machine.tick();
    machine.tick();
    assert_eq!(machine.current_state_name(), "Work");
    assert_eq!(parked_counts.get().resume, 1);
    assert_eq!(work_counts.get().resume, 1);
}

#[test]
fn test_restart_requested_by_state_body() {
    let (behavior, counts) = CountingBehavior::<()>::new();
    let mut machine = MachineBuilder::new("SelfRestart", ())
        .state(StateDefinition::new("A").always("B"))
        .state(
            StateDefinition::new("B")
                .with_behavior(behavior.with_internal(|ctx| ctx.restart()))
                .transition("Never", |_| false),
        )
        .state(StateDefinition::new("Never"))
        .initial_state("A")
        .build()
        .unwrap();
    let b = machine.definition().state_id("B");

    machine.tick();
    machine.tick();
    machine.tick();
    assert_eq!(machine.current_state_name(), "__Initial");
    assert_eq!(Some(machine.data().previous_state()), b);
    assert_eq!(machine.status(), FsmStatus::Restarted(TransitionKind::New));
    assert_eq!(machine.data().fsm_context().pending_request(), None);
    assert_eq!(
        counts.get(),
        CallCounts {
            entry: 1,
            internal: 1,
            ..CallCounts::default()
        }
    );

    machine.tick();
    assert_eq!(machine.current_state_name(), "A");
    machine.tick();
    machine.tick();
    assert_eq!(machine.current_state_name(), "__Initial");
    assert_eq!(counts.get().entry, 2);
    assert_eq!(counts.get().exit, 0);
}

#[test]
fn test_resume_requested_by_suspend_state_body() {
    let (work, work_counts) = CountingBehavior::<()>::new();
    let (parked, parked_counts) = CountingBehavior::<()>::new();
    let mut machine = MachineBuilder::new("SelfResume", ())
        .state(
            StateDefinition::new("Work")
                .with_behavior(work)
                .transition("Parked", |_| false),
        )
        .state(StateDefinition::new("Parked").with_behavior(parked.with_internal(|ctx| ctx.resume())))
        .initial_state("Work")
        .suspend_state("Parked")
        .build()
        .unwrap();
    let parked_id = machine.definition().state_id("Parked");

    machine.tick();
    machine.tick();
    machine.control(ControlRequest::Suspend);
    machine.tick();
    assert!(machine.is_suspended());

    machine.tick();
    assert_eq!(machine.current_state_name(), "Work");
    assert_eq!(Some(machine.data().previous_state()), parked_id);
    assert_eq!(machine.data().suspended_state(), None);
    assert_eq!(machine.status(), FsmStatus::Resumed(TransitionKind::New));
    assert_eq!(
        parked_counts.get(),
        CallCounts {
            entry: 1,
            internal: 1,
            suspend: 1,
            ..CallCounts::default()
        }
    );

    machine.tick();
    assert!(!machine.is_suspended());
    assert_eq!(parked_counts.get().resume, 1);
    assert_eq!(work_counts.get().resume, 1);
    assert_eq!(work_counts.get().entry, 2);
}

#[test]
fn test_resume_requested_while_running_is_absorbed() {
    let (behavior, counts) = CountingBehavior::<()>::new();
    let mut machine = MachineBuilder::new("Eager", ())
        .state(
            StateDefinition::new("Work")
                .with_behavior(behavior.with_internal(|ctx| ctx.resume()))
                .transition("Never", |_| false),
        )
        .state(StateDefinition::new("Never"))
        .initial_state("Work")
        .build()
        .unwrap();

    for _ in 0..3 {
        machine.tick();
    }
    assert_eq!(machine.current_state_name(), "Work");
    assert_eq!(machine.status(), FsmStatus::Executing(TransitionKind::None));
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
fn test_restart_returns_to_the_initial_state() {
    let (mut machine, counts) = two_state_machine();
    machine.tick();
    machine
        .data_mut()
        .fsm_context_mut()
        .context
        .set("go", true);
    machine.tick();
    assert_eq!(machine.current_state_name(), "B");

    machine.control(ControlRequest::Restart);
    machine.tick();
    assert_eq!(machine.current_state_name(), "__Initial");
    assert_eq!(machine.status(), FsmStatus::Restarted(TransitionKind::New));

    machine.tick();
    assert_eq!(machine.current_state_name(), "A");
    assert_eq!(counts.get().exit, 1);
}

#[test]
fn test_restart_discards_a_suspension() {
    let (mut machine, _) = two_state_machine();
    machine.tick();
    machine.control(ControlRequest::Suspend);
    machine.tick();
    assert!(machine.is_suspended());

    machine.control(ControlRequest::Restart);
    machine.tick();
    assert!(!machine.is_suspended());
    assert_eq!(machine.data().suspended_state(), None);
    machine.tick();
    assert_eq!(machine.current_state_name(), "A");
}

proptest! {
    #[test]
    fn prop_suspend_resume_round_trip(warmup in 0usize..6, idle in 0usize..4, repeats in 1usize..3) {
        let (mut machine, _) = two_state_machine();
        for _ in 0..warmup {
            machine.tick();
        }
        let before = machine.current_state();

        for _ in 0..repeats {
            machine.control(ControlRequest::Suspend);
            machine.tick();
        }
        for _ in 0..idle {
            machine.tick();
        }
        prop_assert!(machine.is_suspended());
        prop_assert_eq!(machine.data().suspended_state(), Some(before));

        machine.control(ControlRequest::Resume);
        machine.tick();
        prop_assert_eq!(machine.current_state(), before);
        prop_assert_eq!(machine.data().suspended_state(), None);
    }
}
