//! Environment Snapshot Tests
//!
//! Snapshots only touch the handlers bound to the current state's keys.
//! Actuators report the machine's own last write.

use ringlet_core::testing::{CountingExternal, CountingSensor, RecordingActuator};
use ringlet_core::{
    CallbackState, Environment, Executable, Machine, MachineBuilder, StateDefinition, Value,
    Variables,
};
use std::sync::Arc;

struct Rig {
    machine: Machine<Variables>,
    a_sensor: Arc<CountingSensor>,
    a_out: Arc<RecordingActuator>,
    b_sensor: Arc<CountingSensor>,
    b_out: Arc<RecordingActuator>,
    b_ext: Arc<CountingExternal>,
}

fn rig() -> Rig {
    let a_sensor = CountingSensor::new(1_i64);
    let a_out = RecordingActuator::new(0_i64);
    let b_sensor = CountingSensor::new(false);
    let b_out = RecordingActuator::new(false);
    let b_ext = CountingExternal::new(0_i64);

    let state_a = CallbackState::<Variables>::new().with_internal(|ctx| {
        let input = ctx.env::<i64>("a_sensor").unwrap_or(0);
        ctx.set_env("a_out", input * 2);
    });
    let state_b = CallbackState::<Variables>::new().with_internal(|ctx| {
        let count = ctx.env::<i64>("b_ext").unwrap_or(0);
        ctx.set_env("b_ext", count + 1);
        ctx.set_env("b_out", true);
    });

    let machine = MachineBuilder::new("Scoped", Variables::new())
        .shared_sensor("a_sensor", a_sensor.clone())
        .actuator("a_out", a_out.clone())
        .shared_sensor("b_sensor", b_sensor.clone())
        .actuator("b_out", b_out.clone())
        .external_variable("b_ext", b_ext.clone())
        .state(
            StateDefinition::<Variables>::new("A")
                .uses(["a_sensor", "a_out"])
                .with_behavior(state_a)
                .transition("B", |ctx| ctx.env::<i64>("a_sensor").unwrap_or(0) >= 10),
        )
        .state(
            StateDefinition::new("B")
                .uses(["b_sensor", "b_out", "b_ext"])
                .with_behavior(state_b),
        )
        .initial_state("A")
        .build()
        .unwrap();

    Rig {
        machine,
        a_sensor,
        a_out,
        b_sensor,
        b_out,
        b_ext,
    }
}

impl Rig {
    fn assert_b_untouched(&self) {
        assert_eq!(self.b_sensor.reads(), 0);
        assert!(self.b_out.writes().is_empty());
        assert_eq!(self.b_ext.reads(), 0);
        assert_eq!(self.b_ext.writes(), 0);
    }
}

#[test]
fn test_pseudo_state_touches_no_handler() {
    let mut rig = rig();
    rig.machine.tick();
    assert_eq!(rig.a_sensor.reads(), 0);
    assert!(rig.a_out.writes().is_empty());
    rig.assert_b_untouched();
}

#[test]
fn test_snapshot_touches_only_current_state_keys() {
    let mut rig = rig();
    rig.machine.tick();
    rig.machine.tick();

    assert_eq!(rig.a_sensor.reads(), 1);
    assert_eq!(rig.a_out.writes(), vec![Value::Int(2)]);
    rig.assert_b_untouched();

    rig.a_sensor.set(10_i64);
    rig.machine.tick();
    assert_eq!(rig.machine.current_state_name(), "B");
    rig.assert_b_untouched();
    let a_reads = rig.a_sensor.reads();
    let a_writes = rig.a_out.writes().len();

    rig.machine.tick();
    assert_eq!(rig.b_sensor.reads(), 1);
    assert_eq!(rig.b_ext.reads(), 1);
    assert_eq!(rig.b_ext.writes(), 1);
    assert_eq!(rig.b_ext.get(), Value::Int(1));
    assert_eq!(rig.b_out.writes(), vec![Value::Bool(true)]);
    assert_eq!(rig.a_sensor.reads(), a_reads);
    assert_eq!(rig.a_out.writes().len(), a_writes);
}

#[test]
fn test_actuators_report_the_last_write() {
    let mut rig = rig();
    rig.machine.tick();

    rig.machine.take_snapshot();
    assert_eq!(
        rig.machine.data().fsm_context().environment.get("a_out"),
        Some(&Value::Int(0))
    );
    rig.machine.next();
    rig.machine.save_snapshot();
    assert_eq!(rig.machine.data().actuator_values()[0], Value::Int(2));

    rig.a_sensor.set(3_i64);
    rig.machine.take_snapshot();
    let environment = &rig.machine.data().fsm_context().environment;
    assert_eq!(environment.get("a_out"), Some(&Value::Int(2)));
    assert_eq!(environment.get("a_sensor"), Some(&Value::Int(3)));
    assert_eq!(environment.len(), 2);
}

#[test]
fn test_isolated_tick_uses_injected_inputs() {
    let mut rig = rig();
    rig.machine.tick();

    let mut inputs = Environment::new();
    inputs.set("a_sensor", 5_i64);
    rig.machine.tick_isolated(&inputs);

    assert_eq!(rig.a_sensor.reads(), 0);
    assert!(rig.a_out.writes().is_empty());
    assert_eq!(rig.machine.data().actuator_values()[0], Value::Int(10));
}
