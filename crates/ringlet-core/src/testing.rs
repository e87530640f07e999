//! Instrumented behaviors and handlers for tests
//!
//! Every mock counts its calls so tests can assert exactly which callbacks
//! and handlers a ringlet or snapshot touched.

use crate::context::FsmContext;
use crate::environment::{ActuatorHandler, ExternalVariableHandler, SensorHandler};
use crate::state::StateBehavior;
use crate::value::Value;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Call counts of a [`CountingBehavior`]
#[derive(Debug, Default)]
pub struct BehaviorCounts {
    entry: AtomicUsize,
    internal: AtomicUsize,
    exit: AtomicUsize,
    suspend: AtomicUsize,
    resume: AtomicUsize,
}

/// Snapshot of the counters, comparable in assertions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `on_entry` calls
    pub entry: usize,
    /// `internal` calls
    pub internal: usize,
    /// `on_exit` calls
    pub exit: usize,
    /// `on_suspend` calls
    pub suspend: usize,
    /// `on_resume` calls
    pub resume: usize,
}

impl BehaviorCounts {
    /// Current counter values
    pub fn get(&self) -> CallCounts {
        CallCounts {
            entry: self.entry.load(Ordering::SeqCst),
            internal: self.internal.load(Ordering::SeqCst),
            exit: self.exit.load(Ordering::SeqCst),
            suspend: self.suspend.load(Ordering::SeqCst),
            resume: self.resume.load(Ordering::SeqCst),
        }
    }
}

/// Behavior that counts every callback and optionally runs a hook inside
/// `internal`
pub struct CountingBehavior<C> {
    counts: Arc<BehaviorCounts>,
    on_internal: Option<Box<dyn Fn(&mut FsmContext<C>) + Send + Sync>>,
}

impl<C> CountingBehavior<C> {
    /// Create a behavior and the handle to its counters
    pub fn new() -> (Self, Arc<BehaviorCounts>) {
        let counts = Arc::new(BehaviorCounts::default());
        (
            Self {
                counts: Arc::clone(&counts),
                on_internal: None,
            },
            counts,
        )
    }

    /// Run `hook` every time `internal` runs
    pub fn with_internal(mut self, hook: impl Fn(&mut FsmContext<C>) + Send + Sync + 'static) -> Self {
        self.on_internal = Some(Box::new(hook));
        self
    }
}

impl<C> StateBehavior<C> for CountingBehavior<C> {
    fn on_entry(&self, _context: &mut FsmContext<C>) {
        self.counts.entry.fetch_add(1, Ordering::SeqCst);
    }

    fn internal(&self, context: &mut FsmContext<C>) {
        self.counts.internal.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_internal {
            hook(context);
        }
    }

    fn on_exit(&self, _context: &mut FsmContext<C>) {
        self.counts.exit.fetch_add(1, Ordering::SeqCst);
    }

    fn on_suspend(&self, _context: &mut FsmContext<C>) {
        self.counts.suspend.fetch_add(1, Ordering::SeqCst);
    }

    fn on_resume(&self, _context: &mut FsmContext<C>) {
        self.counts.resume.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sensor returning a settable value and counting reads
#[derive(Debug)]
pub struct CountingSensor {
    value: Mutex<Value>,
    reads: AtomicUsize,
}

impl CountingSensor {
    /// Create a sensor reporting `value`
    pub fn new(value: impl Into<Value>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value.into()),
            reads: AtomicUsize::new(0),
        })
    }

    /// Change the reported value
    pub fn set(&self, value: impl Into<Value>) {
        *self.value.lock() = value.into();
    }

    /// Number of reads
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl SensorHandler for CountingSensor {
    fn take_snapshot(&self) -> Value {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.value.lock().clone()
    }
}

/// Actuator recording every write
#[derive(Debug)]
pub struct RecordingActuator {
    initial: Value,
    writes: Mutex<Vec<Value>>,
}

impl RecordingActuator {
    /// Create an actuator starting at `initial`
    pub fn new(initial: impl Into<Value>) -> Arc<Self> {
        Arc::new(Self {
            initial: initial.into(),
            writes: Mutex::new(Vec::new()),
        })
    }

    /// Every value written so far
    pub fn writes(&self) -> Vec<Value> {
        self.writes.lock().clone()
    }
}

impl ActuatorHandler for RecordingActuator {
    fn initial_value(&self) -> Value {
        self.initial.clone()
    }

    fn save_snapshot(&self, value: &Value) {
        self.writes.lock().push(value.clone());
    }
}

/// External variable counting reads and writes
#[derive(Debug)]
pub struct CountingExternal {
    value: Mutex<Value>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingExternal {
    /// Create a variable holding `value`
    pub fn new(value: impl Into<Value>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value.into()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        })
    }

    /// Current value
    pub fn get(&self) -> Value {
        self.value.lock().clone()
    }

    /// Number of reads
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of writes
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ExternalVariableHandler for CountingExternal {
    fn take_snapshot(&self) -> Value {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.value.lock().clone()
    }

    fn save_snapshot(&self, value: &Value) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.value.lock() = value.clone();
    }
}
