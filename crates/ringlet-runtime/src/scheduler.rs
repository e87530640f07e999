//! Round-robin scheduling of independent machines
//!
//! Each cycle gives every machine exactly one tick, in registration order.
//! A tick is never interleaved with another machine's tick.

use crate::config::SchedulerConfig;
use crate::errors::{Result, RuntimeError};
use ringlet_core::{ControlRequest, Executable};
use serde::{Deserialize, Serialize};

/// Outcome of [`RoundRobinScheduler::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Cycles executed by this run
    pub cycles: u64,
    /// Every machine was finished or suspended when the run stopped
    pub terminated: bool,
    /// Names of finished machines
    pub finished: Vec<String>,
    /// Names of suspended machines
    pub suspended: Vec<String>,
}

/// Drives a fixed list of machines one tick at a time
#[derive(Default)]
pub struct RoundRobinScheduler {
    slots: Vec<Box<dyn Executable>>,
    should_terminate: bool,
    cycles: u64,
}

impl std::fmt::Debug for RoundRobinScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.slots.iter().map(|slot| slot.name()).collect();
        f.debug_struct("RoundRobinScheduler")
            .field("slots", &names)
            .field("should_terminate", &self.should_terminate)
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl RoundRobinScheduler {
    /// An empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a machine, returning its slot index
    pub fn add(&mut self, machine: impl Executable + 'static) -> usize {
        self.add_boxed(Box::new(machine))
    }

    /// Register an already boxed machine
    pub fn add_boxed(&mut self, machine: Box<dyn Executable>) -> usize {
        tracing::debug!(machine = %machine.name(), slot = self.slots.len(), "Machine scheduled");
        self.slots.push(machine);
        self.slots.len() - 1
    }

    /// Builder-style [`RoundRobinScheduler::add`]
    pub fn with(mut self, machine: impl Executable + 'static) -> Self {
        self.add(machine);
        self
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True with no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A scheduled machine
    pub fn slot(&self, index: usize) -> Option<&dyn Executable> {
        self.slots.get(index).map(|slot| &**slot)
    }

    /// Cycles executed so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Every machine was finished or suspended after the last cycle
    pub fn should_terminate(&self) -> bool {
        self.should_terminate
    }

    /// Queue a control request for one machine's next tick
    pub fn control(&mut self, index: usize, request: ControlRequest) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| RuntimeError::unknown_slot(index))?;
        slot.control(request);
        Ok(())
    }

    /// Tick every machine once
    pub fn cycle(&mut self) {
        for slot in &mut self.slots {
            slot.take_snapshot();
            slot.next();
            slot.save_snapshot();
        }
        self.cycles += 1;
        self.should_terminate = self
            .slots
            .iter()
            .all(|slot| slot.is_finished() || slot.is_suspended());
        tracing::trace!(cycle = self.cycles, should_terminate = self.should_terminate, "Scheduler cycle");
    }

    /// Cycle until every machine is finished or suspended, or until
    /// `max_cycles` cycles have run.
    ///
    /// With `stop_when_finished` unset the run always uses every cycle.
    pub fn run(&mut self, config: &SchedulerConfig) -> RunSummary {
        let mut cycles = 0;
        while cycles < config.max_cycles {
            if config.stop_when_finished && self.should_terminate {
                break;
            }
            self.cycle();
            cycles += 1;
        }

        let summary = RunSummary {
            cycles,
            terminated: self.should_terminate,
            finished: self.names(|slot| slot.is_finished()),
            suspended: self.names(|slot| slot.is_suspended()),
        };
        if !summary.terminated && cycles >= config.max_cycles {
            tracing::warn!(max_cycles = config.max_cycles, "Scheduler stopped at its cycle limit");
        }
        tracing::info!(
            cycles = summary.cycles,
            finished = summary.finished.len(),
            suspended = summary.suspended.len(),
            "Scheduler run complete"
        );
        summary
    }

    fn names(&self, keep: impl Fn(&dyn Executable) -> bool) -> Vec<String> {
        self.slots
            .iter()
            .filter(|slot| keep(&***slot))
            .map(|slot| slot.name().to_string())
            .collect()
    }
}
