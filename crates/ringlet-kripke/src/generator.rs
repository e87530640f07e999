//! Explicit-state exploration of a machine into a Kripke structure
//!
//! Starting from a machine's current configuration, every reachable
//! configuration is discovered breadth first. Each configuration is expanded
//! once per combination of the sensor and external variable values its
//! current state reads. Inputs are injected in place of handler reads and
//! actuator writes are only cached, so exploration never touches the real
//! environment.

use crate::edge::KripkeEdge;
use crate::errors::{KripkeError, Result};
use crate::property::{KripkeStateProperty, KripkeStatePropertyList};
use crate::spinner::{Combinations, Spinner};
use crate::structure::{InMemoryKripkeStructure, KripkeStructure};
use indexmap::IndexMap;
use ringlet_core::{HandlerKind, Machine, MachineContext, Ringlet, VariableKey};
use std::collections::VecDeque;

/// Default bound on the number of recorded states
pub const DEFAULT_MAX_STATES: usize = 10_000;

/// Breadth-first Kripke structure generator for a single machine
#[derive(Debug, Clone)]
pub struct MachineKripkeGenerator {
    spinners: IndexMap<VariableKey, Spinner>,
    max_states: usize,
    record_environment: bool,
}

impl Default for MachineKripkeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STATES)
    }
}

impl MachineKripkeGenerator {
    /// A generator that gives up after `max_states` states
    pub fn new(max_states: usize) -> Self {
        Self {
            spinners: IndexMap::new(),
            max_states,
            record_environment: false,
        }
    }

    /// Explore `spinner`'s values for the environment variable `key`
    pub fn with_spinner(mut self, key: impl Into<VariableKey>, spinner: Spinner) -> Self {
        self.spinners.insert(key.into(), spinner);
        self
    }

    /// Include the environment snapshot in every state's properties
    pub fn with_environment(mut self, record_environment: bool) -> Self {
        self.record_environment = record_environment;
        self
    }

    /// The configured state limit
    pub fn max_states(&self) -> usize {
        self.max_states
    }

    /// Properties labelling a machine configuration
    pub fn properties<C, R>(&self, machine: &Machine<C, R>) -> KripkeStatePropertyList
    where
        C: MachineContext,
        R: Ringlet<C>,
    {
        let definition = machine.definition();
        let data = machine.data();
        let suspended = data
            .suspended_state()
            .map(|id| definition.state_name(id).to_string());
        let actuators = data
            .actuator_values()
            .iter()
            .map(KripkeStateProperty::from)
            .collect();

        let mut properties = KripkeStatePropertyList::new()
            .with("current_state", definition.state_name(data.current_state()))
            .with("previous_state", definition.state_name(data.previous_state()))
            .with("status", data.status().to_string())
            .with("suspended_state", suspended)
            .with("context", KripkeStatePropertyList::from(&machine.context().record()))
            .with("actuators", KripkeStateProperty::Collection(actuators));
        if self.record_environment {
            let environment: KripkeStatePropertyList = data
                .fsm_context()
                .environment
                .iter()
                .map(|(key, value)| (key.as_str(), KripkeStateProperty::from(value)))
                .collect();
            properties.insert("environment", environment);
        }
        properties
    }

    /// Keys of the spinners relevant to the machine's current state
    fn inputs_of<C, R>(&self, machine: &Machine<C, R>) -> Vec<VariableKey>
    where
        C: MachineContext,
        R: Ringlet<C>,
    {
        let definition = machine.definition();
        let Some(state) = definition.state(machine.current_state()) else {
            return Vec::new();
        };
        state
            .environment_variables()
            .iter()
            .filter(|key| {
                matches!(
                    definition.handlers().kind_of(key.as_str()),
                    Some(HandlerKind::Sensor | HandlerKind::ExternalVariable)
                )
            })
            .filter(|key| self.spinners.contains_key(*key))
            .cloned()
            .collect()
    }

    /// Explore every configuration reachable from `machine`.
    ///
    /// Finished machines are not expanded, so they end up as accepting
    /// states. The machine itself is left untouched.
    pub fn generate<C, R>(&self, machine: &Machine<C, R>) -> Result<InMemoryKripkeStructure>
    where
        C: MachineContext,
        R: Ringlet<C>,
    {
        let name = machine.definition().name();
        let mut structure = InMemoryKripkeStructure::new(name);
        let start = structure.add(self.properties(machine), true);
        let mut queue = VecDeque::from([(start, machine.clone())]);

        while let Some((id, current)) = queue.pop_front() {
            if current.data().is_finished() {
                continue;
            }
            let keys = self.inputs_of(&current);
            for inputs in Combinations::filtered(&self.spinners, |key| keys.contains(key)) {
                let mut next = current.clone();
                next.tick_isolated(&inputs);
                let properties = self.properties(&next);
                let known = structure.exists(&properties);
                let target = structure.add(properties.clone(), false);
                structure.add_edge(KripkeEdge::new(properties).with_take_snapshot(true), id)?;
                if known {
                    continue;
                }
                if structure.len() > self.max_states {
                    tracing::warn!(
                        machine = %name,
                        limit = self.max_states,
                        "Kripke exploration hit its state limit"
                    );
                    return Err(KripkeError::state_limit_exceeded(self.max_states));
                }
                queue.push_back((target, next));
            }
        }

        tracing::info!(
            machine = %name,
            states = structure.len(),
            initial = structure.initial_states().len(),
            accepting = structure.accepting_states().len(),
            "Kripke exploration complete"
        );
        Ok(structure)
    }
}

