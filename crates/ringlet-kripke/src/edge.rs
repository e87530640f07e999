//! Edges between Kripke states

use crate::constraint::Constraint;
use crate::property::KripkeStatePropertyList;
use serde::{Deserialize, Serialize};

/// Clock constraints are expressed over an unsigned timer value
pub type ClockConstraint = Constraint<u64>;

/// A recorded step from one Kripke state to the state labelled `target`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KripkeEdge {
    /// Clock the constraint refers to, if the edge is timed
    pub clock_name: Option<String>,
    /// Condition on the clock under which the edge applies.
    ///
    /// `None` means the edge always applies.
    pub constraint: Option<ClockConstraint>,
    /// Whether taking the edge resets the clock
    pub reset_clock: bool,
    /// Whether the step reads the environment before executing
    pub take_snapshot: bool,
    /// Time spent taking the edge
    pub time: u64,
    /// Property list of the state the edge leads to
    pub target: KripkeStatePropertyList,
}

impl KripkeEdge {
    /// An untimed edge to `target`
    pub fn new(target: KripkeStatePropertyList) -> Self {
        Self {
            clock_name: None,
            constraint: None,
            reset_clock: false,
            take_snapshot: false,
            time: 0,
            target,
        }
    }

    /// Attach a clock and the condition on it
    pub fn with_clock(mut self, clock_name: impl Into<String>, constraint: ClockConstraint) -> Self {
        self.clock_name = Some(clock_name.into());
        self.constraint = Some(constraint);
        self
    }

    /// Builder-style `reset_clock`
    pub fn with_reset_clock(mut self, reset_clock: bool) -> Self {
        self.reset_clock = reset_clock;
        self
    }

    /// Builder-style `take_snapshot`
    pub fn with_take_snapshot(mut self, take_snapshot: bool) -> Self {
        self.take_snapshot = take_snapshot;
        self
    }

    /// Builder-style `time`
    pub fn with_time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    /// Key identifying the edge regardless of its constraint
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            clock_name: self.clock_name.clone(),
            reset_clock: self.reset_clock,
            take_snapshot: self.take_snapshot,
            time: self.time,
            target: self.target.clone(),
        }
    }

    /// Widen this edge's constraint to also cover `other`.
    ///
    /// An unconstrained edge already applies everywhere and is left alone,
    /// as is a constrained edge merged with a missing constraint.
    pub fn merge_constraint(&mut self, other: Option<&ClockConstraint>) {
        let Some(other) = other else {
            return;
        };
        if let Some(existing) = self.constraint.take() {
            self.constraint = Some(Constraint::or(existing, other.clone()));
        }
    }
}

/// Every edge field except the constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    /// See [`KripkeEdge::clock_name`]
    pub clock_name: Option<String>,
    /// See [`KripkeEdge::reset_clock`]
    pub reset_clock: bool,
    /// See [`KripkeEdge::take_snapshot`]
    pub take_snapshot: bool,
    /// See [`KripkeEdge::time`]
    pub time: u64,
    /// See [`KripkeEdge::target`]
    pub target: KripkeStatePropertyList,
}
