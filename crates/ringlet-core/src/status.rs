//! The control status layered on top of a machine's state graph
//!
//! The status tracks two orthogonal things: whether the machine is running
//! normally, finished, or moving through a suspend/resume/restart request,
//! and what kind of transition (if any) the last ringlet produced.
//!
//! The `*ing` variants report a pending [`ControlRequest`]. Requests are
//! queued by state bodies or a scheduler next to the settled status and are
//! consumed by the next ringlet, which either applies them (leaving the
//! matching `*ed` variant) or absorbs them without touching the status.

use crate::ids::StateId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the last ringlet did to the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// No transition fired; the state re-executed
    None,
    /// A transition fired back into the same state
    Same,
    /// The machine moved to a different state
    New,
}

impl TransitionKind {
    /// All kinds
    pub const ALL: [TransitionKind; 3] = [TransitionKind::None, TransitionKind::Same, TransitionKind::New];

    /// Classify a step from `previous` to `current`, given whether a
    /// transition predicate fired.
    pub fn between(previous: StateId, current: StateId, taken: bool) -> Self {
        if previous != current {
            TransitionKind::New
        } else if taken {
            TransitionKind::Same
        } else {
            TransitionKind::None
        }
    }

    /// Did the machine transition?
    pub fn transitioned(self) -> bool {
        !matches!(self, TransitionKind::None)
    }
}

/// Control requests a scheduler or a state body may queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlRequest {
    /// Park the machine in its suspend state
    Suspend,
    /// Return to the suspended state
    Resume,
    /// Return to the initial state
    Restart,
}

impl ControlRequest {
    /// The transient status reported while the request is pending
    pub fn status(self) -> FsmStatus {
        match self {
            ControlRequest::Suspend => FsmStatus::Suspending,
            ControlRequest::Resume => FsmStatus::Resuming,
            ControlRequest::Restart => FsmStatus::Restarting,
        }
    }
}

/// Control status of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsmStatus {
    /// Normal operation
    Executing(TransitionKind),
    /// Settled in an accepting state across two consecutive ringlets
    Finished,
    /// Restart requested; consumed by the next ringlet
    Restarting,
    /// Moved back to the initial state
    Restarted(TransitionKind),
    /// Resume requested; consumed by the next ringlet
    Resuming,
    /// Moved back to the state that was suspended
    Resumed(TransitionKind),
    /// Suspend requested; consumed by the next ringlet
    Suspending,
    /// Parked in the suspend state
    Suspended(TransitionKind),
}

impl Default for FsmStatus {
    /// A fresh machine behaves as if it just arrived in its first state.
    fn default() -> Self {
        FsmStatus::Executing(TransitionKind::New)
    }
}

impl FsmStatus {
    /// Every status, including every transition kind
    pub fn all() -> Vec<FsmStatus> {
        let mut all = Vec::with_capacity(16);
        for kind in TransitionKind::ALL {
            all.push(FsmStatus::Executing(kind));
        }
        all.push(FsmStatus::Finished);
        for kind in TransitionKind::ALL {
            all.push(FsmStatus::Restarted(kind));
        }
        all.push(FsmStatus::Restarting);
        for kind in TransitionKind::ALL {
            all.push(FsmStatus::Resumed(kind));
        }
        all.push(FsmStatus::Resuming);
        for kind in TransitionKind::ALL {
            all.push(FsmStatus::Suspended(kind));
        }
        all.push(FsmStatus::Suspending);
        all
    }

    /// True for the settled variants whose transition kind is not `None`.
    pub fn transitioned(self) -> bool {
        match self {
            FsmStatus::Executing(kind)
            | FsmStatus::Restarted(kind)
            | FsmStatus::Resumed(kind)
            | FsmStatus::Suspended(kind) => kind.transitioned(),
            FsmStatus::Finished
            | FsmStatus::Restarting
            | FsmStatus::Resuming
            | FsmStatus::Suspending => false,
        }
    }

    /// True for the transient request variants
    pub fn is_pending_request(self) -> bool {
        matches!(
            self,
            FsmStatus::Restarting | FsmStatus::Resuming | FsmStatus::Suspending
        )
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionKind::None => "none",
            TransitionKind::Same => "same",
            TransitionKind::New => "new",
        };
        f.write_str(name)
    }
}

impl fmt::Display for FsmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsmStatus::Executing(kind) => write!(f, "executing({kind})"),
            FsmStatus::Finished => f.write_str("finished"),
            FsmStatus::Restarting => f.write_str("restarting"),
            FsmStatus::Restarted(kind) => write!(f, "restarted({kind})"),
            FsmStatus::Resuming => f.write_str("resuming"),
            FsmStatus::Resumed(kind) => write!(f, "resumed({kind})"),
            FsmStatus::Suspending => f.write_str("suspending"),
            FsmStatus::Suspended(kind) => write!(f, "suspended({kind})"),
        }
    }
}
