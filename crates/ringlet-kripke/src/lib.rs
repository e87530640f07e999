//! Ringlet Kripke - recording machine executions as Kripke structures
//!
//! A Kripke structure is a labelled transition graph. Nodes are labelled
//! with the properties observed in one machine configuration and are
//! identified by those properties alone, so a configuration is recorded
//! exactly once however often it is reached.
//!
//! # Layers
//!
//! - [`KripkeStateProperty`] and [`KripkeStatePropertyList`]: node labels
//! - [`Constraint`]: clock conditions on edges, with sound reduction and
//!   configurable rendering
//! - [`KripkeEdge`] and [`KripkeState`]: edges merge by everything except
//!   their constraint
//! - [`KripkeStructure`] and [`InMemoryKripkeStructure`]: storage
//! - [`GenericKripkeStructureView`]: rendering through a handler
//! - [`MachineKripkeGenerator`]: breadth-first exploration of a machine

#![forbid(unsafe_code)]

/// Clock constraints
pub mod constraint;

/// Edges and their merge key
pub mod edge;

/// Recording and rendering errors
pub mod errors;

/// Exploration of a machine
pub mod generator;

/// Node labels
pub mod property;

/// Finite value domains
pub mod spinner;

/// Nodes
pub mod state;

/// Structure storage
pub mod structure;

/// Rendering
pub mod view;

pub use constraint::{Constraint, ConstraintValue, ExpressionFormat};
pub use edge::{ClockConstraint, EdgeKey, KripkeEdge};
pub use errors::{KripkeError, Result};
pub use generator::{MachineKripkeGenerator, DEFAULT_MAX_STATES};
pub use property::{KripkeStateProperty, KripkeStatePropertyList};
pub use spinner::{Combinations, Spinner};
pub use state::KripkeState;
pub use structure::{InMemoryKripkeStructure, KripkeStructure};
pub use view::{GenericKripkeStructureView, GraphVizViewHandler, KripkeStructureViewHandler, ViewData};
