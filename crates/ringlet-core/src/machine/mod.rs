//! Machine definitions, execution data and the runnable wrapper

mod data;
mod definition;
mod executable;

pub use data::FsmData;
pub use definition::FiniteStateMachine;
pub use executable::{Executable, Machine};
