//! Hook dispatch
//!
//! Hooks are found by name prefix, sorted once per map by priority, and
//! invoked in a fixed phase order every tick.

pub mod phase;
pub mod error;
pub mod priority;
pub mod registry;
pub mod trigger;
pub mod report;
pub mod executor;

pub use phase::{PhaseKind, TICK_PHASES};
pub use error::{RegistryError, StepError};
pub use priority::{PriorityTable, DEFAULT_PRIORITY};
pub use registry::{HookRegistry, InitContext, Mechanic};
pub use trigger::handler_name;
pub use executor::{StepMap, StepMapBuilder, TickResult};
