pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use error::{FieldIssue, SimError, ValidationError};
pub use scheduler::{Level, PolicyParams, Settings};
pub use sim::{ProcessDef, Sim, Snapshot};
