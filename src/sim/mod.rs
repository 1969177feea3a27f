pub mod driver;
pub mod process;
pub mod snapshot;

pub use driver::Sim;
pub use process::{ProcessDef, ProcessSpec, ValidInput, validate};
pub use snapshot::{GanttEntry, IDLE, ProcessMetrics, ProcessView, Snapshot};
