pub mod driver;
pub mod event;
pub mod observer;
pub mod state;
pub mod timeline;

pub use driver::SchedCore;
pub use event::SchedEvent;
pub use state::{MlqCtx, Process, ProcessId, ProcessState, Running, Ticks};
pub use timeline::{GanttBlock, Timeline};
