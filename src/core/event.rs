use serde::Serialize;

use crate::core::{ProcessId, Ticks};
use crate::scheduler::Level;

/// State transitions emitted by one `tick`, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchedEvent {
    Arrived {
        process: ProcessId,
        level: Level,
    },
    Completed {
        process: ProcessId,
    },
    QuantumExpired {
        process: ProcessId,
        level: Level,
    },
    Promoted {
        process: ProcessId,
        from: Level,
        to: Level,
    },
    // `preempted` is set when the demoted process was on the CPU
    Demoted {
        process: ProcessId,
        from: Level,
        to: Level,
        preempted: bool,
    },
    Selected {
        process: ProcessId,
        level: Level,
        quantum: Ticks,
    },
    // CPU idle even after selection
    CpuIdle,
}

impl SchedEvent {
    pub fn process(&self) -> Option<ProcessId> {
        match *self {
            SchedEvent::Arrived { process, .. }
            | SchedEvent::Completed { process }
            | SchedEvent::QuantumExpired { process, .. }
            | SchedEvent::Promoted { process, .. }
            | SchedEvent::Demoted { process, .. }
            | SchedEvent::Selected { process, .. } => Some(process),
            SchedEvent::CpuIdle => None,
        }
    }
}
