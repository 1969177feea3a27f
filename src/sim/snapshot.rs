use serde::Serialize;

use crate::core::{GanttBlock, Process, ProcessId, ProcessState, SchedCore, Ticks};
use crate::scheduler::Level;

pub const IDLE: &str = "Idle";

/// Per-process figures available once a process has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetrics {
    pub completion_time: Ticks,
    pub turnaround: Ticks,
    pub total_wait: Ticks,
    pub response: Ticks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessView {
    pub id: ProcessId,
    pub name: String,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub remaining_time: Ticks,
    pub priority: Level,
    pub processing_time: Ticks,
    pub waiting_time: Ticks,
    pub state: ProcessState,
    pub start_time: Option<Ticks>,
    pub metrics: Option<ProcessMetrics>,
}

impl From<&Process> for ProcessView {
    fn from(p: &Process) -> Self {
        let metrics = p.completion_time.zip(p.start_time).map(|(done, start)| {
            let turnaround = done - p.arrival_time;
            ProcessMetrics {
                completion_time: done,
                turnaround,
                total_wait: turnaround.saturating_sub(p.burst_time),
                response: start - p.arrival_time,
            }
        });

        Self {
            id: p.id,
            name: p.name.clone(),
            arrival_time: p.arrival_time,
            burst_time: p.burst_time,
            remaining_time: p.remaining_time,
            priority: p.priority,
            processing_time: p.processing_time,
            waiting_time: p.waiting_time,
            state: p.state,
            start_time: p.start_time,
            metrics,
        }
    }
}

/// A Gantt block labelled for display: the process name, or `"Idle"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GanttEntry {
    pub identity: String,
    pub process: Option<ProcessId>,
    pub start: Ticks,
    pub end: Ticks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub current_time: Ticks,
    /// Ready queues, level 1 first, each front to back.
    pub queues: [Vec<ProcessView>; Level::COUNT],
    pub running: Option<ProcessView>,
    pub quantum_left: Option<Ticks>,
    pub timeline: Vec<GanttEntry>,
    pub processes: Vec<ProcessView>,
    pub complete: bool,
}

impl Snapshot {
    pub fn capture(core: &SchedCore) -> Self {
        let ctx = &core.ctx;
        let view = |id: ProcessId| ProcessView::from(ctx.process(id));

        let queues: [Vec<ProcessView>; Level::COUNT] =
            Level::ALL.map(|level| ctx.queue(level).iter().map(|&id| view(id)).collect());
        let timeline = core
            .timeline
            .blocks()
            .iter()
            .map(|block: &GanttBlock| GanttEntry {
                identity: block
                    .owner
                    .map_or_else(|| IDLE.to_string(), |id| ctx.process(id).name.clone()),
                process: block.owner,
                start: block.start,
                end: block.end,
            })
            .collect();

        Self {
            current_time: ctx.now,
            queues,
            running: ctx.running.map(|r| view(r.id)),
            quantum_left: ctx.running.map(|r| r.quantum_left),
            timeline,
            processes: ctx.processes.iter().map(ProcessView::from).collect(),
            complete: core.is_complete(),
        }
    }

    pub fn process(&self, name: &str) -> Option<&ProcessView> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn queue_names(&self, level: Level) -> Vec<&str> {
        self.queues[level.index()]
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn running_name(&self) -> Option<&str> {
        self.running.as_ref().map(|p| p.name.as_str())
    }

    /// Timeline as `(identity, start, end)` triples.
    pub fn gantt(&self) -> Vec<(&str, Ticks, Ticks)> {
        self.timeline
            .iter()
            .map(|entry| (entry.identity.as_str(), entry.start, entry.end))
            .collect()
    }
}
