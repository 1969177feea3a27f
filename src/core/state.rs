use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::VecDeque;

use crate::scheduler::Level;

// Index into the process Vec
pub type ProcessId = usize;
pub type Ticks = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessState {
    NotArrived,
    Ready,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub remaining_time: Ticks,
    pub priority: Level,
    // Ticks run since the last demotion
    pub processing_time: Ticks,
    // Ticks spent queued since the last promotion
    pub waiting_time: Ticks,
    pub state: ProcessState,
    pub start_time: Option<Ticks>,
    pub completion_time: Option<Ticks>,
}

/// The process currently owning the CPU and what is left of its level's quantum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Running {
    pub id: ProcessId,
    pub level: Level,
    pub quantum_left: Ticks,
}

/// All mutable state of one run: clock, process registry, ready queues and the CPU.
#[derive(Debug, Clone)]
pub struct MlqCtx {
    pub now: Ticks,
    pub processes: Vec<Process>,
    pub queues: [VecDeque<ProcessId>; Level::COUNT],
    pub running: Option<Running>,
    pub process_to_level: FxHashMap<ProcessId, Level>,
}

impl MlqCtx {
    pub fn new() -> Self {
        Self {
            now: 0,
            processes: Vec::new(),
            queues: Default::default(),
            running: None,
            process_to_level: FxHashMap::default(),
        }
    }

    pub fn create_process(
        &mut self,
        name: String,
        arrival_time: Ticks,
        burst_time: Ticks,
        priority: Level,
    ) -> ProcessId {
        let id = self.processes.len();
        self.processes.push(Process {
            id,
            name,
            arrival_time,
            burst_time,
            remaining_time: burst_time,
            priority,
            processing_time: 0,
            waiting_time: 0,
            state: ProcessState::NotArrived,
            start_time: None,
            completion_time: None,
        });
        id
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn process(&self, id: ProcessId) -> &Process {
        &self.processes[id]
    }

    pub fn process_mut(&mut self, id: ProcessId) -> &mut Process {
        &mut self.processes[id]
    }

    pub fn queue(&self, level: Level) -> &VecDeque<ProcessId> {
        &self.queues[level.index()]
    }

    /// Append `id` to the tail of the queue for its current priority.
    pub fn enqueue(&mut self, id: ProcessId) {
        debug_assert!(
            !self.process_to_level.contains_key(&id),
            "Process {id} already present in some ready queue"
        );

        let process = self.process_mut(id);
        debug_assert!(
            process.state != ProcessState::Completed && process.state != ProcessState::Running,
            "Process {id} must not be Running or Completed when enqueued"
        );
        process.state = ProcessState::Ready;
        let level = process.priority;

        self.queues[level.index()].push_back(id);
        self.process_to_level.insert(id, level);
    }

    pub fn dequeue_front(&mut self, level: Level) -> Option<ProcessId> {
        let id = self.queues[level.index()].pop_front()?;

        let removed = self.process_to_level.remove(&id);
        debug_assert!(removed.is_some(), "Process {id} missing queue membership");

        Some(id)
    }

    /// Take `id` out of whichever ready queue holds it. Returns the level it was in.
    pub fn remove_from_queue(&mut self, id: ProcessId) -> Option<Level> {
        let level = self.process_to_level.remove(&id)?;
        let queue = &mut self.queues[level.index()];
        let pos = queue.iter().position(|&queued| queued == id)?;
        queue.remove(pos);
        Some(level)
    }

    pub fn is_queued(&self, id: ProcessId) -> bool {
        self.process_to_level.contains_key(&id)
    }

    /// Queued process ids in scan order: level 1 first, each level front to back.
    pub fn queued_ids(&self) -> Vec<ProcessId> {
        self.queues.iter().flatten().copied().collect()
    }

    pub fn queues_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    pub fn cpu_is_idle(&self) -> bool {
        self.running.is_none()
    }

    pub fn set_running(&mut self, id: ProcessId, quantum: Ticks) {
        debug_assert!(
            !self.process_to_level.contains_key(&id),
            "Running process {id} must not be enqueued"
        );
        debug_assert!(self.running.is_none(), "CPU already running a process");

        let now = self.now;
        let process = self.process_mut(id);
        process.state = ProcessState::Running;
        process.start_time.get_or_insert(now);
        let level = process.priority;

        self.running = Some(Running {
            id,
            level,
            quantum_left: quantum,
        });
    }

    /// Release the CPU. The released process is left for the caller to requeue or complete.
    pub fn clear_cpu(&mut self) -> Option<ProcessId> {
        self.running.take().map(|running| running.id)
    }

    pub fn mark_completed(&mut self, id: ProcessId) {
        debug_assert!(
            !self.process_to_level.contains_key(&id),
            "Completing process {id} that is still enqueued"
        );

        let now = self.now;
        let process = self.process_mut(id);
        process.state = ProcessState::Completed;
        process.remaining_time = 0;
        process.completion_time = Some(now);
    }

    pub fn all_work_done(&self) -> bool {
        self.processes.iter().all(|p| p.remaining_time == 0)
    }
}

impl Default for MlqCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(defs: &[(&str, Level)]) -> MlqCtx {
        let mut ctx = MlqCtx::new();
        for (name, level) in defs {
            ctx.create_process(name.to_string(), 0, 4, *level);
        }
        ctx
    }

    #[test]
    fn enqueue_places_process_on_its_priority_level() {
        let mut ctx = ctx_with(&[("a", Level::Low), ("b", Level::High), ("c", Level::Low)]);
        for id in 0..3 {
            ctx.enqueue(id);
        }

        assert_eq!(ctx.queue(Level::High), &VecDeque::from([1]));
        assert_eq!(ctx.queue(Level::Low), &VecDeque::from([0, 2]));
        assert_eq!(ctx.queued_ids(), vec![1, 0, 2]);
        assert_eq!(ctx.process(0).state, ProcessState::Ready);
    }

    #[test]
    fn remove_from_queue_keeps_order_of_the_rest() {
        let mut ctx = ctx_with(&[("a", Level::Medium), ("b", Level::Medium), ("c", Level::Medium)]);
        for id in 0..3 {
            ctx.enqueue(id);
        }

        assert_eq!(ctx.remove_from_queue(1), Some(Level::Medium));
        assert_eq!(ctx.queue(Level::Medium), &VecDeque::from([0, 2]));
        assert!(!ctx.is_queued(1));
        assert_eq!(ctx.remove_from_queue(1), None);
    }

    #[test]
    fn set_running_records_first_start_only() {
        let mut ctx = ctx_with(&[("a", Level::High)]);
        ctx.advance_time(3);
        ctx.enqueue(0);
        let id = ctx.dequeue_front(Level::High).unwrap();
        ctx.set_running(id, 2);
        assert_eq!(ctx.process(0).start_time, Some(3));

        ctx.clear_cpu();
        ctx.process_mut(0).state = ProcessState::Ready;
        ctx.advance_time(4);
        ctx.set_running(0, 2);
        assert_eq!(ctx.process(0).start_time, Some(3));
        assert_eq!(ctx.running.map(|r| r.quantum_left), Some(2));
    }
}
