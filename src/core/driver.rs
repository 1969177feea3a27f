use tracing::{debug, error, trace};

use super::{
    event::SchedEvent,
    observer::Observer,
    state::{MlqCtx, ProcessId, ProcessState, Ticks},
    timeline::Timeline,
};
use crate::error::SimError;
use crate::scheduler::{MlqPolicy, PolicyParams};

/// The tick pipeline. Owns all state of one run; advances only when `tick` is called.
#[derive(Debug, Clone)]
pub struct SchedCore {
    pub ctx: MlqCtx,
    pub timeline: Timeline,
    policy: MlqPolicy,
    observer: Observer,
}

impl SchedCore {
    pub fn new(params: PolicyParams) -> Self {
        Self {
            ctx: MlqCtx::new(),
            timeline: Timeline::new(),
            policy: MlqPolicy::new(params),
            observer: Observer::new(),
        }
    }

    /// Advance the run by one time unit. The step order is fixed: later steps
    /// see the effects of earlier ones within the same tick.
    pub fn tick(&mut self) -> Result<Vec<SchedEvent>, SimError> {
        if self.is_complete() {
            return Err(SimError::AlreadyComplete { now: self.ctx.now });
        }
        let mut events = Vec::new();

        self.ctx.advance_time(1);
        let now = self.ctx.now;
        trace!(now, "tick");

        self.handle_arrivals(&mut events);
        let executed = self.execute_running();
        self.accrue_waiting();

        if let Some(id) = executed {
            if !self.complete_if_done(id, &mut events) {
                self.expire_quantum(id, &mut events);
            }
        }

        self.policy.rebalance_ready(&mut self.ctx, &mut events);
        events.extend(self.policy.age_running(&mut self.ctx));

        match self.policy.select_next(&mut self.ctx) {
            Some(event) => events.push(event),
            None if self.ctx.cpu_is_idle() => events.push(SchedEvent::CpuIdle),
            None => {}
        }

        self.timeline.record(executed, now - 1);

        self.check_invariants()?;
        Ok(events)
    }

    fn handle_arrivals(&mut self, events: &mut Vec<SchedEvent>) {
        let now = self.ctx.now;
        let arriving: Vec<ProcessId> = self
            .ctx
            .processes
            .iter()
            .filter(|p| p.state == ProcessState::NotArrived && p.arrival_time <= now)
            .map(|p| p.id)
            .collect();

        for id in arriving {
            self.ctx.enqueue(id);
            let level = self.ctx.process(id).priority;
            debug!(now, process = id, %level, "arrived");
            events.push(SchedEvent::Arrived { process: id, level });
        }
    }

    // Returns the process that owned the CPU for the elapsed unit, if any
    fn execute_running(&mut self) -> Option<ProcessId> {
        let running = self.ctx.running.as_mut()?;
        running.quantum_left = running.quantum_left.saturating_sub(1);
        let id = running.id;

        let process = self.ctx.process_mut(id);
        process.remaining_time = process.remaining_time.saturating_sub(1);
        process.processing_time += 1;
        Some(id)
    }

    fn accrue_waiting(&mut self) {
        for id in self.ctx.queued_ids() {
            self.ctx.process_mut(id).waiting_time += 1;
        }
    }

    fn complete_if_done(&mut self, id: ProcessId, events: &mut Vec<SchedEvent>) -> bool {
        if self.ctx.process(id).remaining_time > 0 {
            return false;
        }

        self.ctx.clear_cpu();
        self.ctx.mark_completed(id);
        debug!(now = self.ctx.now, process = id, "completed");
        events.push(SchedEvent::Completed { process: id });
        true
    }

    fn expire_quantum(&mut self, id: ProcessId, events: &mut Vec<SchedEvent>) {
        let Some(running) = self.ctx.running else {
            return;
        };
        if running.quantum_left > 0 {
            return;
        }

        self.ctx.clear_cpu();
        self.ctx.process_mut(id).state = ProcessState::Ready;
        self.ctx.enqueue(id);
        debug!(now = self.ctx.now, process = id, level = %running.level, "quantum expired");
        events.push(SchedEvent::QuantumExpired {
            process: id,
            level: running.level,
        });
    }

    fn check_invariants(&mut self) -> Result<(), SimError> {
        let now = self.ctx.now;
        self.observer.observe(&self.ctx, &self.timeline).map_err(|detail| {
            error!(now, %detail, "invariant violated");
            SimError::InvariantViolation { now, detail }
        })
    }

    /// No queued work, an idle CPU and nothing left to run.
    pub fn is_complete(&self) -> bool {
        self.ctx.queues_empty() && self.ctx.cpu_is_idle() && self.ctx.all_work_done()
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn params(&self) -> &PolicyParams {
        self.policy.params()
    }

    pub fn observed_ticks(&self) -> u64 {
        self.observer.steps()
    }
}
