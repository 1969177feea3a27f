use tracing::debug;

use super::{Level, PolicyParams};
use crate::core::{MlqCtx, ProcessId, ProcessState, SchedEvent};

/// Multi-level queue policy: per-level round robin, wait-based promotion and
/// usage-based demotion.
#[derive(Debug, Clone)]
pub struct MlqPolicy {
    params: PolicyParams,
}

impl MlqPolicy {
    pub fn new(params: PolicyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PolicyParams {
        &self.params
    }

    /// Starvation then aging for every queued process.
    ///
    /// Queues are visited level 1 to 3, front to back, over the membership
    /// taken before the pass, so a process moved here is not looked at twice.
    pub fn rebalance_ready(&self, ctx: &mut MlqCtx, events: &mut Vec<SchedEvent>) {
        for id in ctx.queued_ids() {
            if let Some(event) = self.promote_if_starved(ctx, id) {
                events.push(event);
                continue;
            }
            if let Some(event) = self.demote_if_aged(ctx, id) {
                events.push(event);
            }
        }
    }

    fn promote_if_starved(&self, ctx: &mut MlqCtx, id: ProcessId) -> Option<SchedEvent> {
        let process = ctx.process(id);
        if process.waiting_time < self.params.starvation_interval {
            return None;
        }
        let from = process.priority;
        let to = from.promoted()?;

        ctx.remove_from_queue(id);
        let process = ctx.process_mut(id);
        process.priority = to;
        process.waiting_time = 0;
        ctx.enqueue(id);

        debug!(process = id, %from, %to, "promoted after starving");
        Some(SchedEvent::Promoted { process: id, from, to })
    }

    fn demote_if_aged(&self, ctx: &mut MlqCtx, id: ProcessId) -> Option<SchedEvent> {
        let process = ctx.process(id);
        if process.processing_time < self.params.aging_interval {
            return None;
        }
        let from = process.priority;
        let to = from.demoted()?;

        ctx.remove_from_queue(id);
        let process = ctx.process_mut(id);
        process.priority = to;
        process.processing_time = 0;
        ctx.enqueue(id);

        debug!(process = id, %from, %to, "demoted after aging");
        Some(SchedEvent::Demoted {
            process: id,
            from,
            to,
            preempted: false,
        })
    }

    /// Aging for the process on the CPU. A demoted process gives up the CPU
    /// at once, whatever is left of its quantum, and joins the tail of its
    /// new level. Never subject to starvation: it accrues no waiting time.
    pub fn age_running(&self, ctx: &mut MlqCtx) -> Option<SchedEvent> {
        let running = ctx.running?;
        let process = ctx.process(running.id);
        if process.processing_time < self.params.aging_interval {
            return None;
        }
        let from = process.priority;
        let to = from.demoted()?;

        let id = ctx.clear_cpu()?;
        let process = ctx.process_mut(id);
        process.priority = to;
        process.processing_time = 0;
        process.state = ProcessState::Ready;
        ctx.enqueue(id);

        debug!(
            process = id,
            %from,
            %to,
            quantum_left = running.quantum_left,
            "running process demoted and preempted"
        );
        Some(SchedEvent::Demoted {
            process: id,
            from,
            to,
            preempted: true,
        })
    }

    /// Hand a free CPU to the head of the highest non-empty level.
    pub fn select_next(&self, ctx: &mut MlqCtx) -> Option<SchedEvent> {
        if !ctx.cpu_is_idle() {
            return None;
        }

        let (level, id) = Level::ALL
            .into_iter()
            .find_map(|level| ctx.dequeue_front(level).map(|id| (level, id)))?;

        let quantum = self.params.quantum(level);
        ctx.set_running(id, quantum);

        debug!(process = id, %level, quantum, "selected");
        Some(SchedEvent::Selected {
            process: id,
            level,
            quantum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PolicyParams {
        PolicyParams {
            quantum: [2, 3, 4],
            aging_interval: 6,
            starvation_interval: 5,
        }
    }

    fn ctx_with(levels: &[Level]) -> MlqCtx {
        let mut ctx = MlqCtx::new();
        for (i, level) in levels.iter().enumerate() {
            ctx.create_process(format!("P{i}"), 0, 10, *level);
        }
        ctx
    }

    #[test]
    fn starved_process_moves_up_one_level_to_the_tail() {
        let policy = MlqPolicy::new(params());
        let mut ctx = ctx_with(&[Level::Medium, Level::Low]);
        ctx.enqueue(0);
        ctx.enqueue(1);
        ctx.process_mut(1).waiting_time = 5;

        let mut events = Vec::new();
        policy.rebalance_ready(&mut ctx, &mut events);

        assert_eq!(
            events,
            vec![SchedEvent::Promoted {
                process: 1,
                from: Level::Low,
                to: Level::Medium
            }]
        );
        assert_eq!(ctx.queue(Level::Medium).iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(ctx.queue(Level::Low).is_empty());
        assert_eq!(ctx.process(1).waiting_time, 0);
    }

    #[test]
    fn starvation_wins_over_aging_in_the_same_pass() {
        let policy = MlqPolicy::new(params());
        let mut ctx = ctx_with(&[Level::Medium]);
        ctx.enqueue(0);
        ctx.process_mut(0).waiting_time = 7;
        ctx.process_mut(0).processing_time = 9;

        let mut events = Vec::new();
        policy.rebalance_ready(&mut ctx, &mut events);

        assert_eq!(events.len(), 1);
        assert_eq!(ctx.process(0).priority, Level::High);
        assert_eq!(ctx.process(0).processing_time, 9);
    }

    #[test]
    fn level_one_is_never_promoted_and_level_three_never_demoted() {
        let policy = MlqPolicy::new(params());
        let mut ctx = ctx_with(&[Level::High, Level::Low]);
        ctx.enqueue(0);
        ctx.enqueue(1);
        ctx.process_mut(0).waiting_time = 50;
        ctx.process_mut(1).processing_time = 50;
        ctx.process_mut(1).waiting_time = 0;

        let mut events = Vec::new();
        policy.rebalance_ready(&mut ctx, &mut events);

        assert!(events.is_empty());
        assert_eq!(ctx.process(0).priority, Level::High);
        assert_eq!(ctx.process(1).priority, Level::Low);
    }

    #[test]
    fn aged_running_process_is_preempted_mid_quantum() {
        let policy = MlqPolicy::new(params());
        let mut ctx = ctx_with(&[Level::Medium]);
        ctx.enqueue(0);
        policy.select_next(&mut ctx);
        ctx.process_mut(0).processing_time = 6;

        let event = policy.age_running(&mut ctx);

        assert_eq!(
            event,
            Some(SchedEvent::Demoted {
                process: 0,
                from: Level::Medium,
                to: Level::Low,
                preempted: true
            })
        );
        assert!(ctx.cpu_is_idle());
        assert_eq!(ctx.process(0).state, ProcessState::Ready);
        assert_eq!(ctx.process(0).processing_time, 0);
        assert_eq!(ctx.queue(Level::Low).front(), Some(&0));
    }

    #[test]
    fn selection_scans_levels_in_priority_order() {
        let policy = MlqPolicy::new(params());
        let mut ctx = ctx_with(&[Level::Low, Level::Medium, Level::Medium]);
        for id in 0..3 {
            ctx.enqueue(id);
        }

        assert_eq!(
            policy.select_next(&mut ctx),
            Some(SchedEvent::Selected {
                process: 1,
                level: Level::Medium,
                quantum: 3
            })
        );
        // CPU busy, nothing else is picked
        assert_eq!(policy.select_next(&mut ctx), None);
        assert_eq!(ctx.process(1).state, ProcessState::Running);
    }
}
