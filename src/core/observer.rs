use super::{
    state::{MlqCtx, ProcessState},
    timeline::Timeline,
};

/// Post-tick consistency checks. Any failure is an internal fault, never a
/// caller error, and is reported instead of being corrected.
#[derive(Debug, Clone, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, ctx: &MlqCtx, timeline: &Timeline) -> Result<(), String> {
        self.step += 1;

        let running: Vec<_> = ctx
            .processes
            .iter()
            .filter(|p| p.state == ProcessState::Running)
            .map(|p| p.id)
            .collect();
        if running.len() > 1 {
            return Err(format!("more than one process is Running: {running:?}"));
        }
        if running.first().copied() != ctx.running.map(|r| r.id) {
            return Err(format!(
                "CPU owner {:?} disagrees with Running processes {running:?}",
                ctx.running.map(|r| r.id)
            ));
        }

        for process in &ctx.processes {
            let id = process.id;
            if (process.remaining_time == 0) != (process.state == ProcessState::Completed) {
                return Err(format!(
                    "process {id} has remaining_time {} in state {:?}",
                    process.remaining_time, process.state
                ));
            }

            let queued = ctx.is_queued(id);
            if queued != (process.state == ProcessState::Ready) {
                return Err(format!(
                    "process {id} in state {:?} has queue membership {queued}",
                    process.state
                ));
            }
        }

        for (&id, &level) in &ctx.process_to_level {
            if ctx.process(id).priority != level {
                return Err(format!(
                    "process {id} has priority {} but sits in queue {level}",
                    ctx.process(id).priority
                ));
            }
            if !ctx.queue(level).contains(&id) {
                return Err(format!(
                    "membership claims process {id} in queue {level}, but queue does not contain it"
                ));
            }
        }
        let queued_total: usize = ctx.queues.iter().map(|q| q.len()).sum();
        if queued_total != ctx.process_to_level.len() {
            return Err(format!(
                "{queued_total} queued entries but {} memberships",
                ctx.process_to_level.len()
            ));
        }

        if timeline.end() != ctx.now || timeline.total_duration() != ctx.now {
            return Err(format!(
                "timeline covers [0, {}) with {} ticks recorded at t={}",
                timeline.end(),
                timeline.total_duration(),
                ctx.now
            ));
        }
        for pair in timeline.blocks().windows(2) {
            if pair[0].end != pair[1].start || pair[0].owner == pair[1].owner {
                return Err(format!("timeline blocks {:?} and {:?} do not chain", pair[0], pair[1]));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Level;

    #[test]
    fn two_running_processes_are_reported() {
        let mut ctx = MlqCtx::new();
        ctx.create_process("a".into(), 0, 3, Level::High);
        ctx.create_process("b".into(), 0, 3, Level::High);
        ctx.set_running(0, 2);
        ctx.process_mut(1).state = ProcessState::Running;

        let err = Observer::new().observe(&ctx, &Timeline::new()).unwrap_err();
        assert!(err.contains("more than one"), "{err}");
    }

    #[test]
    fn consistent_state_passes() {
        let mut ctx = MlqCtx::new();
        ctx.create_process("a".into(), 0, 3, Level::Low);
        ctx.advance_time(1);
        ctx.enqueue(0);
        let mut timeline = Timeline::new();
        timeline.record(None, 0);

        let mut observer = Observer::new();
        assert_eq!(observer.observe(&ctx, &timeline), Ok(()));
        assert_eq!(observer.steps(), 1);
    }

    #[test]
    fn short_timeline_is_reported() {
        let mut ctx = MlqCtx::new();
        ctx.create_process("a".into(), 5, 3, Level::Low);
        ctx.advance_time(2);
        let mut timeline = Timeline::new();
        timeline.record(None, 0);

        assert!(Observer::new().observe(&ctx, &timeline).is_err());
    }
}
