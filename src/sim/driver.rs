use tracing::{info, warn};

use super::{
    process::{ProcessDef, validate},
    snapshot::Snapshot,
};
use crate::{
    core::{SchedCore, SchedEvent, Ticks},
    error::{SimError, ValidationError},
    scheduler::Settings,
};

/// One simulation session. Starts empty; `init` loads a run, `tick` steps it.
#[derive(Debug, Clone, Default)]
pub struct Sim {
    core: Option<SchedCore>,
    faulted: bool,
}

impl Sim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and load a run in one go.
    pub fn with_processes(defs: &[ProcessDef], settings: Settings) -> Result<Self, ValidationError> {
        let mut sim = Self::new();
        sim.init(defs, settings)?;
        Ok(sim)
    }

    /// Replace the current run with a fresh one at t=0. On a validation
    /// failure the session is left exactly as it was.
    pub fn init(&mut self, defs: &[ProcessDef], settings: Settings) -> Result<(), ValidationError> {
        let input = validate(defs, &settings).inspect_err(|err| {
            warn!(issues = err.issues.len(), "rejected simulation input");
        })?;

        let mut core = SchedCore::new(input.params);
        for spec in input.processes {
            core.ctx
                .create_process(spec.name, spec.arrival_time, spec.burst_time, spec.priority);
        }

        info!(processes = defs.len(), params = ?core.params(), "simulation initialized");
        self.core = Some(core);
        self.faulted = false;
        Ok(())
    }

    /// Advance one time unit. Fails without touching state when the session
    /// is uninitialized, finished or faulted.
    pub fn tick(&mut self) -> Result<Vec<SchedEvent>, SimError> {
        let core = self.core.as_mut().ok_or(SimError::NotInitialized)?;
        if self.faulted {
            return Err(SimError::Faulted { now: core.now() });
        }

        match core.tick() {
            Ok(events) => {
                if core.is_complete() {
                    info!(now = core.now(), "simulation complete");
                }
                Ok(events)
            }
            Err(err @ SimError::InvariantViolation { .. }) => {
                self.faulted = true;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Tick until every process has completed. Returns the final clock value.
    pub fn run_to_completion(&mut self) -> Result<Ticks, SimError> {
        while !self.is_complete() {
            self.tick()?;
        }
        Ok(self.now())
    }

    pub fn is_complete(&self) -> bool {
        self.core.as_ref().is_some_and(SchedCore::is_complete)
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    pub fn now(&self) -> Ticks {
        self.core.as_ref().map_or(0, SchedCore::now)
    }

    pub fn snapshot(&self) -> Result<Snapshot, SimError> {
        self.core
            .as_ref()
            .map(Snapshot::capture)
            .ok_or(SimError::NotInitialized)
    }

    pub fn core(&self) -> Option<&SchedCore> {
        self.core.as_ref()
    }
}
