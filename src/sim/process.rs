use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::Ticks;
use crate::error::{FieldIssue, ValidationError};
use crate::scheduler::{Level, PolicyParams, Settings};

/// Caller-supplied process definition, as entered in a form or a workload file.
///
/// Numeric fields are signed so that out-of-range input reaches validation
/// instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDef {
    pub name: String,
    pub arrival_time: i64,
    pub burst_time: i64,
    pub priority: i64,
}

impl ProcessDef {
    pub fn new(name: impl Into<String>, arrival_time: i64, burst_time: i64, priority: i64) -> Self {
        Self {
            name: name.into(),
            arrival_time,
            burst_time,
            priority,
        }
    }
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }
}

/// A process definition that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub name: String,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub priority: Level,
}

/// Everything `init` needs, converted to engine types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidInput {
    pub processes: Vec<ProcessSpec>,
    pub params: PolicyParams,
}

fn positive(value: i64) -> Option<Ticks> {
    Ticks::try_from(value).ok().filter(|&v| v > 0)
}

/// Check the whole input and report every offending field at once.
pub fn validate(defs: &[ProcessDef], settings: &Settings) -> Result<ValidInput, ValidationError> {
    let mut issues = Issues::default();

    if defs.is_empty() {
        issues.push("processes", "at least one process is required");
    }

    let mut processes = Vec::with_capacity(defs.len());
    let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, def) in defs.iter().enumerate() {
        let name = def.name.trim();
        if name.is_empty() {
            issues.push(format!("processes[{i}].name"), "must not be empty");
        } else if let Some(first) = seen.insert(name, i) {
            issues.push(
                format!("processes[{i}].name"),
                format!("duplicate name {name:?}, already used by processes[{first}]"),
            );
            // Report later duplicates against the first occurrence
            seen.insert(name, first);
        }

        let arrival_time = Ticks::try_from(def.arrival_time).ok();
        if arrival_time.is_none() {
            issues.push(
                format!("processes[{i}].arrivalTime"),
                format!("must be >= 0, got {}", def.arrival_time),
            );
        }
        let burst_time = positive(def.burst_time);
        if burst_time.is_none() {
            issues.push(
                format!("processes[{i}].burstTime"),
                format!("must be > 0, got {}", def.burst_time),
            );
        }
        let priority = u8::try_from(def.priority)
            .ok()
            .and_then(|p| Level::try_from(p).ok());
        if priority.is_none() {
            issues.push(
                format!("processes[{i}].priority"),
                format!("must be 1, 2 or 3, got {}", def.priority),
            );
        }

        if let (Some(arrival_time), Some(burst_time), Some(priority)) =
            (arrival_time, burst_time, priority)
        {
            processes.push(ProcessSpec {
                name: name.to_string(),
                arrival_time,
                burst_time,
                priority,
            });
        }
    }

    let mut quantum = [0; Level::COUNT];
    for (i, (slot, &raw)) in quantum.iter_mut().zip(&settings.quantum).enumerate() {
        match positive(raw) {
            Some(q) => *slot = q,
            None => issues.push(format!("settings.quantum[{i}]"), format!("must be > 0, got {raw}")),
        }
    }
    let aging_interval = positive(settings.aging_interval);
    if aging_interval.is_none() {
        issues.push(
            "settings.agingInterval",
            format!("must be > 0, got {}", settings.aging_interval),
        );
    }
    let starvation_interval = positive(settings.starvation_interval);
    if starvation_interval.is_none() {
        issues.push(
            "settings.starvationInterval",
            format!("must be > 0, got {}", settings.starvation_interval),
        );
    }

    match (aging_interval, starvation_interval) {
        (Some(aging_interval), Some(starvation_interval)) if issues.0.is_empty() => Ok(ValidInput {
            processes,
            params: PolicyParams {
                quantum,
                aging_interval,
                starvation_interval,
            },
        }),
        _ => Err(ValidationError { issues: issues.0 }),
    }
}
