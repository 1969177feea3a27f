use std::fmt;

use thiserror::Error;

use crate::core::Ticks;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Path of the offending field, e.g. `processes[1].burstTime`.
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Malformed process list or settings passed to `init`. Lists every offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid simulation input: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.field.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while stepping a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// `tick` called before `init`
    #[error("simulation has not been initialized")]
    NotInitialized,

    /// `tick` called on a finished run
    #[error("simulation already completed at t={now}")]
    AlreadyComplete { now: Ticks },

    /// A previous tick hit an invariant violation; the run cannot continue
    #[error("simulation faulted at t={now} and cannot advance")]
    Faulted { now: Ticks },

    /// Internal consistency fault detected after a tick
    #[error("invariant violated at t={now}: {detail}")]
    InvariantViolation { now: Ticks, detail: String },
}

impl SimError {
    /// Precondition failures: the state was left untouched.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            SimError::NotInitialized | SimError::AlreadyComplete { .. } | SimError::Faulted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_issue() {
        let err = ValidationError {
            issues: vec![
                FieldIssue {
                    field: "processes[0].name".into(),
                    message: "must not be empty".into(),
                },
                FieldIssue {
                    field: "settings.agingInterval".into(),
                    message: "must be greater than 0".into(),
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("processes[0].name: must not be empty"));
        assert!(msg.contains("settings.agingInterval: must be greater than 0"));
        assert!(err.has_field("settings.agingInterval"));
    }

    #[test]
    fn invariant_violation_is_not_an_invalid_state() {
        assert!(SimError::NotInitialized.is_invalid_state());
        assert!(SimError::AlreadyComplete { now: 4 }.is_invalid_state());
        assert!(
            !SimError::InvariantViolation {
                now: 1,
                detail: "x".into()
            }
            .is_invalid_state()
        );
    }
}
