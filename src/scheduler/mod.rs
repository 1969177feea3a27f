pub mod mlq;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::Ticks;
pub use mlq::MlqPolicy;

/// Priority level of a ready queue. `High` (1) is scanned first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Level {
    pub const COUNT: usize = 3;
    pub const ALL: [Level; Self::COUNT] = [Level::High, Level::Medium, Level::Low];

    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    /// One level toward `High`, or `None` at the top.
    pub fn promoted(self) -> Option<Level> {
        match self {
            Level::High => None,
            Level::Medium => Some(Level::High),
            Level::Low => Some(Level::Medium),
        }
    }

    /// One level toward `Low`, or `None` at the bottom.
    pub fn demoted(self) -> Option<Level> {
        match self {
            Level::High => Some(Level::Medium),
            Level::Medium => Some(Level::Low),
            Level::Low => None,
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level.number()
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::High),
            2 => Ok(Level::Medium),
            3 => Ok(Level::Low),
            other => Err(format!("priority {other} is outside 1..=3")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

pub const DEFAULT_QUANTUM: i64 = 2;
pub const DEFAULT_AGING_INTERVAL: i64 = 6;
pub const DEFAULT_STARVATION_INTERVAL: i64 = 5;

/// Run-wide scheduling parameters as supplied by the caller.
///
/// Signed like `ProcessDef`, so a negative value reaches validation and is
/// reported with every other bad field instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Round-robin quantum per level, indexed by `Level::index`.
    pub quantum: [i64; Level::COUNT],
    /// Ticks of CPU use after which a process is demoted.
    pub aging_interval: i64,
    /// Ticks of queueing after which a process is promoted.
    pub starvation_interval: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quantum: [DEFAULT_QUANTUM; Level::COUNT],
            aging_interval: DEFAULT_AGING_INTERVAL,
            starvation_interval: DEFAULT_STARVATION_INTERVAL,
        }
    }
}

/// Validated `Settings` in ticks. Fixed once a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyParams {
    pub quantum: [Ticks; Level::COUNT],
    pub aging_interval: Ticks,
    pub starvation_interval: Ticks,
}

impl PolicyParams {
    pub fn quantum(&self, level: Level) -> Ticks {
        self.quantum[level.index()]
    }
}
