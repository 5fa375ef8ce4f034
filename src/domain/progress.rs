use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single command unit reported by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Running,
    Success,
    Failure,
    Skipped,
}

impl UnitStatus {
    pub fn as_marker(&self) -> &'static str {
        match self {
            UnitStatus::Running => "running",
            UnitStatus::Success => "success",
            UnitStatus::Failure => "failure",
            UnitStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_marker())
    }
}

/// Progress of one named command unit (e.g. "Fetch Files")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProgress {
    pub unit_name: String,
    pub status: UnitStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl UnitProgress {
    pub fn new(unit_name: impl Into<String>, status: UnitStatus) -> Self {
        Self {
            unit_name: unit_name.into(),
            status,
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn is_running(&self) -> bool {
        self.status == UnitStatus::Running
    }
}

/// Closes every unit still marked running as failed.
///
/// Units without an end time get one stamped from their start time when
/// known, so completing the same list twice yields equal results.
pub fn complete_unit_progress(units: &[UnitProgress], now: DateTime<Utc>) -> Vec<UnitProgress> {
    units
        .iter()
        .map(|unit| {
            if !unit.is_running() {
                return unit.clone();
            }
            UnitProgress {
                unit_name: unit.unit_name.clone(),
                status: UnitStatus::Failure,
                start_time: unit.start_time,
                end_time: unit.end_time.or(Some(now)),
            }
        })
        .collect()
}
