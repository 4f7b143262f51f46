use crate::model::{EmployeeId, ShiftKind};
use chrono::NaiveDate;
use thiserror::Error;

/// Mode du rééquilibrage après allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebalanceMode {
    /// Signale le déséquilibre sans toucher au tableau.
    #[default]
    Detect,
    /// Déplace des créneaux des plus chargés vers les moins chargés.
    Correct,
}

/// Options d'allocation
#[derive(Debug, Clone, Copy)]
pub struct AllocationOptions {
    pub day_shift_seats: usize,
    pub imbalance_threshold: usize,
    pub consecutive_scan_days: u32,
    pub rebalance: RebalanceMode,
}

impl Default for AllocationOptions {
    fn default() -> Self {
        Self {
            day_shift_seats: 2,
            imbalance_threshold: 3,
            consecutive_scan_days: 10,
            rebalance: RebalanceMode::Detect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    NightNotExclusive,
    DayRoleMismatch,
    ForbiddenPriority,
    ConsecutiveOverrun,
    WeeklyHoursOverrun,
    UnknownEmployee,
    DuplicateAssignment,
}

impl ConflictKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::NightNotExclusive => "night_not_exclusive",
            Self::DayRoleMismatch => "day_role_mismatch",
            Self::ForbiddenPriority => "forbidden_priority",
            Self::ConsecutiveOverrun => "consecutive_overrun",
            Self::WeeklyHoursOverrun => "weekly_hours_overrun",
            Self::UnknownEmployee => "unknown_employee",
            Self::DuplicateAssignment => "duplicate_assignment",
        }
    }

    /// Défauts que l'allocateur ne doit jamais produire.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::NightNotExclusive | Self::DayRoleMismatch | Self::DuplicateAssignment
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub employee: EmployeeId,
    pub date: NaiveDate,
    pub shift: Option<ShiftKind>,
    pub kind: ConflictKind,
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid roster: {0}")]
    InvalidRoster(&'static str),
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}
