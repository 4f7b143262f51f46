#![forbid(unsafe_code)]
//! Kinmu : génération des plannings mensuels d'un établissement (sans BD).
//!
//! - Six créneaux fixes par jour, durées statiques.
//! - Allocation gloutonne par priorité, jour par jour.
//! - Violations consignées, jamais bloquantes ; seules les entrées invalides échouent.
//! - Entrée immuable, sortie par valeur : la persistance reste à l'appelant.
//! - Mois 1-based (janvier = 1), comme chrono.

pub mod analysis;
#[cfg(feature = "io")]
pub mod io;
pub mod model;
pub mod scheduler;
#[cfg(feature = "io")]
pub mod storage;

pub use analysis::{audit_settings, monthly_summary, EmployeeSummary, SettingsIssue};
pub use model::{
    AllocationResult, Employee, EmployeeId, EmployeeSettings, EmploymentCategory, Imbalance,
    SettingsMap, ShiftKind, ShiftMove, ShiftTable, Violation, ViolationKind,
};
pub use scheduler::{
    generate_schedule, AllocationOptions, Conflict, ConflictKind, RebalanceMode, ScheduleError,
    Scheduler,
};
#[cfg(feature = "io")]
pub use storage::{JsonStorage, Storage, Workspace};
