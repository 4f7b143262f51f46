//! Analyses consultatives hors allocation : audit des réglages et bilan mensuel.
//!
//! `min_days_off` et `target_work_days` ne sont jamais appliqués pendant
//! l'allocation ; ils ne sont évalués qu'ici.

use crate::model::{
    Employee, EmployeeId, EmployeeSettings, SettingsMap, ShiftKind, ShiftTable, FORBIDDEN_PRIORITY,
};
use crate::scheduler::{util, ScheduleError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    MissingSettings,
    LifeSupportDayForbidden,
    NightAllowedForCategory,
    TargetUnreachable { possible: u32, target: u32 },
}

/// Problème de configuration relevé avant génération.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsIssue {
    pub employee: EmployeeId,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for SettingsIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::MissingSettings => write!(f, "{}: settings not configured", self.employee),
            IssueKind::LifeSupportDayForbidden => write!(
                f,
                "{}: life-support employee with day shift forbidden",
                self.employee
            ),
            IssueKind::NightAllowedForCategory => write!(
                f,
                "{}: category cannot work nights but night priority is not 6",
                self.employee
            ),
            IssueKind::TargetUnreachable { possible, target } => write!(
                f,
                "{}: target of {target} work days unreachable with weekly days off ({possible} possible)",
                self.employee
            ),
        }
    }
}

/// Contrôle des réglages, dans l'ordre du roster.
pub fn audit_settings(employees: &[Employee], settings: &SettingsMap) -> Vec<SettingsIssue> {
    let mut out = Vec::new();
    for e in employees {
        let issue = |kind| SettingsIssue {
            employee: e.id.clone(),
            kind,
        };
        let Some(s) = settings.get(&e.id) else {
            out.push(issue(IssueKind::MissingSettings));
            continue;
        };
        if e.is_life_support() && s.is_forbidden(ShiftKind::Day) {
            out.push(issue(IssueKind::LifeSupportDayForbidden));
        }
        if !e.category.can_work_night() && s.priority(ShiftKind::Night) != FORBIDDEN_PRIORITY {
            out.push(issue(IssueKind::NightAllowedForCategory));
        }
        // approximation sur 30 jours : chaque jour de repos hebdomadaire retire 4 jours
        let days_off = s.preferred_days_off.len() as u32;
        let possible = 30u32.saturating_sub(days_off * 4);
        if s.target_work_days > possible {
            out.push(issue(IssueKind::TargetUnreachable {
                possible,
                target: s.target_work_days,
            }));
        }
    }
    out
}

/// Bilan d'un employé sur un mois.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub employee: EmployeeId,
    pub name: String,
    pub days_worked: u32,
    pub days_off: u32,
    pub hours: u32,
    pub shifts: BTreeMap<ShiftKind, u32>,
    pub min_days_off_met: bool,
    /// Jours travaillés − objectif (négatif = en dessous).
    pub target_gap: i64,
}

/// Bilan mensuel par employé (`month` 1-based).
pub fn monthly_summary(
    table: &ShiftTable,
    employees: &[Employee],
    settings: &SettingsMap,
    year: i32,
    month: u32,
) -> Result<Vec<EmployeeSummary>, ScheduleError> {
    let dates = util::month_dates(year, month)?;
    let defaults = EmployeeSettings::default();

    Ok(employees
        .iter()
        .map(|e| {
            let s = settings.get(&e.id).unwrap_or(&defaults);
            let mut shifts = BTreeMap::new();
            let mut days_worked = 0u32;
            let mut hours = 0u32;
            for &date in &dates {
                let mut worked = false;
                for kind in table.shifts_of(date, &e.id) {
                    *shifts.entry(kind).or_insert(0) += 1;
                    hours += kind.hours();
                    worked = true;
                }
                if worked {
                    days_worked += 1;
                }
            }
            let days_off = dates.len() as u32 - days_worked;
            EmployeeSummary {
                employee: e.id.clone(),
                name: e.name.clone(),
                days_worked,
                days_off,
                hours,
                shifts,
                min_days_off_met: days_off >= s.min_days_off,
                target_gap: i64::from(days_worked) - i64::from(s.target_work_days),
            }
        })
        .collect())
}
