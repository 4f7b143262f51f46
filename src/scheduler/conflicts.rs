use super::{util, Conflict, ConflictKind, Scheduler};
use crate::model::{EmployeeId, ShiftKind, ShiftTable};
use chrono::NaiveDate;

pub(super) fn detect_conflicts(scheduler: &Scheduler<'_>, table: &ShiftTable) -> Vec<Conflict> {
    let mut out = Vec::new();

    // règles par créneau
    for (&date, day) in table.days() {
        for (&kind, ids) in day {
            for (idx, id) in ids.iter().enumerate() {
                let mut push = |kind_of: ConflictKind| {
                    out.push(Conflict {
                        employee: id.clone(),
                        date,
                        shift: Some(kind),
                        kind: kind_of,
                    })
                };

                if ids[..idx].contains(id) {
                    push(ConflictKind::DuplicateAssignment);
                    continue;
                }
                let Some(employee) = scheduler.find_employee(id) else {
                    push(ConflictKind::UnknownEmployee);
                    continue;
                };
                if kind == ShiftKind::Day && !employee.is_life_support() {
                    push(ConflictKind::DayRoleMismatch);
                }
                if scheduler.settings_for(id).is_forbidden(kind) {
                    push(ConflictKind::ForbiddenPriority);
                }
                if kind == ShiftKind::Night
                    && table.shifts_of(date, id).any(|k| k != ShiftKind::Night)
                {
                    push(ConflictKind::NightNotExclusive);
                }
            }
        }
    }

    // charge par employé
    for employee in scheduler.employees() {
        let settings = scheduler.settings_for(&employee.id);
        let worked = worked_dates(table, &employee.id);

        let mut run = 0u32;
        let mut prev: Option<NaiveDate> = None;
        for &date in &worked {
            run = if prev.and_then(|p| p.succ_opt()) == Some(date) {
                run + 1
            } else {
                1
            };
            if run == settings.max_consecutive_days + 1 {
                out.push(Conflict {
                    employee: employee.id.clone(),
                    date,
                    shift: None,
                    kind: ConflictKind::ConsecutiveOverrun,
                });
            }
            prev = Some(date);
        }

        // toute fenêtre en dépassement a une fin de fenêtre sur un jour travaillé
        for &date in &worked {
            if util::window_hours(table, &employee.id, date) > settings.max_hours_per_week {
                out.push(Conflict {
                    employee: employee.id.clone(),
                    date,
                    shift: None,
                    kind: ConflictKind::WeeklyHoursOverrun,
                });
            }
        }
    }

    out
}

fn worked_dates(table: &ShiftTable, id: &EmployeeId) -> Vec<NaiveDate> {
    table
        .days()
        .filter(|(_, day)| day.values().any(|ids| ids.contains(id)))
        .map(|(date, _)| *date)
        .collect()
}
