use super::{constraints, ScheduleError, Scheduler};
use crate::model::{AllocationResult, Employee, ShiftKind, ShiftTable, Violation, ViolationKind};
use chrono::NaiveDate;

/// Candidat retenu pour un créneau, avec sa priorité pour ce créneau.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    employee: &'a Employee,
    priority: u8,
}

/// Allocation gloutonne : jours croissants, « day » d'abord puis les cinq autres créneaux.
pub(super) fn allocate(
    scheduler: &Scheduler<'_>,
    dates: &[NaiveDate],
) -> Result<AllocationResult, ScheduleError> {
    let mut out = AllocationResult::default();

    for &date in dates {
        out.table.open_day(date);
        out.log.push(format!("{date}: allocation start"));

        assign_day_shift(scheduler, date, &mut out)?;
        for kind in ShiftKind::AFTER_DAY {
            assign_other_shift(scheduler, date, kind, &mut out)?;
        }
    }

    Ok(out)
}

/// Candidats passant les filtres de base, triés par priorité (tri stable : ordre du roster).
fn candidates<'a>(
    scheduler: &Scheduler<'a>,
    table: &ShiftTable,
    date: NaiveDate,
    kind: ShiftKind,
) -> Vec<Candidate<'a>> {
    let mut found: Vec<Candidate<'a>> = scheduler
        .employees()
        .iter()
        .filter_map(|employee| {
            let ctx = scheduler.context(employee, date, kind, table);
            match constraints::candidate(&ctx) {
                Ok(()) => Some(Candidate {
                    employee,
                    priority: ctx.priority(),
                }),
                Err(_reason) => {
                    #[cfg(feature = "logging")]
                    tracing::debug!(%date, %kind, employee = %employee.id, reason = %_reason, "rejected");
                    None
                }
            }
        })
        .collect();
    found.sort_by_key(|c| c.priority);
    found
}

fn assign_day_shift(
    scheduler: &Scheduler<'_>,
    date: NaiveDate,
    out: &mut AllocationResult,
) -> Result<(), ScheduleError> {
    let seats = scheduler.options().day_shift_seats;
    let found = candidates(scheduler, &out.table, date, ShiftKind::Day);

    for c in found.iter().take(seats) {
        out.table.assign(date, ShiftKind::Day, c.employee.id.clone())?;
        out.log.push(format!(
            "  {}: {} (priority {})",
            ShiftKind::Day,
            c.employee.name,
            c.priority
        ));
    }

    if found.len() < seats {
        record(
            out,
            Violation {
                date,
                shift: ShiftKind::Day,
                kind: ViolationKind::DayShiftUnderstaffed {
                    assigned: found.len(),
                    required: seats,
                },
            },
        );
    }
    Ok(())
}

fn assign_other_shift(
    scheduler: &Scheduler<'_>,
    date: NaiveDate,
    kind: ShiftKind,
    out: &mut AllocationResult,
) -> Result<(), ScheduleError> {
    let found = candidates(scheduler, &out.table, date, kind);
    if found.is_empty() {
        record(
            out,
            Violation {
                date,
                shift: kind,
                kind: ViolationKind::NoEligibleEmployee,
            },
        );
        return Ok(());
    }

    let chosen = match kind {
        ShiftKind::Night => found.iter().find(|c| {
            let ctx = scheduler.context(c.employee, date, kind, &out.table);
            constraints::night_shift_exclusive(&ctx).is_ok()
        }),
        _ => pick_within_capacity(scheduler, &out.table, date, kind, &found),
    }
    .copied();

    match chosen {
        Some(c) => {
            out.table.assign(date, kind, c.employee.id.clone())?;
            out.log.push(format!(
                "  {kind}: {} (priority {})",
                c.employee.name, c.priority
            ));
        }
        None => {
            // candidats existants mais tous hors capacité ou devancés : pas de violation
            out.log.push(format!(
                "  {kind}: left unfilled ({} candidate(s) outranked or at capacity)",
                found.len()
            ));
        }
    }
    Ok(())
}

/// Nombre maximal de créneaux dans la journée selon la priorité propre au créneau.
fn daily_capacity(priority: u8) -> usize {
    if priority <= 2 {
        2
    } else {
        1
    }
}

fn has_capacity(
    scheduler: &Scheduler<'_>,
    table: &ShiftTable,
    date: NaiveDate,
    kind: ShiftKind,
    c: &Candidate<'_>,
) -> bool {
    let ctx = scheduler.context(c.employee, date, kind, table);
    constraints::holds_no_night(&ctx).is_ok()
        && !table.assigned(date, kind).contains(&c.employee.id)
        && table.shift_count(date, &c.employee.id) < daily_capacity(c.priority)
}

/// Premier candidat dont la capacité et la préséance le permettent.
fn pick_within_capacity<'c, 'a>(
    scheduler: &Scheduler<'_>,
    table: &ShiftTable,
    date: NaiveDate,
    kind: ShiftKind,
    found: &'c [Candidate<'a>],
) -> Option<&'c Candidate<'a>> {
    let outranked = |c: &Candidate<'_>, better: &dyn Fn(u8) -> bool| {
        found.iter().any(|other| {
            other.employee.id != c.employee.id
                && better(other.priority)
                && has_capacity(scheduler, table, date, kind, other)
        })
    };

    found.iter().find(|&c| {
        if !has_capacity(scheduler, table, date, kind, c) {
            return false;
        }
        match c.priority {
            1 => true,
            2 => !outranked(c, &|p| p == 1),
            mine => !outranked(c, &|p| p < mine),
        }
    })
}

fn record(out: &mut AllocationResult, violation: Violation) {
    #[cfg(feature = "logging")]
    tracing::warn!(%violation, "constraint violation");
    out.log.push(format!("  ! {violation}"));
    out.violations.push(violation);
}
