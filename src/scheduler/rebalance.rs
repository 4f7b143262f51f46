use super::{constraints, util, RebalanceMode, ScheduleError, Scheduler};
use crate::model::{
    AllocationResult, Employee, EmployeeId, Imbalance, ShiftKind, ShiftMove, ShiftTable,
};
use chrono::{Duration, NaiveDate};

/// Passe post-allocation : corrige si demandé, puis signale l'écart restant.
pub(super) fn run(
    scheduler: &Scheduler<'_>,
    dates: &[NaiveDate],
    result: &mut AllocationResult,
) -> Result<(), ScheduleError> {
    let opts = scheduler.options();
    if opts.rebalance == RebalanceMode::Correct {
        correct(scheduler, dates, result)?;
    }

    result.imbalance = detect(scheduler.employees(), &result.table, opts.imbalance_threshold);
    if let Some(imb) = &result.imbalance {
        #[cfg(feature = "logging")]
        tracing::warn!(
            most = %imb.most_loaded,
            max = imb.max_days,
            least = %imb.least_loaded,
            min = imb.min_days,
            "workload imbalance"
        );
        result.log.push(format!(
            "workload imbalance detected: {} works {} day(s), {} works {} day(s)",
            imb.most_loaded, imb.max_days, imb.least_loaded, imb.min_days
        ));
    }
    Ok(())
}

/// Écart max − min des jours travaillés au-delà de `threshold`.
pub(super) fn detect(
    employees: &[Employee],
    table: &ShiftTable,
    threshold: usize,
) -> Option<Imbalance> {
    let loads: Vec<(&EmployeeId, usize)> = employees
        .iter()
        .map(|e| (&e.id, table.days_worked(&e.id)))
        .collect();
    let (most, max) = loads.iter().max_by_key(|(_, n)| *n)?;
    let (least, min) = loads.iter().min_by_key(|(_, n)| *n)?;
    (max - min > threshold).then(|| Imbalance {
        most_loaded: (*most).clone(),
        max_days: *max,
        least_loaded: (*least).clone(),
        min_days: *min,
    })
}

/// Déplace un créneau à la fois du plus chargé vers le moins chargé,
/// sans jamais enfreindre une contrainte du receveur.
fn correct(
    scheduler: &Scheduler<'_>,
    dates: &[NaiveDate],
    result: &mut AllocationResult,
) -> Result<(), ScheduleError> {
    let threshold = scheduler.options().imbalance_threshold;

    for _ in 0..dates.len() {
        if detect(scheduler.employees(), &result.table, threshold).is_none() {
            break;
        }
        let Some(mv) = next_move(scheduler, dates, &result.table) else {
            break;
        };

        result.table.unassign(mv.date, mv.shift, &mv.from);
        result.table.assign(mv.date, mv.shift, mv.to.clone())?;
        result.log.push(format!(
            "rebalance: {} {} moved from {} to {}",
            mv.date, mv.shift, mv.from, mv.to
        ));
        #[cfg(feature = "logging")]
        tracing::info!(date = %mv.date, shift = %mv.shift, from = %mv.from, to = %mv.to, "shift moved");
        result.moves.push(mv);
    }
    Ok(())
}

fn next_move(
    scheduler: &Scheduler<'_>,
    dates: &[NaiveDate],
    table: &ShiftTable,
) -> Option<ShiftMove> {
    let mut loads: Vec<(&Employee, usize)> = scheduler
        .employees()
        .iter()
        .map(|e| (e, table.days_worked(&e.id)))
        .collect();
    loads.sort_by_key(|(_, n)| *n);

    for &(donor, high) in loads.iter().rev() {
        for &(receiver, low) in loads.iter() {
            if high < low + 2 {
                break;
            }
            if let Some(mv) = find_transfer(scheduler, dates, table, donor, receiver) {
                return Some(mv);
            }
        }
    }
    None
}

/// Premier jour où `donor` tient un seul créneau que `receiver` peut reprendre.
fn find_transfer(
    scheduler: &Scheduler<'_>,
    dates: &[NaiveDate],
    table: &ShiftTable,
    donor: &Employee,
    receiver: &Employee,
) -> Option<ShiftMove> {
    for &date in dates {
        if table.is_working(date, &receiver.id) {
            continue;
        }
        let held: Vec<ShiftKind> = table.shifts_of(date, &donor.id).collect();
        let &[kind] = held.as_slice() else {
            continue;
        };

        let mut trial = table.clone();
        trial.unassign(date, kind, &donor.id);
        let ctx = scheduler.context(receiver, date, kind, &trial);
        if constraints::evaluate(&ctx).is_err() {
            continue;
        }
        if trial.assign(date, kind, receiver.id.clone()).is_err() {
            continue;
        }
        if !holds_after(scheduler, &trial, receiver, date) {
            continue;
        }
        return Some(ShiftMove {
            date,
            shift: kind,
            from: donor.id.clone(),
            to: receiver.id.clone(),
        });
    }
    None
}

/// Les jours suivants restent dans les bornes (série et fenêtres de 7 jours).
fn holds_after(
    scheduler: &Scheduler<'_>,
    table: &ShiftTable,
    employee: &Employee,
    date: NaiveDate,
) -> bool {
    let settings = scheduler.settings_for(&employee.id);
    if util::run_through(table, &employee.id, date) > settings.max_consecutive_days {
        return false;
    }
    (0..7)
        .filter_map(|ahead| date.checked_add_signed(Duration::days(ahead)))
        .all(|d| util::window_hours(table, &employee.id, d) <= settings.max_hours_per_week)
}
