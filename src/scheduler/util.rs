use super::ScheduleError;
use crate::model::{EmployeeId, ShiftTable};
use chrono::{Datelike, Duration, NaiveDate};
use std::iter;

/// Jours du mois (1-based, janvier = 1), dans l'ordre.
pub fn month_dates(year: i32, month: u32) -> Result<Vec<NaiveDate>, ScheduleError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ScheduleError::InvalidInput(format!("invalid month: {year}-{month}")))?;
    Ok(iter::successors(Some(first), |d| d.succ_opt())
        .take_while(|d| d.month() == month)
        .collect())
}

/// Heures travaillées sur les 7 jours se terminant à `date` (inclus).
/// Les jours hors du calendrier représentable comptent pour zéro.
pub(super) fn window_hours(table: &ShiftTable, id: &EmployeeId, date: NaiveDate) -> u32 {
    (0..7)
        .filter_map(|back| date.checked_sub_signed(Duration::days(back)))
        .map(|d| table.hours_on(d, id))
        .sum()
}

/// Jours travaillés d'affilée juste avant `date`, bornés à `cap`.
/// S'arrête sur un jour chômé ou une date absente du tableau.
pub(super) fn consecutive_before(
    table: &ShiftTable,
    id: &EmployeeId,
    date: NaiveDate,
    cap: u32,
) -> u32 {
    let mut run = 0;
    for back in 1..=i64::from(cap) {
        let Some(d) = date.checked_sub_signed(Duration::days(back)) else {
            break;
        };
        if !table.has_day(d) || !table.is_working(d, id) {
            break;
        }
        run += 1;
    }
    run
}

/// Longueur de la série de jours travaillés qui contient `date`.
pub(super) fn run_through(table: &ShiftTable, id: &EmployeeId, date: NaiveDate) -> u32 {
    if !table.is_working(date, id) {
        return 0;
    }
    let mut run = 1;
    let mut d = date;
    while let Some(prev) = d.pred_opt() {
        if !table.is_working(prev, id) {
            break;
        }
        run += 1;
        d = prev;
    }
    let mut d = date;
    while let Some(next) = d.succ_opt() {
        if !table.is_working(next, id) {
            break;
        }
        run += 1;
        d = next;
    }
    run
}
