//! Prédicats purs d'éligibilité : aucun état caché, même entrée → même verdict.

use super::util;
use crate::model::{Employee, EmployeeSettings, ShiftKind, ShiftTable};
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Motif de refus d'un candidat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotLifeSupport,
    PriorityForbidden,
    DateUnavailable,
    PreferredDayOff,
    ConsecutiveLimit { worked: u32, max: u32 },
    WeeklyHours { hours: u32, max: u32 },
    NightNotExclusive,
    HoldsNight,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLifeSupport => f.write_str("not a life-support employee"),
            Self::PriorityForbidden => f.write_str("priority 6 (forbidden)"),
            Self::DateUnavailable => f.write_str("unavailable on this date"),
            Self::PreferredDayOff => f.write_str("preferred weekly day off"),
            Self::ConsecutiveLimit { worked, max } => {
                write!(f, "worked {worked} consecutive days (max {max})")
            }
            Self::WeeklyHours { hours, max } => write!(f, "{hours}h over 7 days (max {max}h)"),
            Self::NightNotExclusive => f.write_str("already holds another shift today"),
            Self::HoldsNight => f.write_str("holds the night shift today"),
        }
    }
}

pub type Verdict = Result<(), Rejection>;

/// Un candidat face à un créneau, sur le tableau en cours.
#[derive(Debug, Clone, Copy)]
pub struct SlotContext<'a> {
    pub employee: &'a Employee,
    pub settings: &'a EmployeeSettings,
    pub date: NaiveDate,
    pub kind: ShiftKind,
    pub table: &'a ShiftTable,
    pub scan_days: u32,
}

impl<'a> SlotContext<'a> {
    pub fn new(
        employee: &'a Employee,
        settings: &'a EmployeeSettings,
        date: NaiveDate,
        kind: ShiftKind,
        table: &'a ShiftTable,
    ) -> Self {
        Self {
            employee,
            settings,
            date,
            kind,
            table,
            scan_days: 10,
        }
    }

    pub fn priority(&self) -> u8 {
        self.settings.priority(self.kind)
    }
}

/// Créneau « day » : réservé aux life_support, priorité « day » ≠ 6.
pub fn eligible_for_day(ctx: &SlotContext<'_>) -> Verdict {
    if !ctx.employee.is_life_support() {
        return Err(Rejection::NotLifeSupport);
    }
    if ctx.settings.is_forbidden(ShiftKind::Day) {
        return Err(Rejection::PriorityForbidden);
    }
    Ok(())
}

pub fn not_priority_forbidden(ctx: &SlotContext<'_>) -> Verdict {
    if ctx.settings.is_forbidden(ctx.kind) {
        return Err(Rejection::PriorityForbidden);
    }
    Ok(())
}

pub fn date_available(ctx: &SlotContext<'_>) -> Verdict {
    if ctx.settings.unavailable_dates.contains(&ctx.date) {
        return Err(Rejection::DateUnavailable);
    }
    if ctx.settings.preferred_days_off.contains(&ctx.date.weekday()) {
        return Err(Rejection::PreferredDayOff);
    }
    Ok(())
}

pub fn consecutive_days_ok(ctx: &SlotContext<'_>) -> Verdict {
    let worked = util::consecutive_before(ctx.table, &ctx.employee.id, ctx.date, ctx.scan_days);
    let max = ctx.settings.max_consecutive_days;
    if worked >= max {
        return Err(Rejection::ConsecutiveLimit { worked, max });
    }
    Ok(())
}

pub fn weekly_hours_ok(ctx: &SlotContext<'_>) -> Verdict {
    let hours = util::window_hours(ctx.table, &ctx.employee.id, ctx.date) + ctx.kind.hours();
    let max = ctx.settings.max_hours_per_week;
    if hours > max {
        return Err(Rejection::WeeklyHours { hours, max });
    }
    Ok(())
}

/// Nuit : aucun autre créneau le même jour.
pub fn night_shift_exclusive(ctx: &SlotContext<'_>) -> Verdict {
    if ctx
        .table
        .shifts_of(ctx.date, &ctx.employee.id)
        .any(|k| k != ShiftKind::Night)
    {
        return Err(Rejection::NightNotExclusive);
    }
    Ok(())
}

/// Pendant de la règle de nuit pour les créneaux traités après elle.
pub fn holds_no_night(ctx: &SlotContext<'_>) -> Verdict {
    if ctx
        .table
        .assigned(ctx.date, ShiftKind::Night)
        .contains(&ctx.employee.id)
    {
        return Err(Rejection::HoldsNight);
    }
    Ok(())
}

/// Filtre de candidature : rôle/priorité, date, série, heures.
pub fn candidate(ctx: &SlotContext<'_>) -> Verdict {
    if ctx.kind == ShiftKind::Day {
        eligible_for_day(ctx)?;
    } else {
        not_priority_forbidden(ctx)?;
    }
    date_available(ctx)?;
    consecutive_days_ok(ctx)?;
    weekly_hours_ok(ctx)
}

/// Candidature + exclusivité de nuit dans les deux sens.
pub fn evaluate(ctx: &SlotContext<'_>) -> Verdict {
    candidate(ctx)?;
    match ctx.kind {
        ShiftKind::Night => night_shift_exclusive(ctx),
        _ => holds_no_night(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmployeeId, EmploymentCategory};
    use chrono::Weekday;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn worker(category: EmploymentCategory) -> Employee {
        Employee::new("w", "Worker", category)
    }

    #[test]
    fn day_shift_requires_life_support() {
        let table = ShiftTable::new();
        let settings = EmployeeSettings::default().with_priority(ShiftKind::Day, 1);
        let pt = worker(EmploymentCategory::PartTime);
        let ctx = SlotContext::new(&pt, &settings, date(1), ShiftKind::Day, &table);
        assert_eq!(eligible_for_day(&ctx), Err(Rejection::NotLifeSupport));

        let ls = worker(EmploymentCategory::LifeSupport);
        let ctx = SlotContext::new(&ls, &settings, date(1), ShiftKind::Day, &table);
        assert_eq!(eligible_for_day(&ctx), Ok(()));

        let forbidden = EmployeeSettings::default().with_priority(ShiftKind::Day, 6);
        let ctx = SlotContext::new(&ls, &forbidden, date(1), ShiftKind::Day, &table);
        assert_eq!(eligible_for_day(&ctx), Err(Rejection::PriorityForbidden));
    }

    #[test]
    fn dates_and_weekdays_block() {
        let table = ShiftTable::new();
        let e = worker(EmploymentCategory::Dispatch);
        // 2025-09-01 est un lundi
        let settings = EmployeeSettings::default()
            .with_day_off(Weekday::Mon)
            .with_unavailable(date(3));
        let on = |d| SlotContext::new(&e, &settings, d, ShiftKind::Early, &table);
        assert_eq!(date_available(&on(date(1))), Err(Rejection::PreferredDayOff));
        assert_eq!(date_available(&on(date(2))), Ok(()));
        assert_eq!(date_available(&on(date(3))), Err(Rejection::DateUnavailable));
    }

    #[test]
    fn consecutive_limit_is_strict() {
        let e = worker(EmploymentCategory::LifeSupport);
        let settings = EmployeeSettings {
            max_consecutive_days: 3,
            ..EmployeeSettings::default()
        };
        let mut table = ShiftTable::new();
        for d in 1..=3 {
            table.open_day(date(d));
            table.assign(date(d), ShiftKind::Evening, e.id.clone()).unwrap();
        }
        let ctx = SlotContext::new(&e, &settings, date(4), ShiftKind::Evening, &table);
        assert_eq!(
            consecutive_days_ok(&ctx),
            Err(Rejection::ConsecutiveLimit { worked: 3, max: 3 })
        );
        let ctx = SlotContext::new(&e, &settings, date(3), ShiftKind::Evening, &table);
        assert_eq!(consecutive_days_ok(&ctx), Ok(()));
    }

    #[test]
    fn weekly_cap_includes_candidate_shift() {
        let e = worker(EmploymentCategory::LifeSupport);
        let settings = EmployeeSettings::default();
        let mut table = ShiftTable::new();
        for d in 1..=3 {
            table.assign(date(d), ShiftKind::Day, e.id.clone()).unwrap();
        }
        let day = SlotContext::new(&e, &settings, date(4), ShiftKind::Day, &table);
        assert_eq!(weekly_hours_ok(&day), Ok(()));
        let night = SlotContext::new(&e, &settings, date(4), ShiftKind::Night, &table);
        assert_eq!(
            weekly_hours_ok(&night),
            Err(Rejection::WeeklyHours { hours: 47, max: 40 })
        );
    }

    #[test]
    fn night_is_exclusive_both_ways() {
        let e = worker(EmploymentCategory::LifeSupport);
        let settings = EmployeeSettings::default();
        let mut table = ShiftTable::new();
        table.assign(date(5), ShiftKind::Early, e.id.clone()).unwrap();
        let ctx = SlotContext::new(&e, &settings, date(5), ShiftKind::Night, &table);
        assert_eq!(night_shift_exclusive(&ctx), Err(Rejection::NightNotExclusive));

        let mut table = ShiftTable::new();
        table.assign(date(5), ShiftKind::Night, e.id.clone()).unwrap();
        let ctx = SlotContext::new(&e, &settings, date(5), ShiftKind::Evening, &table);
        assert_eq!(evaluate(&ctx), Err(Rejection::HoldsNight));
    }

    #[test]
    fn predicates_are_repeatable() {
        let e = Employee {
            id: EmployeeId::new("x"),
            name: "X".into(),
            category: EmploymentCategory::LifeSupport,
        };
        let settings = EmployeeSettings::default().with_priority(ShiftKind::Midday, 6);
        let mut table = ShiftTable::new();
        table.assign(date(8), ShiftKind::Night, e.id.clone()).unwrap();
        for kind in ShiftKind::ALL {
            let ctx = SlotContext::new(&e, &settings, date(9), kind, &table);
            assert_eq!(evaluate(&ctx), evaluate(&ctx));
            assert_eq!(candidate(&ctx), candidate(&ctx));
        }
    }
}
