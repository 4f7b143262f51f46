mod assignment;
mod conflicts;
pub mod constraints;
mod rebalance;
mod types;
pub mod util;

pub use types::{AllocationOptions, Conflict, ConflictKind, RebalanceMode, ScheduleError};

use crate::model::{
    validate_inputs, AllocationResult, Employee, EmployeeId, EmployeeSettings, Imbalance,
    SettingsMap, ShiftKind, ShiftTable,
};
use chrono::NaiveDate;
use constraints::SlotContext;

/// Scheduler : instantané immuable du roster et des réglages.
#[derive(Debug)]
pub struct Scheduler<'a> {
    employees: &'a [Employee],
    settings: &'a SettingsMap,
    opts: AllocationOptions,
    defaults: EmployeeSettings,
}

impl<'a> Scheduler<'a> {
    /// Valide les entrées (ids uniques, réglages connus, priorités 1..=6,
    /// séries maximales couvertes par le balayage arrière).
    pub fn new(employees: &'a [Employee], settings: &'a SettingsMap) -> Result<Self, ScheduleError> {
        validate_inputs(employees, settings)?;
        let scheduler = Self {
            employees,
            settings,
            opts: AllocationOptions::default(),
            defaults: EmployeeSettings::default(),
        };
        scheduler.check_run_caps()?;
        Ok(scheduler)
    }

    pub fn with_options(mut self, opts: AllocationOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn options(&self) -> AllocationOptions {
        self.opts
    }

    pub fn employees(&self) -> &'a [Employee] {
        self.employees
    }

    pub fn find_employee(&self, id: &EmployeeId) -> Option<&'a Employee> {
        self.employees.iter().find(|e| &e.id == id)
    }

    /// Réglages de l'employé, ou les valeurs par défaut s'il n'en a pas.
    pub fn settings_for(&self, id: &EmployeeId) -> &EmployeeSettings {
        self.settings.get(id).unwrap_or(&self.defaults)
    }

    pub(crate) fn context<'s>(
        &'s self,
        employee: &'s Employee,
        date: NaiveDate,
        kind: ShiftKind,
        table: &'s ShiftTable,
    ) -> SlotContext<'s> {
        SlotContext {
            scan_days: self.opts.consecutive_scan_days,
            ..SlotContext::new(employee, self.settings_for(&employee.id), date, kind, table)
        }
    }

    /// Génère le planning du mois (`month` 1-based : janvier = 1).
    pub fn generate(&self, year: i32, month: u32) -> Result<AllocationResult, ScheduleError> {
        if self.employees.is_empty() {
            return Err(ScheduleError::InvalidRoster("no employees registered"));
        }
        if !self.employees.iter().any(Employee::is_life_support) {
            return Err(ScheduleError::InvalidRoster(
                "no life-support employee registered",
            ));
        }
        self.check_run_caps()?;
        let dates = util::month_dates(year, month)?;

        #[cfg(feature = "logging")]
        tracing::info!(year, month, employees = self.employees.len(), "generating schedule");

        let mut result = assignment::allocate(self, &dates)?;
        rebalance::run(self, &dates, &mut result)?;
        self.self_check(&result.table)?;

        #[cfg(feature = "logging")]
        tracing::info!(
            violations = result.violations.len(),
            moves = result.moves.len(),
            "schedule generated"
        );
        Ok(result)
    }

    /// Détecte les écarts aux règles dures sur un tableau quelconque.
    pub fn detect_conflicts(&self, table: &ShiftTable) -> Vec<Conflict> {
        conflicts::detect_conflicts(self, table)
    }

    /// Déséquilibre de charge (jours travaillés) au-delà du seuil configuré.
    pub fn detect_imbalance(&self, table: &ShiftTable) -> Option<Imbalance> {
        rebalance::detect(self.employees, table, self.opts.imbalance_threshold)
    }

    /// Le balayage arrière s'arrête après `consecutive_scan_days` jours :
    /// une série maximale plus longue ne serait jamais bornée.
    fn check_run_caps(&self) -> Result<(), ScheduleError> {
        let scan = self.opts.consecutive_scan_days;
        match self
            .employees
            .iter()
            .map(|e| (&e.id, self.settings_for(&e.id).max_consecutive_days))
            .find(|&(_, max)| max > scan)
        {
            Some((id, max)) => Err(ScheduleError::InvalidInput(format!(
                "max_consecutive_days {max} of employee {id} exceeds the {scan}-day scan"
            ))),
            None => Ok(()),
        }
    }

    fn self_check(&self, table: &ShiftTable) -> Result<(), ScheduleError> {
        match self
            .detect_conflicts(table)
            .into_iter()
            .find(|c| c.kind.is_structural())
        {
            Some(c) => Err(ScheduleError::InternalInconsistency(format!(
                "{} on {} for {}",
                c.kind.label(),
                c.date,
                c.employee
            ))),
            None => Ok(()),
        }
    }
}

/// Point d'entrée : génère le planning d'un mois avec les options par défaut.
pub fn generate_schedule(
    employees: &[Employee],
    settings: &SettingsMap,
    year: i32,
    month: u32,
) -> Result<AllocationResult, ScheduleError> {
    Scheduler::new(employees, settings)?.generate(year, month)
}
