use crate::scheduler::ScheduleError;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Priorité « interdit » : l'employé ne prend jamais ce créneau.
pub const FORBIDDEN_PRIORITY: u8 = 6;
/// Priorité appliquée quand aucune préférence n'est configurée.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Identifiant fort pour Employee
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catégorie d'emploi (liste fermée).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentCategory {
    FacilityDirector,
    DeputyDirector,
    ServiceManager,
    Counselor,
    LifeSupport,
    PartTime,
    Dispatch,
    #[serde(alias = "kaiteku")]
    ContractTemp,
}

impl EmploymentCategory {
    pub const ALL: [EmploymentCategory; 8] = [
        Self::FacilityDirector,
        Self::DeputyDirector,
        Self::ServiceManager,
        Self::Counselor,
        Self::LifeSupport,
        Self::PartTime,
        Self::Dispatch,
        Self::ContractTemp,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::FacilityDirector => "facility_director",
            Self::DeputyDirector => "deputy_director",
            Self::ServiceManager => "service_manager",
            Self::Counselor => "counselor",
            Self::LifeSupport => "life_support",
            Self::PartTime => "part_time",
            Self::Dispatch => "dispatch",
            Self::ContractTemp => "contract_temp",
        }
    }

    /// Aptitude par défaut aux nuits selon la catégorie (utilisée par l'audit des réglages).
    pub fn can_work_night(self) -> bool {
        !matches!(
            self,
            Self::ServiceManager | Self::Counselor | Self::PartTime
        )
    }

    /// Heures quotidiennes maximales du contrat type.
    pub fn max_hours_per_day(self) -> u32 {
        match self {
            Self::PartTime => 6,
            _ => 8,
        }
    }

    /// Jours travaillés par mois du contrat type.
    pub fn max_days_per_month(self) -> u32 {
        match self {
            Self::PartTime | Self::ContractTemp => 15,
            Self::Dispatch => 20,
            _ => 22,
        }
    }
}

impl fmt::Display for EmploymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EmploymentCategory {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "kaiteku" {
            return Ok(Self::ContractTemp);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| ScheduleError::InvalidInput(format!("unknown employment category: {s}")))
    }
}

/// Membre du personnel (lecture seule pour le moteur).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub category: EmploymentCategory,
}

impl Employee {
    pub fn new<I: AsRef<str>, N: Into<String>>(id: I, name: N, category: EmploymentCategory) -> Self {
        Self {
            id: EmployeeId::new(id),
            name: name.into(),
            category,
        }
    }

    pub fn is_life_support(&self) -> bool {
        self.category == EmploymentCategory::LifeSupport
    }
}

/// Les six créneaux quotidiens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    #[serde(alias = "morning")]
    Early,
    Day,
    #[serde(alias = "afternoon")]
    Midday,
    Night,
    Evening,
    NightSupport,
}

impl ShiftKind {
    pub const ALL: [ShiftKind; 6] = [
        Self::Early,
        Self::Day,
        Self::Midday,
        Self::Night,
        Self::Evening,
        Self::NightSupport,
    ];

    /// Ordre de traitement après le créneau « day ».
    pub const AFTER_DAY: [ShiftKind; 5] = [
        Self::Early,
        Self::Midday,
        Self::Night,
        Self::Evening,
        Self::NightSupport,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Day => "day",
            Self::Midday => "midday",
            Self::Night => "night",
            Self::Evening => "evening",
            Self::NightSupport => "night_support",
        }
    }

    /// Durée fixe en heures (table statique, pas d'horloge).
    pub fn hours(self) -> u32 {
        match self {
            Self::Early => 5,
            Self::Day => 10,
            Self::Midday => 5,
            Self::Night => 17,
            Self::Evening => 3,
            Self::NightSupport => 8,
        }
    }

    pub fn spans_midnight(self) -> bool {
        matches!(self, Self::Night | Self::NightSupport)
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShiftKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "early" | "morning" => Ok(Self::Early),
            "day" => Ok(Self::Day),
            "midday" | "afternoon" => Ok(Self::Midday),
            "night" => Ok(Self::Night),
            "evening" => Ok(Self::Evening),
            "night_support" | "night-support" => Ok(Self::NightSupport),
            other => Err(ScheduleError::InvalidInput(format!("unknown shift kind: {other}"))),
        }
    }
}

/// Réglages individuels. Absents = valeurs permissives par défaut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeSettings {
    /// 1 = préféré … 6 = interdit.
    pub shift_priorities: BTreeMap<ShiftKind, u8>,
    pub preferred_days_off: HashSet<Weekday>,
    pub unavailable_dates: BTreeSet<NaiveDate>,
    pub max_consecutive_days: u32,
    pub min_days_off: u32,
    pub max_hours_per_week: u32,
    pub target_work_days: u32,
}

impl Default for EmployeeSettings {
    fn default() -> Self {
        Self {
            shift_priorities: BTreeMap::new(),
            preferred_days_off: HashSet::new(),
            unavailable_dates: BTreeSet::new(),
            max_consecutive_days: 5,
            min_days_off: 8,
            max_hours_per_week: 40,
            target_work_days: 20,
        }
    }
}

impl EmployeeSettings {
    /// Réglages de départ pour une catégorie : plafond hebdomadaire sur
    /// cinq jours, objectif mensuel du contrat, nuits interdites si la
    /// catégorie ne les fait pas.
    pub fn for_category(category: EmploymentCategory) -> Self {
        let settings = Self {
            max_hours_per_week: category.max_hours_per_day() * 5,
            target_work_days: category.max_days_per_month(),
            ..Self::default()
        };
        if category.can_work_night() {
            settings
        } else {
            settings.with_priority(ShiftKind::Night, FORBIDDEN_PRIORITY)
        }
    }

    pub fn priority(&self, kind: ShiftKind) -> u8 {
        self.shift_priorities
            .get(&kind)
            .copied()
            .unwrap_or(DEFAULT_PRIORITY)
    }

    pub fn is_forbidden(&self, kind: ShiftKind) -> bool {
        self.priority(kind) == FORBIDDEN_PRIORITY
    }

    pub fn with_priority(mut self, kind: ShiftKind, priority: u8) -> Self {
        self.shift_priorities.insert(kind, priority);
        self
    }

    /// Même priorité pour tous les créneaux.
    pub fn with_all_priorities(mut self, priority: u8) -> Self {
        for kind in ShiftKind::ALL {
            self.shift_priorities.insert(kind, priority);
        }
        self
    }

    pub fn with_day_off(mut self, day: Weekday) -> Self {
        self.preferred_days_off.insert(day);
        self
    }

    pub fn with_unavailable(mut self, date: NaiveDate) -> Self {
        self.unavailable_dates.insert(date);
        self
    }

    fn validate(&self, id: &EmployeeId) -> Result<(), ScheduleError> {
        for (kind, p) in &self.shift_priorities {
            if !(1..=FORBIDDEN_PRIORITY).contains(p) {
                return Err(ScheduleError::InvalidInput(format!(
                    "priority {p} for {kind} of employee {id} is outside 1..=6"
                )));
            }
        }
        Ok(())
    }
}

/// Réglages indexés par employé.
pub type SettingsMap = BTreeMap<EmployeeId, EmployeeSettings>;

/// Vérifie la cohérence roster / réglages.
pub fn validate_inputs(employees: &[Employee], settings: &SettingsMap) -> Result<(), ScheduleError> {
    let mut seen = HashSet::with_capacity(employees.len());
    for e in employees {
        if !seen.insert(&e.id) {
            return Err(ScheduleError::InvalidInput(format!(
                "duplicate employee id: {}",
                e.id
            )));
        }
    }
    for (id, s) in settings {
        if !seen.contains(id) {
            return Err(ScheduleError::InvalidInput(format!(
                "settings reference unknown employee: {id}"
            )));
        }
        s.validate(id)?;
    }
    Ok(())
}

/// Affectations d'une journée : créneau → employés.
pub type DayShifts = BTreeMap<ShiftKind, Vec<EmployeeId>>;

/// Tableau mensuel : date ISO → créneau → employés (sans doublon par créneau).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftTable(BTreeMap<NaiveDate, DayShifts>);

impl ShiftTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ouvre la journée (entrée vide) : elle compte alors comme « traitée ».
    pub fn open_day(&mut self, date: NaiveDate) {
        self.0.entry(date).or_default();
    }

    pub fn has_day(&self, date: NaiveDate) -> bool {
        self.0.contains_key(&date)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayShifts> {
        self.0.get(&date)
    }

    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &DayShifts)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn assigned(&self, date: NaiveDate, kind: ShiftKind) -> &[EmployeeId] {
        self.0
            .get(&date)
            .and_then(|d| d.get(&kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ajoute un employé ; un doublon dans le créneau est une incohérence interne.
    pub fn assign(
        &mut self,
        date: NaiveDate,
        kind: ShiftKind,
        id: EmployeeId,
    ) -> Result<(), ScheduleError> {
        let slot = self.0.entry(date).or_default().entry(kind).or_default();
        if slot.contains(&id) {
            return Err(ScheduleError::InternalInconsistency(format!(
                "{id} assigned twice to {date} {kind}"
            )));
        }
        slot.push(id);
        Ok(())
    }

    /// Retire un employé d'un créneau ; `true` s'il y était.
    pub fn unassign(&mut self, date: NaiveDate, kind: ShiftKind, id: &EmployeeId) -> bool {
        let Some(day) = self.0.get_mut(&date) else {
            return false;
        };
        let Some(slot) = day.get_mut(&kind) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|x| x != id);
        let removed = slot.len() != before;
        if slot.is_empty() {
            day.remove(&kind);
        }
        removed
    }

    /// Supprime toutes les journées de l'intervalle [start, end].
    pub fn clear_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.0.retain(|d, _| *d < start || *d > end);
    }

    /// Fusionne `other` ; ses journées remplacent celles de `self`.
    pub fn merge(&mut self, other: ShiftTable) {
        self.0.extend(other.0);
    }

    pub fn shifts_of<'a>(
        &'a self,
        date: NaiveDate,
        id: &'a EmployeeId,
    ) -> impl Iterator<Item = ShiftKind> + 'a {
        self.0.get(&date).into_iter().flat_map(move |day| {
            day.iter()
                .filter(move |(_, ids)| ids.contains(id))
                .map(|(kind, _)| *kind)
        })
    }

    pub fn is_working(&self, date: NaiveDate, id: &EmployeeId) -> bool {
        self.shifts_of(date, id).next().is_some()
    }

    pub fn shift_count(&self, date: NaiveDate, id: &EmployeeId) -> usize {
        self.shifts_of(date, id).count()
    }

    pub fn hours_on(&self, date: NaiveDate, id: &EmployeeId) -> u32 {
        self.shifts_of(date, id).map(ShiftKind::hours).sum()
    }

    /// Nombre de jours travaillés (un jour compte une fois).
    pub fn days_worked(&self, id: &EmployeeId) -> usize {
        self.0
            .values()
            .filter(|day| day.values().any(|ids| ids.contains(id)))
            .count()
    }
}

/// Nature d'une violation non bloquante.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    DayShiftUnderstaffed { assigned: usize, required: usize },
    NoEligibleEmployee,
}

/// Violation consignée pendant l'allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub date: NaiveDate,
    pub shift: ShiftKind,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::DayShiftUnderstaffed { assigned, required } => write!(
                f,
                "{} {}: insufficient day-shift staffing ({assigned}/{required})",
                self.date, self.shift
            ),
            ViolationKind::NoEligibleEmployee => {
                write!(f, "{} {}: no eligible employee", self.date, self.shift)
            }
        }
    }
}

/// Déséquilibre de charge relevé par le rééquilibrage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imbalance {
    pub most_loaded: EmployeeId,
    pub max_days: usize,
    pub least_loaded: EmployeeId,
    pub min_days: usize,
}

/// Créneau déplacé par le rééquilibrage actif.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftMove {
    pub date: NaiveDate,
    pub shift: ShiftKind,
    pub from: EmployeeId,
    pub to: EmployeeId,
}

/// Résultat d'une génération.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub table: ShiftTable,
    pub log: Vec<String>,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imbalance: Option<Imbalance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<ShiftMove>,
}
