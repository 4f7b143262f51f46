use crate::analysis::EmployeeSummary;
use crate::model::{AllocationResult, Employee, EmployeeId, EmploymentCategory, SettingsMap, ShiftTable};
use crate::scheduler::Conflict;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import d'employés depuis CSV: header `id,name,category` (id vide → UUID)
pub fn import_employees_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Employee>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let name = rec.get(1).context("missing name")?.trim();
        let category = rec.get(2).context("missing category")?.trim();
        if name.is_empty() {
            bail!("invalid employee row (empty name)");
        }
        let category: EmploymentCategory = category
            .parse()
            .with_context(|| format!("invalid category for {name}"))?;
        let id = if id.is_empty() {
            EmployeeId::random()
        } else {
            EmployeeId::new(id)
        };
        out.push(Employee {
            id,
            name: name.to_string(),
            category,
        });
    }
    Ok(out)
}

/// Import des réglages : objet JSON `{ "<employee id>": { ... } }`
pub fn import_settings_json<P: AsRef<Path>>(path: P) -> anyhow::Result<SettingsMap> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let settings: SettingsMap =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(settings)
}

/// Export JSON du résultat de génération (jolie mise en forme)
pub fn export_result_json<P: AsRef<Path>>(path: P, result: &AllocationResult) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(result)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export JSON du tableau seul
pub fn export_table_json<P: AsRef<Path>>(path: P, table: &ShiftTable) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(table)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV du tableau: header `date,shift,hours,employee_id,employee_name`
pub fn export_table_csv<P: AsRef<Path>>(
    path: P,
    table: &ShiftTable,
    employees: &[Employee],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "shift", "hours", "employee_id", "employee_name"])?;
    let mut hours = itoa::Buffer::new();
    for (date, day) in table.days() {
        let date = date.to_string();
        for (kind, ids) in day {
            for id in ids {
                let name = employees
                    .iter()
                    .find(|e| &e.id == id)
                    .map(|e| e.name.as_str())
                    .unwrap_or("");
                w.write_record([
                    date.as_str(),
                    kind.label(),
                    hours.format(kind.hours()),
                    id.as_str(),
                    name,
                ])?;
            }
        }
    }
    w.flush()?;
    Ok(())
}

/// Export CSV du bilan mensuel
pub fn export_summary_csv<P: AsRef<Path>>(path: P, summary: &[EmployeeSummary]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "employee_id",
        "name",
        "days_worked",
        "days_off",
        "hours",
        "min_days_off_met",
        "target_gap",
    ])?;
    let (mut a, mut b, mut c, mut d) = (
        itoa::Buffer::new(),
        itoa::Buffer::new(),
        itoa::Buffer::new(),
        itoa::Buffer::new(),
    );
    for s in summary {
        w.write_record([
            s.employee.as_str(),
            s.name.as_str(),
            a.format(s.days_worked),
            b.format(s.days_off),
            c.format(s.hours),
            if s.min_days_off_met { "true" } else { "false" },
            d.format(s.target_gap),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des conflits: header `employee_id,date,shift,kind`
pub fn export_conflicts_csv<P: AsRef<Path>>(path: P, conflicts: &[Conflict]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["employee_id", "date", "shift", "kind"])?;
    for c in conflicts {
        let date = c.date.to_string();
        w.write_record([
            c.employee.as_str(),
            date.as_str(),
            c.shift.map(|k| k.label()).unwrap_or(""),
            c.kind.label(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
