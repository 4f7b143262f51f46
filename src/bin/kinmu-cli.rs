#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use kinmu::{
    analysis::{audit_settings, monthly_summary},
    io,
    model::{EmployeeSettings, ShiftTable},
    scheduler::{util, AllocationOptions, RebalanceMode, Scheduler},
    storage::{JsonStorage, Storage, Workspace},
};
use clap::{Parser, Subcommand};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de génération des plannings mensuels (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de l'espace de travail
    #[arg(long, global = true, default_value = "kinmu.json")]
    workspace: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer des employés depuis un CSV (`id,name,category`)
    ImportEmployees {
        #[arg(long)]
        csv: String,
    },

    /// Importer les réglages individuels (JSON indexé par id)
    ImportSettings {
        #[arg(long)]
        json: String,
    },

    /// Générer le planning d'un mois
    Generate {
        #[arg(long)]
        year: i32,
        /// Mois 1-based (janvier = 1)
        #[arg(long)]
        month: u32,
        /// Déplace des créneaux pour réduire l'écart de charge
        #[arg(long)]
        rebalance: bool,
        /// Export JSON du résultat complet (journal inclus)
        #[arg(long)]
        report: Option<String>,
    },

    /// Vérifier les conflits sur le planning enregistré
    Check {
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Bilan mensuel par employé
    Summary {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Auditer les réglages avant génération
    Audit,

    /// Exporter le planning
    Export {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.workspace)?;
    let mut ws = if storage.path().exists() {
        storage.load()?
    } else {
        Workspace::default()
    };

    let code = match cli.cmd {
        Commands::ImportEmployees { csv } => {
            let employees = io::import_employees_csv(csv)?;
            let count = employees.len();
            ws.employees.extend(employees);
            // refuse d'enregistrer un roster avec des ids en double
            Scheduler::new(&ws.employees, &ws.settings)?;
            for e in &ws.employees {
                ws.settings
                    .entry(e.id.clone())
                    .or_insert_with(|| EmployeeSettings::for_category(e.category));
            }
            println!("imported {count} employee(s)");
            storage.save(&ws)?;
            0
        }
        Commands::ImportSettings { json } => {
            let settings = io::import_settings_json(json)?;
            ws.settings.extend(settings);
            // refuse d'enregistrer des réglages incohérents avec le roster
            Scheduler::new(&ws.employees, &ws.settings)?;
            storage.save(&ws)?;
            0
        }
        Commands::Generate {
            year,
            month,
            rebalance,
            report,
        } => {
            let opts = AllocationOptions {
                rebalance: if rebalance {
                    RebalanceMode::Correct
                } else {
                    RebalanceMode::Detect
                },
                ..AllocationOptions::default()
            };
            let result = Scheduler::new(&ws.employees, &ws.settings)?
                .with_options(opts)
                .generate(year, month)
                .with_context(|| format!("generating {year}-{month:02}"))?;

            if let Some(path) = report {
                io::export_result_json(path, &result)?;
            }
            let dates = util::month_dates(year, month)?;
            if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
                ws.shifts.clear_range(*first, *last);
            }
            ws.shifts.merge(result.table.clone());
            storage.save(&ws)?;

            if let Some(imb) = &result.imbalance {
                eprintln!(
                    "Imbalance: {} works {} day(s), {} works {} day(s)",
                    imb.most_loaded, imb.max_days, imb.least_loaded, imb.min_days
                );
            }
            if result.violations.is_empty() {
                println!("OK: schedule generated without violations");
                0
            } else {
                eprintln!("Found {} violation(s)", result.violations.len());
                for v in &result.violations {
                    eprintln!("  {v}");
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Check { report } => {
            let scheduler = Scheduler::new(&ws.employees, &ws.settings)?;
            let conflicts = scheduler.detect_conflicts(&ws.shifts);
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                if let Some(path) = report {
                    io::export_conflicts_csv(path, &conflicts)?;
                }
                2
            }
        }
        Commands::Summary {
            year,
            month,
            out_csv,
        } => {
            let summary = monthly_summary(&ws.shifts, &ws.employees, &ws.settings, year, month)?;
            if let Some(path) = out_csv {
                io::export_summary_csv(path, &summary)?;
            }
            for s in &summary {
                println!(
                    "{} | {} day(s) | {} off | {}h | target {:+}{}",
                    s.name,
                    s.days_worked,
                    s.days_off,
                    s.hours,
                    s.target_gap,
                    if s.min_days_off_met { "" } else { " | min days off NOT met" }
                );
            }
            0
        }
        Commands::Audit => {
            let issues = audit_settings(&ws.employees, &ws.settings);
            if issues.is_empty() {
                println!("OK: settings ready for generation");
                0
            } else {
                for issue in &issues {
                    eprintln!("{issue}");
                }
                2
            }
        }
        Commands::Export { out_json, out_csv } => {
            if let Some(path) = out_json {
                io::export_table_json(path, &ws.shifts)?;
            }
            if let Some(path) = out_csv {
                io::export_table_csv(path, &ws.shifts, &ws.employees)?;
            }
            print_table(&ws.shifts, &ws);
            0
        }
    };

    std::process::exit(code);
}

/// Impression compacte : une ligne par créneau pourvu.
fn print_table(table: &ShiftTable, ws: &Workspace) {
    for (date, day) in table.days() {
        for (kind, ids) in day {
            let names: Vec<&str> = ids
                .iter()
                .map(|id| {
                    ws.employees
                        .iter()
                        .find(|e| &e.id == id)
                        .map(|e| e.name.as_str())
                        .unwrap_or(id.as_str())
                })
                .collect();
            println!("{date} | {kind} | {}", names.join(", "));
        }
    }
}
