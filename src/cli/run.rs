use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::aggregator::{summarize_employees, summarize_projects};
use crate::error::Result;
use crate::importer;
use crate::models::{EmployeeMonthlySummary, ProjectMonthlySummary};
use crate::reference::{customer_directory, standard_rates};
use crate::settings::{load_settings, Settings};
use crate::workbook::Workbook;

/// Everything one invocation computes before anything is written.
pub struct Prepared {
    pub settings: Settings,
    pub employees: Vec<EmployeeMonthlySummary>,
    pub projects: Vec<ProjectMonthlySummary>,
    pub skipped_files: Vec<PathBuf>,
}

pub fn prepare(config: Option<&Path>, today: Option<NaiveDate>) -> Result<Prepared> {
    let settings = load_settings(config)?;
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());

    let extraction = importer::collect(&settings)?;

    let reference = Workbook::open(&settings.output_file)?;
    let rates = standard_rates(&reference, &settings.sheets.rate_settings)?;
    let customers = customer_directory(&reference, &settings.sheets.customer_settings)?;
    info!("{} rate entries, {} customers", rates.len(), customers.len());

    let employees = summarize_employees(&extraction.work_hours, &rates)?;
    let projects = summarize_projects(
        &extraction.costs,
        &customers,
        settings.actuals_handover_day,
        today,
    );

    Ok(Prepared {
        settings,
        employees,
        projects,
        skipped_files: extraction.skipped_files,
    })
}

pub fn run(config: Option<PathBuf>, today: Option<NaiveDate>) -> Result<()> {
    let prepared = prepare(config.as_deref(), today)?;
    crate::writer::write_report(
        &prepared.settings.output_file,
        &prepared.settings.sheets,
        &prepared.employees,
        &prepared.projects,
    )?;

    println!(
        "Wrote {} employee rows and {} project rows to {}",
        prepared.employees.len(),
        prepared.projects.len(),
        prepared.settings.output_file.display()
    );
    if !prepared.skipped_files.is_empty() {
        println!("Skipped {} restricted file(s):", prepared.skipped_files.len());
        for file in &prepared.skipped_files {
            println!("  {}", file.display());
        }
    }
    Ok(())
}
