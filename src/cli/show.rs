use std::path::PathBuf;

use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::{amount, hours};
use crate::models::AmountBasis;

pub fn run(config: Option<PathBuf>, today: Option<NaiveDate>) -> Result<()> {
    let prepared = super::run::prepare(config.as_deref(), today)?;

    let mut table = Table::new();
    table.set_header(vec![
        "Id", "Employee", "Month", "Code", "Customer", "Hours", "Total", "Rate", "Direct Cost",
    ]);
    for e in &prepared.employees {
        table.add_row(vec![
            Cell::new(e.employee_id),
            Cell::new(&e.employee_name),
            Cell::new(e.year_month),
            Cell::new(&e.customer_code),
            Cell::new(&e.customer_name),
            Cell::new(hours(e.hours)),
            Cell::new(hours(e.total_hours)),
            Cell::new(amount(e.converted_rate)),
            Cell::new(amount(e.apportioned_direct_cost)),
        ]);
    }
    println!("{}\n{table}", "Employee Detail".bold());

    let mut table = Table::new();
    table.set_header(vec![
        "Department", "Month", "Code", "Customer", "Contract", "Revenue", "Purchase", "Basis",
    ]);
    for p in &prepared.projects {
        let basis = match p.basis {
            AmountBasis::Actual => p.basis.to_string().green().to_string(),
            AmountBasis::Planned => p.basis.to_string().yellow().to_string(),
        };
        table.add_row(vec![
            Cell::new(&p.department),
            Cell::new(p.year_month),
            Cell::new(&p.customer_code),
            Cell::new(&p.customer_name),
            Cell::new(&p.contract_type),
            Cell::new(amount(p.revenue_amount)),
            Cell::new(amount(p.purchase_amount)),
            Cell::new(basis),
        ]);
    }
    println!("\n{}\n{table}", "Customer Job Profitability".bold());

    for file in &prepared.skipped_files {
        println!("{} {}", "skipped:".red(), file.display());
    }
    Ok(())
}
