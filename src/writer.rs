//! Report writer. The output workbook is edited in place: the two report
//! sheets are cleared and rewritten from the summaries, every other sheet
//! (reference tables, formulas, styles, macros) is saved back untouched.

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::info;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::error::{ReportError, Result};
use crate::models::{EmployeeMonthlySummary, ProjectMonthlySummary, YearMonth};
use crate::settings::SheetNames;
use crate::workbook::date_to_excel_serial;

pub const EMPLOYEE_HEADERS: [&str; 9] = [
    "Employee Id",
    "Employee Name",
    "Year/Month",
    "Customer Code",
    "Customer Name",
    "Hours",
    "Total Hours",
    "Converted Rate",
    "Direct Cost",
];

pub const PROJECT_HEADERS: [&str; 8] = [
    "Department",
    "Year/Month",
    "Customer Code",
    "Customer Name",
    "Contract",
    "Revenue",
    "Purchase",
    "Direct Cost",
];

const YEAR_MONTH_FORMAT: &str = "yyyy/mm";
const HOURS_FORMAT: &str = "#,##0.00";
const AMOUNT_FORMAT: &str = "#,##0";

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Cell writers (1-based column, row)
// ---------------------------------------------------------------------------

fn put_text(ws: &mut Worksheet, col: u32, row: u32, text: &str) {
    ws.get_cell_mut((col, row)).set_value_string(text);
}

fn put_number(ws: &mut Worksheet, col: u32, row: u32, value: f64, format: Option<&str>) {
    let cell = ws.get_cell_mut((col, row));
    cell.set_value_number(value);
    if let Some(code) = format {
        cell.get_style_mut()
            .get_number_format_mut()
            .set_format_code(code);
    }
}

fn put_year_month(ws: &mut Worksheet, col: u32, row: u32, year_month: YearMonth) {
    match year_month.first_day() {
        Some(day) => put_number(
            ws,
            col,
            row,
            date_to_excel_serial(day),
            Some(YEAR_MONTH_FORMAT),
        ),
        None => put_text(ws, col, row, &year_month.to_string()),
    }
}

fn put_headers(ws: &mut Worksheet, headers: &[&str]) {
    for (i, header) in headers.iter().enumerate() {
        let cell = ws.get_cell_mut((i as u32 + 1, 1));
        cell.set_value_string(*header);
        cell.get_style_mut().get_font_mut().set_bold(true);
    }
}

// ---------------------------------------------------------------------------
// Report sheets
// ---------------------------------------------------------------------------

/// Blank every populated cell of a previous run.
fn clear(ws: &mut Worksheet) {
    let (max_col, max_row) = ws.get_highest_column_and_row();
    for row in 1..=max_row {
        for col in 1..=max_col {
            if ws.get_cell((col, row)).is_some() {
                ws.get_cell_mut((col, row)).set_blank();
            }
        }
    }
}

/// The named sheet, cleared, or a new sheet appended after the others.
fn report_sheet<'a>(
    book: &'a mut Spreadsheet,
    output: &Path,
    name: &str,
) -> Result<&'a mut Worksheet> {
    let existing = book
        .get_sheet_collection()
        .iter()
        .position(|ws| ws.get_name() == name);
    match existing {
        Some(index) => {
            let ws = &mut book.get_sheet_collection_mut()[index];
            clear(ws);
            Ok(ws)
        }
        None => book.new_sheet(name).map_err(|e| ReportError::Report {
            path: output.to_path_buf(),
            message: format!("cannot add sheet '{name}': {e}"),
        }),
    }
}

fn write_employee_sheet(ws: &mut Worksheet, rows: &[EmployeeMonthlySummary]) {
    put_headers(ws, &EMPLOYEE_HEADERS);
    for (i, summary) in rows.iter().enumerate() {
        let row = i as u32 + 2;
        put_number(ws, 1, row, summary.employee_id as f64, None);
        put_text(ws, 2, row, &summary.employee_name);
        put_year_month(ws, 3, row, summary.year_month);
        put_text(ws, 4, row, &summary.customer_code);
        put_text(ws, 5, row, &summary.customer_name);
        put_number(ws, 6, row, to_f64(summary.hours), Some(HOURS_FORMAT));
        put_number(ws, 7, row, to_f64(summary.total_hours), Some(HOURS_FORMAT));
        put_number(ws, 8, row, to_f64(summary.converted_rate), Some(AMOUNT_FORMAT));
        put_number(
            ws,
            9,
            row,
            to_f64(summary.apportioned_direct_cost),
            Some(AMOUNT_FORMAT),
        );
    }
}

fn write_project_sheet(ws: &mut Worksheet, rows: &[ProjectMonthlySummary]) {
    put_headers(ws, &PROJECT_HEADERS);
    for (i, summary) in rows.iter().enumerate() {
        let row = i as u32 + 2;
        put_text(ws, 1, row, &summary.department);
        put_year_month(ws, 2, row, summary.year_month);
        put_text(ws, 3, row, &summary.customer_code);
        put_text(ws, 4, row, &summary.customer_name);
        put_text(ws, 5, row, &summary.contract_type);
        put_number(ws, 6, row, to_f64(summary.revenue_amount), Some(AMOUNT_FORMAT));
        put_number(ws, 7, row, to_f64(summary.purchase_amount), Some(AMOUNT_FORMAT));
        // Direct cost is a reserved column; always zero.
        put_number(ws, 8, row, 0.0, Some(AMOUNT_FORMAT));
    }
}

/// Load `output`, replace the contents of the two report sheets and save it
/// back to the same path.
pub fn write_report(
    output: &Path,
    names: &SheetNames,
    employees: &[EmployeeMonthlySummary],
    projects: &[ProjectMonthlySummary],
) -> Result<()> {
    let report_error = |message: String| ReportError::Report {
        path: output.to_path_buf(),
        message,
    };
    let mut book =
        umya_spreadsheet::reader::xlsx::read(output).map_err(|e| report_error(e.to_string()))?;

    write_employee_sheet(
        report_sheet(&mut book, output, &names.employee_detail)?,
        employees,
    );
    write_project_sheet(
        report_sheet(&mut book, output, &names.project_detail)?,
        projects,
    );

    umya_spreadsheet::writer::xlsx::write(&book, output)
        .map_err(|e| report_error(e.to_string()))?;
    info!(
        "wrote {} employee rows and {} project rows to {}",
        employees.len(),
        projects.len(),
        output.display()
    );
    Ok(())
}
