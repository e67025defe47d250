use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{ReportError, Result};
use crate::models::{Category, CostRecord, WorkHourRecord, YearMonth};
use crate::settings::Settings;
use crate::workbook::{Sheet, Workbook};

// Timesheet layout (1-based)
const TS_HEADER_ROW: u32 = 2;
const TS_YEAR_MONTH_COL: u32 = 2;
const TS_NAME_COL: u32 = 3;
const TS_ID_COL: u32 = 4;
const TS_FIRST_DATA_ROW: u32 = 4;
const TS_CUSTOMER_NAME_COL: u32 = 2;
const TS_HOURS_COL: u32 = 4;
const TS_CUSTOMER_CODE_COL: u32 = 5;

// Cost sheet layout (1-based)
const COST_FIRST_DATA_ROW: u32 = 2;
const COST_CATEGORY_COL: u32 = 1;
const COST_DEPARTMENT_COL: u32 = 3;
const COST_CUSTOMER_COL: u32 = 4;
const COST_CONTRACT_COL: u32 = 5;
const COST_PLANNED_COL: u32 = 9;
const COST_ACTUAL_COL: u32 = 10;

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Top-level files in `folder` accepted by `keep`, sorted by name.
/// `None` when the folder does not exist.
fn list_files(folder: &Path, keep: impl Fn(&str) -> bool) -> Result<Option<Vec<PathBuf>>> {
    if !folder.is_dir() {
        return Ok(None);
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if keep(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(Some(files))
}

pub fn timesheet_files(folder: &Path, extension: &str) -> Result<Option<Vec<PathBuf>>> {
    let extension = extension.trim_start_matches('.');
    list_files(folder, |name| {
        Path::new(name)
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
    })
}

pub fn cost_table_files(folder: &Path, prefix: &str) -> Result<Option<Vec<PathBuf>>> {
    list_files(folder, |name| name.starts_with(prefix))
}

// ---------------------------------------------------------------------------
// Timesheet extractor
// ---------------------------------------------------------------------------

/// Records from one timesheet workbook; empty when it has no summary sheet.
pub fn read_timesheet(
    path: &Path,
    sheet_name: &str,
    password: Option<&str>,
) -> Result<Vec<WorkHourRecord>> {
    let workbook = Workbook::open_with_password(path, password)?;
    match workbook.sheet(sheet_name) {
        Some(sheet) => read_timesheet_sheet(sheet),
        None => {
            info!(file = %path.display(), sheet = sheet_name, "no timesheet sheet, skipping");
            Ok(Vec::new())
        }
    }
}

fn is_end_of_entries(sheet: &Sheet, row: u32) -> bool {
    let name = sheet.text(row, TS_CUSTOMER_NAME_COL);
    name.is_empty() || name == "0"
}

pub fn read_timesheet_sheet(sheet: &Sheet) -> Result<Vec<WorkHourRecord>> {
    let year_month = sheet.year_month(TS_HEADER_ROW, TS_YEAR_MONTH_COL)?;
    let employee_name = sheet.text(TS_HEADER_ROW, TS_NAME_COL);
    let employee_id = sheet.integer(TS_HEADER_ROW, TS_ID_COL)?;
    info!(
        "processing timesheet {} ({year_month}, {employee_name}, {employee_id})",
        sheet.path().display()
    );

    let mut records = Vec::new();
    for row in TS_FIRST_DATA_ROW..=sheet.last_row() {
        if is_end_of_entries(sheet, row) {
            break;
        }
        if sheet.text(row, TS_HOURS_COL) == "0" {
            continue;
        }
        let hours = sheet
            .decimal(row, TS_HOURS_COL)?
            .filter(|h| !h.is_sign_negative())
            .ok_or_else(|| sheet.malformed(row, TS_HOURS_COL, "non-negative hours"))?;
        let record = WorkHourRecord {
            employee_id,
            employee_name: employee_name.clone(),
            year_month,
            customer_code: sheet.text(row, TS_CUSTOMER_CODE_COL),
            customer_name: sheet.text(row, TS_CUSTOMER_NAME_COL),
            hours,
        };
        debug!(?record, "work hours");
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Cost table extractor
// ---------------------------------------------------------------------------

/// Half-width and full-width sheet names for a fiscal month.
pub fn month_sheet_names(month: u32) -> Option<(&'static str, &'static str)> {
    let names = match month {
        1 => ("1月", "１月"),
        2 => ("2月", "２月"),
        3 => ("3月", "３月"),
        4 => ("4月", "４月"),
        5 => ("5月", "５月"),
        6 => ("6月", "６月"),
        7 => ("7月", "７月"),
        8 => ("8月", "８月"),
        9 => ("9月", "９月"),
        10 => ("10月", "１０月"),
        11 => ("11月", "１１月"),
        12 => ("12月", "１２月"),
        _ => return None,
    };
    Some(names)
}

pub fn month_sheet<'a>(workbook: &'a Workbook, month: u32) -> Result<&'a Sheet> {
    let missing = || ReportError::MissingMonthSheet {
        path: workbook.path().to_path_buf(),
        month,
    };
    let (half, full) = month_sheet_names(month).ok_or_else(missing)?;
    workbook
        .sheet(half)
        .or_else(|| workbook.sheet(full))
        .ok_or_else(missing)
}

/// Months 7-12 belong to the configured year, 1-6 to the year after.
pub fn fiscal_to_calendar(report_year: i32, month: u32) -> YearMonth {
    let year = if month <= 6 { report_year + 1 } else { report_year };
    YearMonth { year, month }
}

/// A non-empty cell replaces the value carried from rows above.
fn carry_forward(current: &mut String, cell: String) {
    if !cell.is_empty() {
        *current = cell;
    }
}

pub fn read_cost_table(path: &Path, report_year: i32) -> Result<Vec<CostRecord>> {
    let workbook = Workbook::open(path)?;
    let mut records = Vec::new();
    for month in 1..=12 {
        let sheet = month_sheet(&workbook, month)?;
        let year_month = fiscal_to_calendar(report_year, month);
        info!("processing cost sheet {} [{}] as {year_month}", path.display(), sheet.name);
        records.extend(read_cost_sheet(sheet, year_month)?);
    }
    Ok(records)
}

pub fn read_cost_sheet(sheet: &Sheet, year_month: YearMonth) -> Result<Vec<CostRecord>> {
    let mut category = String::new();
    let mut department = String::new();
    let mut records = Vec::new();

    for row in COST_FIRST_DATA_ROW..=sheet.last_row() {
        carry_forward(&mut category, sheet.text(row, COST_CATEGORY_COL));
        carry_forward(&mut department, sheet.text(row, COST_DEPARTMENT_COL));

        let customer_name = sheet.text(row, COST_CUSTOMER_COL);
        let contract_type = sheet.text(row, COST_CONTRACT_COL);
        if customer_name.is_empty() || contract_type.is_empty() {
            continue;
        }
        let record = CostRecord {
            year_month,
            category: Category::from_label(&category),
            department: department.clone(),
            customer_name,
            contract_type,
            planned_amount: sheet.decimal(row, COST_PLANNED_COL)?.unwrap_or(Decimal::ZERO),
            actual_amount: sheet.decimal(row, COST_ACTUAL_COL)?.unwrap_or(Decimal::ZERO),
        };
        debug!(?record, "cost line");
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Batch collection
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Extraction {
    pub work_hours: Vec<WorkHourRecord>,
    pub costs: Vec<CostRecord>,
    pub skipped_files: Vec<PathBuf>,
}

/// Run `read` over each file; access-restricted files are logged and
/// skipped, any other failure stops the batch.
fn read_each<T>(
    files: &[PathBuf],
    skipped: &mut Vec<PathBuf>,
    read: impl Fn(&Path) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for file in files {
        match read(file) {
            Ok(records) => out.extend(records),
            Err(ReportError::AccessRestricted(path)) => {
                warn!("cannot process {}, skipping", path.display());
                skipped.push(path);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

pub fn collect(settings: &Settings) -> Result<Extraction> {
    let mut extraction = Extraction::default();

    match timesheet_files(&settings.timesheet_folder, &settings.timesheet_extension)? {
        Some(files) => {
            extraction.work_hours = read_each(&files, &mut extraction.skipped_files, |f| {
                read_timesheet(
                    f,
                    &settings.sheets.timesheet,
                    settings.timesheet_password.as_deref(),
                )
            })?;
            info!("{} work-hour records", extraction.work_hours.len());
        }
        None => warn!(
            "timesheet folder {} does not exist, skipping",
            settings.timesheet_folder.display()
        ),
    }

    match cost_table_files(&settings.cost_table_folder, &settings.cost_table_prefix)? {
        Some(files) => {
            extraction.costs = read_each(&files, &mut extraction.skipped_files, |f| {
                read_cost_table(f, settings.report_year)
            })?;
            info!("{} cost records", extraction.costs.len());
        }
        None => warn!(
            "cost table folder {} does not exist, skipping",
            settings.cost_table_folder.display()
        ),
    }

    Ok(extraction)
}
