//! Reference tables kept on the output workbook itself. Both are read
//! before the report sheets are rebuilt.

use crate::error::Result;
use crate::models::{CustomerEntry, RateEntry};
use crate::workbook::Workbook;

const FIRST_DATA_ROW: u32 = 2;

pub fn standard_rates(workbook: &Workbook, sheet_name: &str) -> Result<Vec<RateEntry>> {
    let sheet = workbook.require_sheet(sheet_name)?;
    let mut rates = Vec::new();
    for row in FIRST_DATA_ROW..=sheet.last_row() {
        if sheet.text(row, 1).is_empty() {
            break;
        }
        let standard_rate = sheet
            .decimal(row, 3)?
            .ok_or_else(|| sheet.malformed(row, 3, "standard rate"))?;
        rates.push(RateEntry {
            employee_id: sheet.integer(row, 1)?,
            employee_name: sheet.text(row, 2),
            standard_rate,
        });
    }
    Ok(rates)
}

pub fn customer_directory(workbook: &Workbook, sheet_name: &str) -> Result<Vec<CustomerEntry>> {
    let sheet = workbook.require_sheet(sheet_name)?;
    let mut customers = Vec::new();
    for row in FIRST_DATA_ROW..=sheet.last_row() {
        let code = sheet.text(row, 2);
        if code.is_empty() {
            break;
        }
        customers.push(CustomerEntry {
            code,
            name: sheet.text(row, 1),
        });
    }
    Ok(customers)
}
