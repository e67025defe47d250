use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Workbook is access restricted: {}", .0.display())]
    AccessRestricted(PathBuf),

    #[error("Sheet '{sheet}' not found in {}", path.display())]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("No sheet for month {month} in {} (tried half-width and full-width names)", path.display())]
    MissingMonthSheet { path: PathBuf, month: u32 },

    #[error("{}, sheet '{sheet}', row {row}, col {col}: expected {expected}, found {value:?}", path.display())]
    MalformedCell {
        path: PathBuf,
        sheet: String,
        row: u32,
        col: String,
        value: String,
        expected: &'static str,
    },

    #[error("No standard rate for employee {employee_id} ({employee_name})")]
    MissingRate {
        employee_id: i64,
        employee_name: String,
    },

    #[error("Failed to write report {}: {message}", path.display())]
    Report { path: PathBuf, message: String },

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
