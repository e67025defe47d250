use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, Sheets, Xlsx, XlsxError};
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::models::YearMonth;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn excel_epoch() -> NaiveDate {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    excel_epoch().checked_add_signed(chrono::Duration::days(serial as i64))
}

pub fn date_to_excel_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

/// Spreadsheet column letters for a 1-based column index: 1 -> A, 27 -> AA.
pub fn column_label(col: u32) -> String {
    let mut n = col;
    let mut label = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        label.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

fn number_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// True when the open failure means "this file may not be read by us"
/// rather than "this file is broken".
pub fn is_access_restricted(err: &calamine::Error) -> bool {
    use calamine::{Error, XlsError};
    match err {
        Error::Io(e) | Error::Xlsx(XlsxError::Io(e)) | Error::Xls(XlsError::Io(e)) => {
            e.kind() == std::io::ErrorKind::PermissionDenied
        }
        Error::Xlsx(XlsxError::Password) | Error::Xls(XlsError::Password) => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date number.
    DateTime(f64),
    Error(String),
}

impl Cell {
    pub fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            Data::DateTime(dt) => Self::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Error(e) => Self::Error(e.to_string()),
        }
    }

    /// Display text of the cell, roughly what a spreadsheet shows for a
    /// general-formatted value.
    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(f) => number_text(*f),
            Self::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Self::DateTime(serial) => excel_serial_to_date(*serial)
                .map(|d| d.format("%Y/%m/%d").to_string())
                .unwrap_or_else(|| number_text(*serial)),
            Self::Error(e) => e.clone(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

static EMPTY: Cell = Cell::Empty;

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

/// A named 2-D grid of cells addressed 1-based, like the spreadsheet UI.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    path: PathBuf,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &str, path: &Path, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            rows,
        }
    }

    fn from_range(name: &str, path: &Path, range: &Range<Data>) -> Self {
        let Some((row0, col0)) = range.start() else {
            return Self::new(name, path, Vec::new());
        };
        let mut rows = vec![Vec::new(); row0 as usize];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col0 as usize];
            cells.extend(row.iter().map(Cell::from_data));
            rows.push(cells);
        }
        Self::new(name, path, rows)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last row of the used range (1-based); 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn cell(&self, row: u32, col: u32) -> &Cell {
        if row == 0 || col == 0 {
            return &EMPTY;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
            .unwrap_or(&EMPTY)
    }

    pub fn text(&self, row: u32, col: u32) -> String {
        self.cell(row, col).text()
    }

    pub fn malformed(&self, row: u32, col: u32, expected: &'static str) -> ReportError {
        ReportError::MalformedCell {
            path: self.path.clone(),
            sheet: self.name.clone(),
            row,
            col: column_label(col),
            value: self.text(row, col),
            expected,
        }
    }

    /// `None` for a blank cell, otherwise the numeric value.
    pub fn decimal(&self, row: u32, col: u32) -> Result<Option<Decimal>> {
        match self.cell(row, col) {
            c if c.is_blank() => Ok(None),
            Cell::Number(f) => Decimal::from_f64(*f)
                .map(Some)
                .ok_or_else(|| self.malformed(row, col, "decimal")),
            Cell::Text(s) => s
                .trim()
                .replace(',', "")
                .parse::<Decimal>()
                .map(Some)
                .map_err(|_| self.malformed(row, col, "decimal")),
            _ => Err(self.malformed(row, col, "decimal")),
        }
    }

    pub fn integer(&self, row: u32, col: u32) -> Result<i64> {
        match self.cell(row, col) {
            Cell::Number(f) if f.fract() == 0.0 => Ok(*f as i64),
            Cell::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| self.malformed(row, col, "integer")),
            _ => Err(self.malformed(row, col, "integer")),
        }
    }

    /// A year-month cell: either a date value or `yyyy/MM` text.
    pub fn year_month(&self, row: u32, col: u32) -> Result<YearMonth> {
        let parsed = match self.cell(row, col) {
            Cell::DateTime(serial) | Cell::Number(serial) => excel_serial_to_date(*serial)
                .and_then(|d| {
                    use chrono::Datelike;
                    YearMonth::new(d.year(), d.month())
                }),
            Cell::Text(s) => YearMonth::parse(s).or_else(|| {
                use chrono::Datelike;
                let head = s.trim().get(..10)?;
                let d = NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()?;
                YearMonth::new(d.year(), d.month())
            }),
            _ => None,
        };
        parsed.ok_or_else(|| self.malformed(row, col, "year/month"))
    }
}

// ---------------------------------------------------------------------------
// Workbooks
// ---------------------------------------------------------------------------

fn open_error(path: &Path, err: calamine::Error) -> ReportError {
    if is_access_restricted(&err) {
        ReportError::AccessRestricted(path.to_path_buf())
    } else {
        ReportError::Workbook {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

fn read_sheets<RS: Read + Seek>(workbook: &mut Sheets<RS>, path: &Path) -> Result<Vec<Sheet>> {
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ReportError::Workbook {
                path: path.to_path_buf(),
                source: e,
            })?;
        sheets.push(Sheet::from_range(&name, path, &range));
    }
    Ok(sheets)
}

/// Decrypt an `EncryptedPackage` compound file into an in-memory xlsx.
fn decrypt(path: &Path, password: &str) -> Result<Sheets<Cursor<Vec<u8>>>> {
    let plain = office_crypto::decrypt_from_file(path, password).map_err(|e| {
        debug!(file = %path.display(), "cannot decrypt: {e:?}");
        ReportError::AccessRestricted(path.to_path_buf())
    })?;
    let xlsx = calamine::open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(plain))
        .map_err(|e| open_error(path, calamine::Error::Xlsx(e)))?;
    Ok(Sheets::Xlsx(xlsx))
}

#[derive(Debug, Clone)]
pub struct Workbook {
    path: PathBuf,
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Read every sheet of an xlsx/xlsm/xls/ods file into memory.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_password(path, None)
    }

    /// Like [`Workbook::open`], decrypting a password-protected xlsx/xlsm
    /// package with `password` first. A file that stays unreadable is
    /// [`ReportError::AccessRestricted`].
    pub fn open_with_password(path: &Path, password: Option<&str>) -> Result<Self> {
        let sheets = match (calamine::open_workbook_auto(path), password) {
            (Ok(mut workbook), _) => read_sheets(&mut workbook, path)?,
            (Err(calamine::Error::Xlsx(XlsxError::Password)), Some(password)) => {
                let mut workbook = decrypt(path, password)?;
                read_sheets(&mut workbook, path)?
            }
            (Err(e), _) => return Err(open_error(path, e)),
        };
        Ok(Self::from_sheets(path, sheets))
    }

    pub fn from_sheets(path: &Path, sheets: Vec<Sheet>) -> Self {
        Self {
            path: path.to_path_buf(),
            sheets,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn require_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheet(name).ok_or_else(|| ReportError::MissingSheet {
            path: self.path.clone(),
            sheet: name.to_string(),
        })
    }
}
