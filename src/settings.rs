use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{ReportError, Result};

pub const LOCAL_SETTINGS_FILE: &str = "appsettings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(alias = "KinmuhyoFolder")]
    pub timesheet_folder: PathBuf,
    #[serde(alias = "GenkaFolder")]
    pub cost_table_folder: PathBuf,
    pub output_file: PathBuf,
    /// Fiscal year start: cost sheets 7-12 fall in this year, 1-6 in the next.
    #[serde(alias = "Nen", deserialize_with = "number_or_string")]
    pub report_year: i32,
    /// Day of the month up to which a month's actual figures are reported.
    #[serde(alias = "JissekiHaneiDay", deserialize_with = "number_or_string")]
    pub actuals_handover_day: u32,
    #[serde(default = "default_timesheet_extension")]
    pub timesheet_extension: String,
    #[serde(default = "default_cost_table_prefix")]
    pub cost_table_prefix: String,
    /// Workbook password shared by the timesheets, if they are encrypted.
    #[serde(default)]
    pub timesheet_password: Option<String>,
    #[serde(default)]
    pub sheets: SheetNames,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SheetNames {
    pub timesheet: String,
    pub employee_detail: String,
    pub project_detail: String,
    pub rate_settings: String,
    pub customer_settings: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            timesheet: "Project Monthly Summary".to_string(),
            employee_detail: "Employee Detail".to_string(),
            project_detail: "Customer Job Profitability".to_string(),
            rate_settings: "Rate Settings".to_string(),
            customer_settings: "Customer Settings".to_string(),
        }
    }
}

fn default_timesheet_extension() -> String {
    "xlsm".to_string()
}

fn default_cost_table_prefix() -> String {
    "売上原価表".to_string()
}

/// Integers may be written either as JSON numbers or as numeric strings.
fn number_or_string<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + TryFrom<i64>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| de::Error::custom(format!("integer out of range: {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("not an integer: {s:?}"))),
        other => Err(de::Error::custom(format!("expected integer, found {other}"))),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timesheet_folder: PathBuf::from("timesheets"),
            cost_table_folder: PathBuf::from("cost-tables"),
            output_file: PathBuf::from("report.xlsx"),
            report_year: chrono::Local::now().year(),
            actuals_handover_day: 10,
            timesheet_extension: default_timesheet_extension(),
            cost_table_prefix: default_cost_table_prefix(),
            timesheet_password: None,
            sheets: SheetNames::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=31).contains(&self.actuals_handover_day) {
            return Err(ReportError::Settings(format!(
                "ActualsHandoverDay must be between 1 and 31, got {}",
                self.actuals_handover_day
            )));
        }
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("workcost")
}

/// `--config` wins, then `./appsettings.json`, then the per-user config file.
pub fn settings_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(LOCAL_SETTINGS_FILE);
    if local.exists() {
        return local;
    }
    config_dir().join("settings.json")
}

pub fn parse_settings(content: &str) -> Result<Settings> {
    let settings: Settings =
        serde_json::from_str(content).map_err(|e| ReportError::Settings(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}

pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = settings_path(explicit);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        ReportError::Settings(format!("cannot read {}: {e}", path.display()))
    })?;
    parse_settings(&content).map_err(|e| match e {
        ReportError::Settings(msg) => ReportError::Settings(format!("{}: {msg}", path.display())),
        other => other,
    })
}

pub fn save_template(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(ReportError::Settings(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(&Settings::default())
        .map_err(|e| ReportError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
