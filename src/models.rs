use std::fmt;

use rust_decimal::Decimal;

/// Calendar month a record belongs to. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Parse `yyyy/MM`, `yyyy/M` or `yyyy-MM`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (y, m) = raw.split_once('/').or_else(|| raw.split_once('-'))?;
        let year: i32 = y.trim().parse().ok()?;
        let month: u32 = m.trim().parse().ok()?;
        if y.trim().len() != 4 {
            return None;
        }
        Self::new(year, month)
    }

    pub fn first_day(&self) -> Option<chrono::NaiveDate> {
        chrono::NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}", self.year, self.month)
    }
}

/// One employee's hours on one customer line in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkHourRecord {
    pub employee_id: i64,
    pub employee_name: String,
    pub year_month: YearMonth,
    pub customer_code: String,
    pub customer_name: String,
    pub hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Sale,
    Purchase,
    Other(String),
}

impl Category {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "sale" | "Sale" | "売上" => Self::Sale,
            "purchase" | "Purchase" | "仕入" => Self::Purchase,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sale => f.write_str("sale"),
            Self::Purchase => f.write_str("purchase"),
            Self::Other(label) => f.write_str(label),
        }
    }
}

/// One planned/actual line from a monthly cost sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    pub year_month: YearMonth,
    pub category: Category,
    pub department: String,
    pub customer_name: String,
    pub contract_type: String,
    pub planned_amount: Decimal,
    pub actual_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateEntry {
    pub employee_id: i64,
    pub employee_name: String,
    pub standard_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerEntry {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeMonthlySummary {
    pub employee_id: i64,
    pub employee_name: String,
    pub year_month: YearMonth,
    pub customer_code: String,
    pub customer_name: String,
    pub hours: Decimal,
    pub total_hours: Decimal,
    pub converted_rate: Decimal,
    pub apportioned_direct_cost: Decimal,
}

/// Which pair of figures the cutover rule selected for a project summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountBasis {
    Actual,
    Planned,
}

impl fmt::Display for AmountBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actual => f.write_str("actual"),
            Self::Planned => f.write_str("planned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMonthlySummary {
    pub department: String,
    pub year_month: YearMonth,
    pub customer_code: String,
    pub customer_name: String,
    pub contract_type: String,
    pub revenue_amount: Decimal,
    pub purchase_amount: Decimal,
    pub basis: AmountBasis,
}
