use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::models::{
    AmountBasis, Category, CostRecord, CustomerEntry, EmployeeMonthlySummary,
    ProjectMonthlySummary, RateEntry, WorkHourRecord, YearMonth,
};

/// Monthly hours above which the standard rate is scaled up.
pub const STANDARD_MONTHLY_HOURS: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

// ---------------------------------------------------------------------------
// Employee summaries
// ---------------------------------------------------------------------------

/// Tiered monthly rate. Above 150 hours the standard rate is scaled by
/// `total / 150`; at or below it the hour total itself is the rate.
pub fn converted_rate(standard_rate: Decimal, total_hours: Decimal) -> Decimal {
    if total_hours > STANDARD_MONTHLY_HOURS {
        standard_rate * total_hours / STANDARD_MONTHLY_HOURS
    } else {
        total_hours
    }
}

/// Share of the converted rate attributable to `hours` out of `total_hours`.
pub fn apportion(converted_rate: Decimal, hours: Decimal, total_hours: Decimal) -> Decimal {
    if total_hours.is_zero() {
        return Decimal::ZERO;
    }
    converted_rate * hours / total_hours
}

pub fn total_hours_by_employee(records: &[WorkHourRecord]) -> HashMap<i64, Decimal> {
    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for record in records {
        *totals.entry(record.employee_id).or_default() += record.hours;
    }
    totals
}

/// One summary row per work-hour record, in input order.
pub fn summarize_employees(
    records: &[WorkHourRecord],
    rates: &[RateEntry],
) -> Result<Vec<EmployeeMonthlySummary>> {
    let totals = total_hours_by_employee(records);
    let mut rate_by_id: HashMap<i64, Decimal> = HashMap::new();
    for rate in rates {
        rate_by_id.entry(rate.employee_id).or_insert(rate.standard_rate);
    }

    records
        .iter()
        .map(|record| {
            let total_hours = totals.get(&record.employee_id).copied().unwrap_or_default();
            let standard_rate = *rate_by_id.get(&record.employee_id).ok_or_else(|| {
                ReportError::MissingRate {
                    employee_id: record.employee_id,
                    employee_name: record.employee_name.clone(),
                }
            })?;
            let converted = converted_rate(standard_rate, total_hours);
            let summary = EmployeeMonthlySummary {
                employee_id: record.employee_id,
                employee_name: record.employee_name.clone(),
                year_month: record.year_month,
                customer_code: record.customer_code.clone(),
                customer_name: record.customer_name.clone(),
                hours: record.hours,
                total_hours,
                converted_rate: converted,
                apportioned_direct_cost: apportion(converted, record.hours, total_hours),
            };
            debug!(?summary, "employee summary");
            Ok(summary)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Project summaries
// ---------------------------------------------------------------------------

/// Last day on which a month's actual figures are still reported.
/// A handover day past the end of the month clamps to the month's last day.
pub fn cutover_date(year_month: YearMonth, handover_day: u32) -> Option<NaiveDate> {
    let last_day = (28..=31)
        .rev()
        .find(|d| NaiveDate::from_ymd_opt(year_month.year, year_month.month, *d).is_some())?;
    NaiveDate::from_ymd_opt(
        year_month.year,
        year_month.month,
        handover_day.clamp(1, last_day),
    )
}

/// Actual figures up to and including the cutover date, planned after it.
pub fn select_basis(year_month: YearMonth, handover_day: u32, today: NaiveDate) -> AmountBasis {
    match cutover_date(year_month, handover_day) {
        Some(cutover) if today <= cutover => AmountBasis::Actual,
        _ => AmountBasis::Planned,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct ProjectTotals {
    planned_revenue: Decimal,
    actual_revenue: Decimal,
    planned_purchase: Decimal,
    actual_purchase: Decimal,
}

/// (department, year-month, customer name, contract type)
type ProjectKey = (String, YearMonth, String, String);

fn group_projects(records: &[CostRecord]) -> BTreeMap<ProjectKey, ProjectTotals> {
    let mut groups: BTreeMap<ProjectKey, ProjectTotals> = BTreeMap::new();
    for record in records {
        if !matches!(record.category, Category::Sale | Category::Purchase) {
            continue;
        }
        let key = (
            record.department.clone(),
            record.year_month,
            record.customer_name.clone(),
            record.contract_type.clone(),
        );
        let totals = groups.entry(key).or_default();
        match record.category {
            Category::Sale => {
                totals.planned_revenue += record.planned_amount;
                totals.actual_revenue += record.actual_amount;
            }
            Category::Purchase => {
                totals.planned_purchase += record.planned_amount;
                totals.actual_purchase += record.actual_amount;
            }
            Category::Other(_) => {}
        }
    }
    groups
}

/// One summary per (department, year-month, customer, contract), sorted by
/// that key.
pub fn summarize_projects(
    records: &[CostRecord],
    customers: &[CustomerEntry],
    handover_day: u32,
    today: NaiveDate,
) -> Vec<ProjectMonthlySummary> {
    let mut code_by_name: HashMap<&str, &str> = HashMap::new();
    for customer in customers {
        code_by_name
            .entry(customer.name.as_str())
            .or_insert(customer.code.as_str());
    }

    group_projects(records)
        .into_iter()
        .map(|((department, year_month, customer_name, contract_type), totals)| {
            let basis = select_basis(year_month, handover_day, today);
            let (revenue_amount, purchase_amount) = match basis {
                AmountBasis::Actual => (totals.actual_revenue, totals.actual_purchase),
                AmountBasis::Planned => (totals.planned_revenue, totals.planned_purchase),
            };
            let summary = ProjectMonthlySummary {
                customer_code: code_by_name
                    .get(customer_name.as_str())
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
                department,
                year_month,
                customer_name,
                contract_type,
                revenue_amount,
                purchase_amount,
                basis,
            };
            debug!(?summary, "project summary");
            summary
        })
        .collect()
}
