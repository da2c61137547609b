use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use crate::models::{BudgetPlan, Expense, DATE_FMT};

pub(crate) const HEADER: [&str; 4] = ["date", "category", "description", "amount"];

/// Date formats accepted on import besides ISO.
const FALLBACK_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y"];

/// A row that failed validation. `line` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RejectedRow {
    pub(crate) line: usize,
    pub(crate) reason: String,
}

#[derive(Debug, Default)]
pub(crate) struct ParsedImport {
    pub(crate) expenses: Vec<Expense>,
    pub(crate) rejected: Vec<RejectedRow>,
}

/// Write expenses as `date,category,description,amount` rows.
pub(crate) fn export_expenses(path: &Path, expenses: &[Expense]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record(HEADER)?;
    for e in expenses {
        wtr.write_record([
            e.date.as_str(),
            e.category.as_str(),
            e.description.as_str(),
            e.amount.to_string().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(expenses.len())
}

/// Read an expense CSV for `household_id`. Rows that don't validate are
/// reported in `rejected`, never returned as expenses.
pub(crate) fn parse_expenses(
    path: &Path,
    household_id: i64,
    created_by: Option<i64>,
    plan: &BudgetPlan,
) -> Result<ParsedImport> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .with_context(|| format!("CSV header is missing a '{name}' column"))
    };
    let [date_col, category_col, description_col, amount_col] = [
        column(HEADER[0])?,
        column(HEADER[1])?,
        column(HEADER[2])?,
        column(HEADER[3])?,
    ];

    let mut parsed = ParsedImport::default();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                parsed.rejected.push(RejectedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let field = |col: usize| record.get(col).unwrap_or("");
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row = parse_row(
            household_id,
            created_by,
            plan,
            field(date_col),
            field(category_col),
            field(description_col),
            field(amount_col),
        );
        match row {
            Ok(expense) => parsed.expenses.push(expense),
            Err(reason) => parsed.rejected.push(RejectedRow { line, reason }),
        }
    }
    Ok(parsed)
}

fn parse_row(
    household_id: i64,
    created_by: Option<i64>,
    plan: &BudgetPlan,
    date: &str,
    category: &str,
    description: &str,
    amount: &str,
) -> std::result::Result<Expense, String> {
    let category_key = category.trim().to_lowercase();
    if !plan.contains(&category_key) {
        return Err(format!("unknown category '{category}'"));
    }
    let amount = Expense::parse_amount(amount).map_err(|e| e.to_string())?;
    let date = normalize_date(date).ok_or_else(|| format!("invalid date '{date}'"))?;
    Expense::new(household_id, &category_key, description, amount, &date, created_by)
        .map_err(|e| e.to_string())
}

fn normalize_date(s: &str) -> Option<String> {
    std::iter::once(DATE_FMT)
        .chain(FALLBACK_DATE_FORMATS.iter().copied())
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
        .map(|d| d.format(DATE_FMT).to_string())
}

#[cfg(test)]
mod tests;
