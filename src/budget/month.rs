use chrono::{Months, NaiveDate};

use crate::error::BudgetError;

pub(crate) fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

pub(crate) fn today() -> String {
    chrono::Local::now().format(crate::models::DATE_FMT).to_string()
}

/// Normalize a month argument to "YYYY-MM".
///
/// Accepts "2024-01", "2024-1", or a bare "1"/"01" which is taken in the
/// year of `reference` (itself "YYYY-MM").
pub(crate) fn parse_month(input: &str, reference: &str) -> Result<String, BudgetError> {
    let input = input.trim();
    let candidate = if input.len() <= 2 {
        let year = reference.get(..4).unwrap_or("1970");
        format!("{year}-{input:0>2}")
    } else if let Some((year, month)) = input.split_once('-') {
        format!("{year}-{month:0>2}")
    } else {
        input.to_string()
    };

    NaiveDate::parse_from_str(&format!("{candidate}-01"), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| BudgetError::InvalidMonth(input.to_string()))
}

/// Move `month` ("YYYY-MM") forward or back by `delta` months.
///
/// Returns the input unchanged if it doesn't parse.
pub(crate) fn shift_month(month: &str, delta: i32) -> String {
    let Ok(date) = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d") else {
        return month.to_string();
    };
    let step = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        date.checked_add_months(step)
    } else {
        date.checked_sub_months(step)
    };
    shifted.map_or_else(|| month.to_string(), |d| d.format("%Y-%m").to_string())
}
