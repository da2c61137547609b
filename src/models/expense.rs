use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::BudgetError;

pub const DATE_FMT: &str = "%Y-%m-%d";

/// Largest amount or income accepted from the user, in whole dollars.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// True when `amount` is within `0..=MAX_AMOUNT`.
pub(crate) fn within_limit(amount: Decimal) -> bool {
    amount <= Decimal::from(MAX_AMOUNT)
}

/// A dated spend against one budget category.
///
/// Expenses are never edited once stored; they are only deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Option<i64>,
    pub household_id: i64,
    /// Key of a `BudgetCategory` in the household's plan.
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    /// Format: "YYYY-MM-DD"
    pub date: String,
    pub created_by: Option<i64>,
    pub created_at: String,
}

impl Expense {
    pub fn new(
        household_id: i64,
        category: &str,
        description: &str,
        amount: Decimal,
        date: &str,
        created_by: Option<i64>,
    ) -> Result<Self, BudgetError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(BudgetError::EmptyDescription);
        }
        if amount <= Decimal::ZERO || !within_limit(amount) {
            return Err(BudgetError::InvalidAmount(amount.to_string()));
        }
        let date = Self::parse_date(date)?;
        Ok(Self {
            id: None,
            household_id,
            category: category.trim().to_lowercase(),
            description: description.to_string(),
            amount,
            date: date.format(DATE_FMT).to_string(),
            created_by,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Parse a user-entered amount; strips a leading `$` and thousands separators.
    pub fn parse_amount(input: &str) -> Result<Decimal, BudgetError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        match Decimal::from_str(&cleaned) {
            Ok(amount) if amount > Decimal::ZERO && within_limit(amount) => Ok(amount),
            _ => Err(BudgetError::InvalidAmount(input.trim().to_string())),
        }
    }

    pub fn parse_date(input: &str) -> Result<NaiveDate, BudgetError> {
        NaiveDate::parse_from_str(input.trim(), DATE_FMT)
            .map_err(|_| BudgetError::InvalidDate(input.trim().to_string()))
    }

    /// True when the expense's date lies in `month` ("YYYY-MM").
    pub fn is_in_month(&self, month: &str) -> bool {
        self.date.get(..7) == Some(month)
    }
}
