use rust_decimal::Decimal;
use std::str::FromStr;

use super::expense::within_limit;
use crate::error::BudgetError;

/// The income recorded for one household and one month.
#[derive(Debug, Clone)]
pub struct MonthlyBudget {
    pub id: Option<i64>,
    pub household_id: i64,
    /// Format: "YYYY-MM"
    pub month: String,
    pub income: Decimal,
    pub created_at: String,
    pub updated_at: String,
}

impl MonthlyBudget {
    pub fn new(household_id: i64, month: String, income: Decimal) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: None,
            household_id,
            month,
            income,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Parse a user-entered income. Zero is allowed, negatives and amounts
    /// above `MAX_AMOUNT` are not.
    pub fn parse_income(input: &str) -> Result<Decimal, BudgetError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        match Decimal::from_str(&cleaned) {
            Ok(income) if income >= Decimal::ZERO && within_limit(income) => Ok(income),
            _ => Err(BudgetError::InvalidIncome(input.trim().to_string())),
        }
    }
}
