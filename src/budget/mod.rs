//! Fixed-ratio budget calculation.
//!
//! Everything here is a pure function of (income, expenses, month, plan):
//! no storage access, no clock reads, nothing cached. Callers recompute a
//! snapshot whenever income or the expense set changes.

mod format;
mod group;
mod month;
mod progress;

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{BudgetCategory, BudgetPlan, Expense};

pub(crate) use format::format_currency;
pub(crate) use group::{group_by_category, ExpenseGroup};
pub(crate) use month::{current_month, parse_month, shift_month, today};
pub(crate) use progress::{spending_percentage, ProgressTier};

/// Allocated vs spent for one category in one month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryBudget {
    pub(crate) category: String,
    pub(crate) label: String,
    pub(crate) percentage: u32,
    pub(crate) allocated: Decimal,
    pub(crate) spent: Decimal,
    /// `allocated - spent`; negative when over budget.
    pub(crate) remaining: Decimal,
}

impl CategoryBudget {
    pub(crate) fn spending_percentage(&self) -> Decimal {
        spending_percentage(self.spent, self.allocated)
    }

    pub(crate) fn tier(&self) -> ProgressTier {
        ProgressTier::from_percentage(self.spending_percentage())
    }

    pub(crate) fn is_over_budget(&self) -> bool {
        self.remaining < Decimal::ZERO
    }

    /// How far spending exceeds the allocation, zero when within budget.
    pub(crate) fn over_by(&self) -> Decimal {
        (-self.remaining).max(Decimal::ZERO)
    }
}

/// Totals across a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetSummary {
    pub(crate) allocated: Decimal,
    pub(crate) spent: Decimal,
    pub(crate) remaining: Decimal,
}

impl BudgetSummary {
    pub(crate) fn from_budgets(budgets: &[CategoryBudget]) -> Self {
        let allocated = saturating_sum(budgets.iter().map(|b| b.allocated));
        let spent = saturating_sum(budgets.iter().map(|b| b.spent));
        Self {
            allocated,
            spent,
            remaining: allocated.saturating_sub(spent),
        }
    }

    pub(crate) fn spending_percentage(&self) -> Decimal {
        spending_percentage(self.spent, self.allocated)
    }
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Split `income` across the plan's categories, in plan order.
///
/// Negative income is treated as zero. Dividing first keeps the product
/// in range for any income up to `Decimal::MAX`.
pub(crate) fn allocate(income: Decimal, plan: &BudgetPlan) -> Vec<(&BudgetCategory, Decimal)> {
    let hundredth = income.max(Decimal::ZERO) / Decimal::ONE_HUNDRED;
    plan.categories
        .iter()
        .map(|cat| (cat, hundredth.saturating_mul(Decimal::from(cat.percentage))))
        .collect()
}

/// Sum expense amounts per category key for expenses dated in `month`.
///
/// Matching is on the "YYYY-MM" prefix of the expense date.
pub(crate) fn totals_by_category<'a>(
    expenses: &'a [Expense],
    month: &str,
) -> HashMap<&'a str, Decimal> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();
    for expense in expenses.iter().filter(|e| e.is_in_month(month)) {
        let total = totals.entry(expense.category.as_str()).or_default();
        *total = total.saturating_add(expense.amount);
    }
    totals
}

/// Build the per-category snapshot for one month, in plan order.
pub(crate) fn calculate_category_budgets(
    income: Decimal,
    expenses: &[Expense],
    month: &str,
    plan: &BudgetPlan,
) -> Vec<CategoryBudget> {
    let totals = totals_by_category(expenses, month);
    allocate(income, plan)
        .into_iter()
        .map(|(cat, allocated)| {
            let spent = totals.get(cat.key.as_str()).copied().unwrap_or_default();
            CategoryBudget {
                category: cat.key.clone(),
                label: cat.label.clone(),
                percentage: cat.percentage,
                allocated,
                spent,
                remaining: allocated.saturating_sub(spent),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
