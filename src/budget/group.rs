use rust_decimal::Decimal;

use crate::models::{BudgetPlan, Expense};

/// Expenses of one category, newest first, for list display.
#[derive(Debug, Clone)]
pub(crate) struct ExpenseGroup<'a> {
    pub(crate) category: String,
    pub(crate) label: String,
    pub(crate) expenses: Vec<&'a Expense>,
    pub(crate) total: Decimal,
}

/// Group expenses by category in plan order, skipping empty categories.
///
/// Expenses whose category the plan doesn't know are grouped after the
/// plan's own categories, labelled by their raw key.
pub(crate) fn group_by_category<'a>(expenses: &'a [Expense], plan: &BudgetPlan) -> Vec<ExpenseGroup<'a>> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

    let mut keys: Vec<String> = plan.categories.iter().map(|c| c.key.clone()).collect();
    for expense in &sorted {
        if !keys.contains(&expense.category) {
            keys.push(expense.category.clone());
        }
    }

    keys.into_iter()
        .filter_map(|key| {
            let items: Vec<&Expense> = sorted
                .iter()
                .copied()
                .filter(|e| e.category == key)
                .collect();
            if items.is_empty() {
                return None;
            }
            let total = items.iter().map(|e| e.amount).sum();
            Some(ExpenseGroup {
                label: plan.label_for(&key).to_string(),
                category: key,
                expenses: items,
                total,
            })
        })
        .collect()
}
