#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::models::{BudgetCategory, PlanPreset};

fn expense(id: i64, category: &str, amount: Decimal, date: &str) -> Expense {
    Expense {
        id: Some(id),
        household_id: 1,
        category: category.into(),
        description: format!("Expense {id}"),
        amount,
        date: date.into(),
        created_by: None,
        created_at: String::new(),
    }
}

fn by_key<'a>(budgets: &'a [CategoryBudget], key: &str) -> &'a CategoryBudget {
    budgets.iter().find(|b| b.category == key).unwrap()
}

// ── Allocation ────────────────────────────────────────────────

#[test]
fn test_allocate_classic_split() {
    let plan = PlanPreset::Classic.plan();
    let alloc = allocate(dec!(3000), &plan);
    let amounts: Vec<Decimal> = alloc.iter().map(|(_, a)| *a).collect();
    assert_eq!(amounts, vec![dec!(1500), dec!(900), dec!(600)]);
}

#[test]
fn test_allocate_couple_split() {
    let plan = PlanPreset::Couple.plan();
    let alloc = allocate(dec!(5000), &plan);
    let amounts: Vec<Decimal> = alloc.iter().map(|(_, a)| *a).collect();
    assert_eq!(amounts, vec![dec!(2500), dec!(500), dec!(500), dec!(1500)]);
}

#[test]
fn test_allocations_sum_to_income() {
    for preset in PlanPreset::all() {
        let plan = preset.plan();
        for income in [dec!(0), dec!(0.01), dec!(1234.57), dec!(3333.33), dec!(98765.43)] {
            let total: Decimal = allocate(income, &plan).iter().map(|(_, a)| *a).sum();
            assert_eq!(total, income, "{preset} plan with income {income}");
        }
    }
}

#[test]
fn test_allocate_zero_income() {
    let plan = PlanPreset::Couple.plan();
    assert!(allocate(Decimal::ZERO, &plan)
        .iter()
        .all(|(_, a)| *a == Decimal::ZERO));
}

#[test]
fn test_allocate_negative_income_is_zero() {
    let plan = PlanPreset::Classic.plan();
    assert!(allocate(dec!(-100), &plan)
        .iter()
        .all(|(_, a)| *a == Decimal::ZERO));
}

#[test]
fn test_allocate_huge_income_does_not_overflow() {
    let plan = PlanPreset::Classic.plan();
    let alloc = allocate(Decimal::MAX, &plan);
    assert_eq!(alloc.len(), 3);
    assert!(alloc.iter().all(|(_, a)| *a > Decimal::ZERO && *a < Decimal::MAX));

    let budgets = calculate_category_budgets(Decimal::MAX, &[], "2024-01", &plan);
    let summary = BudgetSummary::from_budgets(&budgets);
    assert_eq!(summary.spent, Decimal::ZERO);
    assert!(summary.remaining > Decimal::ZERO);
}

#[test]
fn test_allocate_custom_plan() {
    let plan = crate::models::BudgetPlan::new(vec![
        BudgetCategory::new("rent", "Rent", 70),
        BudgetCategory::new("fun", "Fun", 30),
    ])
    .unwrap();
    let alloc = allocate(dec!(1000), &plan);
    assert_eq!(alloc[0].0.key, "rent");
    assert_eq!(alloc[0].1, dec!(700));
    assert_eq!(alloc[1].1, dec!(300));
}

// ── Aggregation ───────────────────────────────────────────────

#[test]
fn test_totals_only_count_target_month() {
    let expenses = vec![
        expense(1, "needs", dec!(100), "2024-03-01"),
        expense(2, "needs", dec!(50), "2024-03-31"),
        expense(3, "needs", dec!(999), "2024-02-29"),
        expense(4, "needs", dec!(999), "2024-04-01"),
        expense(5, "wants", dec!(20), "2024-03-15"),
    ];
    let totals = totals_by_category(&expenses, "2024-03");
    assert_eq!(totals.get("needs"), Some(&dec!(150)));
    assert_eq!(totals.get("wants"), Some(&dec!(20)));
    assert_eq!(totals.get("savings"), None);
}

#[test]
fn test_totals_same_month_other_year_excluded() {
    let expenses = vec![
        expense(1, "needs", dec!(10), "2023-03-10"),
        expense(2, "needs", dec!(5), "2024-03-10"),
    ];
    let totals = totals_by_category(&expenses, "2024-03");
    assert_eq!(totals.get("needs"), Some(&dec!(5)));
}

#[test]
fn test_totals_short_month_has_no_day_31_bound() {
    // February has no 31st; a March 1st expense must not leak into February.
    let expenses = vec![
        expense(1, "needs", dec!(10), "2023-02-28"),
        expense(2, "needs", dec!(7), "2023-03-01"),
    ];
    let totals = totals_by_category(&expenses, "2023-02");
    assert_eq!(totals.get("needs"), Some(&dec!(10)));
}

#[test]
fn test_totals_saturate_on_huge_expenses() {
    let expenses = vec![
        expense(1, "needs", Decimal::MAX, "2024-01-01"),
        expense(2, "needs", Decimal::MAX, "2024-01-02"),
    ];
    let totals = totals_by_category(&expenses, "2024-01");
    assert_eq!(totals["needs"], Decimal::MAX);

    let plan = PlanPreset::Classic.plan();
    let budgets = calculate_category_budgets(Decimal::MAX, &expenses, "2024-01", &plan);
    let needs = by_key(&budgets, "needs");
    assert!(needs.is_over_budget());
    assert_eq!(needs.spending_percentage(), dec!(100));
    let summary = BudgetSummary::from_budgets(&budgets);
    assert_eq!(summary.spent, Decimal::MAX);
    assert!(summary.remaining <= Decimal::ZERO);
}

#[test]
fn test_totals_empty_input() {
    let totals = totals_by_category(&[], "2024-01");
    assert!(totals.is_empty());
}

// ── Snapshot ──────────────────────────────────────────────────

#[test]
fn test_snapshot_couple_example() {
    let plan = PlanPreset::Couple.plan();
    let expenses = vec![
        expense(1, "needs", dec!(1200), "2024-05-03"),
        expense(2, "person_a_spend", dec!(600), "2024-05-10"),
        expense(3, "savings", dec!(100), "2024-05-20"),
    ];
    let budgets = calculate_category_budgets(dec!(5000), &expenses, "2024-05", &plan);

    let spent: Vec<Decimal> = budgets.iter().map(|b| b.spent).collect();
    let remaining: Vec<Decimal> = budgets.iter().map(|b| b.remaining).collect();
    assert_eq!(spent, vec![dec!(1200), dec!(600), dec!(0), dec!(100)]);
    assert_eq!(remaining, vec![dec!(1300), dec!(-100), dec!(500), dec!(1400)]);

    let person_a = by_key(&budgets, "person_a_spend");
    assert!(person_a.is_over_budget());
    assert_eq!(person_a.over_by(), dec!(100));
    assert!(!by_key(&budgets, "needs").is_over_budget());
    assert_eq!(by_key(&budgets, "needs").over_by(), Decimal::ZERO);
}

#[test]
fn test_snapshot_classic_no_expenses() {
    let plan = PlanPreset::Classic.plan();
    let budgets = calculate_category_budgets(dec!(3000), &[], "2024-01", &plan);
    assert_eq!(budgets.len(), 3);
    for b in &budgets {
        assert_eq!(b.spent, Decimal::ZERO);
        assert_eq!(b.remaining, b.allocated);
    }
    assert_eq!(by_key(&budgets, "needs").allocated, dec!(1500));
    assert_eq!(by_key(&budgets, "wants").allocated, dec!(900));
    assert_eq!(by_key(&budgets, "savings").allocated, dec!(600));
}

#[test]
fn test_snapshot_follows_plan_order() {
    let plan = PlanPreset::Couple.plan();
    let expenses = vec![
        expense(1, "savings", dec!(1), "2024-01-01"),
        expense(2, "person_b_spend", dec!(1), "2024-01-01"),
    ];
    let budgets = calculate_category_budgets(dec!(100), &expenses, "2024-01", &plan);
    let keys: Vec<&str> = budgets.iter().map(|b| b.category.as_str()).collect();
    assert_eq!(keys, plan.keys());
}

#[test]
fn test_snapshot_carries_labels_and_percentages() {
    let mut plan = PlanPreset::Couple.plan();
    plan.relabel("person_a_spend", "Ryan Spend").unwrap();
    let budgets = calculate_category_budgets(dec!(100), &[], "2024-01", &plan);
    let a = by_key(&budgets, "person_a_spend");
    assert_eq!(a.label, "Ryan Spend");
    assert_eq!(a.percentage, 10);
}

#[test]
fn test_snapshot_ignores_other_months_even_when_latest() {
    let plan = PlanPreset::Classic.plan();
    let expenses = vec![
        expense(1, "wants", dec!(30), "2024-06-10"),
        expense(99, "wants", dec!(500), "2024-07-01"),
    ];
    let budgets = calculate_category_budgets(dec!(1000), &expenses, "2024-06", &plan);
    assert_eq!(by_key(&budgets, "wants").spent, dec!(30));
}

#[test]
fn test_snapshot_ignores_unknown_categories() {
    let plan = PlanPreset::Classic.plan();
    let expenses = vec![expense(1, "person_a_spend", dec!(40), "2024-01-02")];
    let budgets = calculate_category_budgets(dec!(1000), &expenses, "2024-01", &plan);
    assert!(budgets.iter().all(|b| b.spent == Decimal::ZERO));
}

#[test]
fn test_remaining_is_allocated_minus_spent() {
    let plan = PlanPreset::Classic.plan();
    let expenses = vec![
        expense(1, "needs", dec!(2000.10), "2024-01-02"),
        expense(2, "wants", dec!(12.34), "2024-01-03"),
        expense(3, "savings", dec!(600), "2024-01-04"),
    ];
    let budgets = calculate_category_budgets(dec!(3000), &expenses, "2024-01", &plan);
    for b in &budgets {
        assert_eq!(b.remaining, b.allocated - b.spent);
    }
    assert_eq!(by_key(&budgets, "needs").remaining, dec!(-500.10));
    assert_eq!(by_key(&budgets, "savings").remaining, Decimal::ZERO);
}

#[test]
fn test_summary_totals() {
    let plan = PlanPreset::Couple.plan();
    let expenses = vec![
        expense(1, "needs", dec!(1200), "2024-05-03"),
        expense(2, "person_a_spend", dec!(600), "2024-05-10"),
    ];
    let budgets = calculate_category_budgets(dec!(5000), &expenses, "2024-05", &plan);
    let summary = BudgetSummary::from_budgets(&budgets);
    assert_eq!(summary.allocated, dec!(5000));
    assert_eq!(summary.spent, dec!(1800));
    assert_eq!(summary.remaining, dec!(3200));
    assert_eq!(summary.spending_percentage(), dec!(36));
}

// ── Spending percentage & tiers ───────────────────────────────

#[test]
fn test_spending_percentage_basic() {
    assert_eq!(spending_percentage(dec!(50), dec!(200)), dec!(25));
    assert_eq!(spending_percentage(Decimal::ZERO, dec!(200)), Decimal::ZERO);
}

#[test]
fn test_spending_percentage_clamped_when_over() {
    assert_eq!(spending_percentage(dec!(600), dec!(500)), dec!(100));
    assert_eq!(spending_percentage(dec!(1000000), dec!(0.01)), dec!(100));
}

#[test]
fn test_spending_percentage_zero_allocation() {
    assert_eq!(spending_percentage(dec!(600), Decimal::ZERO), Decimal::ZERO);
    assert_eq!(spending_percentage(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
}

#[test]
fn test_spending_percentage_always_in_range() {
    for (spent, allocated) in [
        (dec!(0), dec!(1)),
        (dec!(1), dec!(3)),
        (dec!(2.5), dec!(2.5)),
        (dec!(99999), dec!(1)),
        (dec!(5), dec!(0)),
    ] {
        let pct = spending_percentage(spent, allocated);
        assert!(pct >= Decimal::ZERO && pct <= dec!(100), "{spent}/{allocated} gave {pct}");
    }
}

#[test]
fn test_progress_tiers() {
    assert_eq!(ProgressTier::from_percentage(dec!(0)), ProgressTier::OnTrack);
    assert_eq!(ProgressTier::from_percentage(dec!(74.99)), ProgressTier::OnTrack);
    assert_eq!(ProgressTier::from_percentage(dec!(75)), ProgressTier::Warning);
    assert_eq!(ProgressTier::from_percentage(dec!(89.99)), ProgressTier::Warning);
    assert_eq!(ProgressTier::from_percentage(dec!(90)), ProgressTier::Critical);
    assert_eq!(ProgressTier::from_percentage(dec!(100)), ProgressTier::Critical);
}

#[test]
fn test_category_tier_from_snapshot() {
    let plan = PlanPreset::Classic.plan();
    let expenses = vec![expense(1, "wants", dec!(810), "2024-01-02")];
    let budgets = calculate_category_budgets(dec!(3000), &expenses, "2024-01", &plan);
    assert_eq!(by_key(&budgets, "wants").tier(), ProgressTier::Critical);
    assert_eq!(by_key(&budgets, "needs").tier(), ProgressTier::OnTrack);
}

// ── format_currency ───────────────────────────────────────────

#[test]
fn test_format_currency() {
    assert_eq!(format_currency(dec!(0)), "$0.00");
    assert_eq!(format_currency(dec!(5)), "$5.00");
    assert_eq!(format_currency(dec!(1234.5)), "$1,234.50");
    assert_eq!(format_currency(dec!(1234567.89)), "$1,234,567.89");
    assert_eq!(format_currency(dec!(999.99)), "$999.99");
    assert_eq!(format_currency(dec!(1000)), "$1,000.00");
}

#[test]
fn test_format_currency_negative() {
    assert_eq!(format_currency(dec!(-100)), "-$100.00");
    assert_eq!(format_currency(dec!(-1234.56)), "-$1,234.56");
}

// ── Months ────────────────────────────────────────────────────

#[test]
fn test_parse_month_forms() {
    assert_eq!(parse_month("2024-01", "2023-05").unwrap(), "2024-01");
    assert_eq!(parse_month("2024-1", "2023-05").unwrap(), "2024-01");
    assert_eq!(parse_month("3", "2023-05").unwrap(), "2023-03");
    assert_eq!(parse_month("12", "2023-05").unwrap(), "2023-12");
}

#[test]
fn test_parse_month_rejects_garbage() {
    assert!(parse_month("2024-13", "2024-01").is_err());
    assert!(parse_month("january", "2024-01").is_err());
    assert!(parse_month("", "2024-01").is_err());
}

#[test]
fn test_shift_month() {
    assert_eq!(shift_month("2024-01", 1), "2024-02");
    assert_eq!(shift_month("2024-12", 1), "2025-01");
    assert_eq!(shift_month("2024-01", -1), "2023-12");
    assert_eq!(shift_month("2024-03", -14), "2023-01");
    assert_eq!(shift_month("bogus", 1), "bogus");
}

#[test]
fn test_current_month_shape() {
    let m = current_month();
    assert_eq!(m.len(), 7);
    assert_eq!(&m[4..5], "-");
    assert!(today().starts_with(&m));
}

// ── Grouping ──────────────────────────────────────────────────

#[test]
fn test_group_by_category_plan_order_newest_first() {
    let plan = PlanPreset::Classic.plan();
    let expenses = vec![
        expense(1, "savings", dec!(100), "2024-01-05"),
        expense(2, "needs", dec!(10), "2024-01-02"),
        expense(3, "needs", dec!(20), "2024-01-09"),
    ];
    let groups = group_by_category(&expenses, &plan);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].category, "needs");
    assert_eq!(groups[0].label, "Needs");
    assert_eq!(groups[0].total, dec!(30));
    assert_eq!(groups[0].expenses[0].id, Some(3));
    assert_eq!(groups[0].expenses[1].id, Some(2));
    assert_eq!(groups[1].category, "savings");
}

#[test]
fn test_group_unknown_category_goes_last() {
    let plan = PlanPreset::Classic.plan();
    let expenses = vec![
        expense(1, "legacy", dec!(5), "2024-01-05"),
        expense(2, "wants", dec!(10), "2024-01-02"),
    ];
    let groups = group_by_category(&expenses, &plan);
    assert_eq!(groups[0].category, "wants");
    assert_eq!(groups[1].category, "legacy");
    assert_eq!(groups[1].label, "legacy");
}

#[test]
fn test_group_empty() {
    let plan = PlanPreset::Classic.plan();
    assert!(group_by_category(&[], &plan).is_empty());
}
