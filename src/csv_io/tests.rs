#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::PlanPreset;
use rust_decimal_macros::dec;
use std::io::Write;

fn make_csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn classic() -> BudgetPlan {
    PlanPreset::Classic.plan()
}

// ── normalize_date ────────────────────────────────────────────

#[test]
fn test_normalize_date_formats() {
    assert_eq!(normalize_date("2024-01-15").as_deref(), Some("2024-01-15"));
    assert_eq!(normalize_date("01/15/2024").as_deref(), Some("2024-01-15"));
    assert_eq!(normalize_date("01-05-2024").as_deref(), Some("2024-01-05"));
    assert_eq!(normalize_date("2024-02-30"), None);
    assert_eq!(normalize_date("soon"), None);
}

// ── parse_expenses ────────────────────────────────────────────

#[test]
fn test_parse_valid_rows() {
    let file = make_csv_file(
        "date,category,description,amount\n\
         2024-01-01,needs,Rent,\"$1,200.00\"\n\
         2024-01-03,Wants,Dinner out,45.5\n",
    );
    let parsed = parse_expenses(file.path(), 7, Some(3), &classic()).unwrap();
    assert!(parsed.rejected.is_empty());
    assert_eq!(parsed.expenses.len(), 2);
    assert_eq!(parsed.expenses[0].amount, dec!(1200.00));
    assert_eq!(parsed.expenses[0].household_id, 7);
    assert_eq!(parsed.expenses[0].created_by, Some(3));
    assert_eq!(parsed.expenses[1].category, "wants");
}

#[test]
fn test_header_columns_in_any_order() {
    let file = make_csv_file("Amount,Description,Date,Category\n20,Coffee,2024-03-02,wants\n");
    let parsed = parse_expenses(file.path(), 1, None, &classic()).unwrap();
    assert_eq!(parsed.expenses.len(), 1);
    assert_eq!(parsed.expenses[0].description, "Coffee");
    assert_eq!(parsed.expenses[0].date, "2024-03-02");
}

#[test]
fn test_missing_header_column_is_an_error() {
    let file = make_csv_file("date,description,amount\n2024-01-01,Rent,100\n");
    let err = parse_expenses(file.path(), 1, None, &classic()).unwrap_err();
    assert!(err.to_string().contains("category"));
}

#[test]
fn test_bad_rows_rejected_not_imported() {
    let file = make_csv_file(
        "date,category,description,amount\n\
         2024-01-01,needs,Rent,1200\n\
         2024-01-02,vacation,Flights,300\n\
         2024-01-03,wants,Refund,-20\n\
         2024-01-04,wants,Free,0\n\
         2024-13-01,needs,Bad date,5\n\
         2024-01-05,needs,,5\n",
    );
    let parsed = parse_expenses(file.path(), 1, None, &classic()).unwrap();
    assert_eq!(parsed.expenses.len(), 1);
    let lines: Vec<usize> = parsed.rejected.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![3, 4, 5, 6, 7]);
    assert!(parsed.rejected[0].reason.contains("vacation"));
}

#[test]
fn test_category_checked_against_plan() {
    let file = make_csv_file("date,category,description,amount\n2024-01-01,person_a_spend,Books,30\n");
    let rejected = parse_expenses(file.path(), 1, None, &classic()).unwrap();
    assert_eq!(rejected.rejected.len(), 1);

    let accepted = parse_expenses(file.path(), 1, None, &PlanPreset::Couple.plan()).unwrap();
    assert_eq!(accepted.expenses.len(), 1);
}

#[test]
fn test_blank_lines_skipped() {
    let file = make_csv_file("date,category,description,amount\n,,,\n2024-01-01,needs,Rent,10\n");
    let parsed = parse_expenses(file.path(), 1, None, &classic()).unwrap();
    assert_eq!(parsed.expenses.len(), 1);
    assert!(parsed.rejected.is_empty());
}

// ── export_expenses ───────────────────────────────────────────

#[test]
fn test_export_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let expenses = vec![
        Expense::new(1, "needs", "Rent, January", dec!(1200), "2024-01-01", None).unwrap(),
        Expense::new(1, "savings", "IRA", dec!(250.75), "2024-01-02", None).unwrap(),
    ];
    assert_eq!(export_expenses(&path, &expenses).unwrap(), 2);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("date,category,description,amount\n"));
    assert!(text.contains("\"Rent, January\""));

    let parsed = parse_expenses(&path, 1, None, &classic()).unwrap();
    assert_eq!(parsed.expenses.len(), 2);
    assert_eq!(parsed.expenses[0].description, "Rent, January");
    assert_eq!(parsed.expenses[1].amount, dec!(250.75));
}
