#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::app::*;
use super::commands::handle_command;
use crate::db::Database;
use crate::models::{Expense, PlanPreset, Role};

const MONTH: &str = "2024-03";

fn setup() -> (Database, App) {
    let mut db = Database::open_in_memory().unwrap();
    let session = db.login("alex@example.com", Some("Alex")).unwrap();
    let user_id = session.user_id().unwrap();
    db.create_household(user_id, "Home", PlanPreset::Classic)
        .unwrap();
    let app = app_for(&db);
    (db, app)
}

fn app_for(db: &Database) -> App {
    let mut app = App::new(db.require_session().unwrap(), PlanPreset::Classic);
    app.refresh_all(db).unwrap();
    app.set_month(db, MONTH.to_string()).unwrap();
    app
}

fn spent_in(app: &App, category: &str) -> Decimal {
    app.budgets
        .iter()
        .find(|b| b.category == category)
        .map(|b| b.spent)
        .unwrap()
}

// ── IncomeEditor ──────────────────────────────────────────────

#[test]
fn test_editor_opens_when_income_missing() {
    assert!(IncomeEditor::for_income(Decimal::ZERO).is_editing());
    assert!(!IncomeEditor::for_income(dec!(4200)).is_editing());
}

#[test]
fn test_editor_begin_prefills_current_income() {
    let mut editor = IncomeEditor::for_income(dec!(4200));
    editor.begin(dec!(4200));
    assert!(editor.is_editing());
    assert_eq!(editor.input, "4200");
}

#[test]
fn test_editor_submit_collapses_to_display() {
    let mut editor = IncomeEditor::for_income(Decimal::ZERO);
    editor.input = "$5,250.50".into();
    assert_eq!(editor.submit().unwrap(), dec!(5250.50));
    assert_eq!(editor.mode, EditorMode::Display);
    assert!(editor.input.is_empty());
}

#[test]
fn test_editor_submit_rejects_garbage_and_keeps_input() {
    let mut editor = IncomeEditor::for_income(Decimal::ZERO);
    editor.input = "lots".into();
    assert!(editor.submit().is_err());
    assert!(editor.is_editing());
    assert_eq!(editor.input, "lots");
}

#[test]
fn test_editor_cancel_restores_display() {
    let mut editor = IncomeEditor::for_income(dec!(3000));
    editor.begin(dec!(3000));
    editor.input.push('9');
    editor.cancel(dec!(3000));
    assert_eq!(editor.mode, EditorMode::Display);
    assert!(editor.input.is_empty());
}

// ── App state ─────────────────────────────────────────────────

#[test]
fn test_refresh_all_loads_household_and_plan() {
    let (_db, app) = setup();
    assert_eq!(app.household_name(), "Home");
    assert_eq!(app.plan.keys(), vec!["needs", "wants", "savings"]);
    assert_eq!(app.budgets.len(), 3);
    assert_eq!(app.summary.allocated, Decimal::ZERO);
    assert!(app.income_editor.is_editing());
    assert_eq!(app.my_membership().unwrap().role, Role::Owner);
}

#[test]
fn test_poll_changes_picks_up_other_writers() {
    let (db, mut app) = setup();
    let household_id = app.household_id().unwrap();
    let expense = Expense::new(household_id, "wants", "Concert", dec!(60), "2024-03-09", None).unwrap();
    db.insert_expense(&expense).unwrap();

    assert!(app.poll_changes(&db).unwrap());
    assert_eq!(app.feed.expenses.len(), 1);
    assert_eq!(spent_in(&app, "wants"), dec!(60));
    assert!(!app.poll_changes(&db).unwrap());
}

#[test]
fn test_refresh_budget_keeps_open_editor() {
    let (db, mut app) = setup();
    app.input_mode = InputMode::Editing;
    app.income_editor.input = "12".into();
    app.refresh_budget(&db).unwrap();
    assert_eq!(app.income_editor.input, "12");
}

#[test]
fn test_visible_expenses_follow_plan_then_date() {
    let (db, mut app) = setup();
    let household_id = app.household_id().unwrap();
    for (category, description, date) in [
        ("wants", "Dinner out", "2024-03-20"),
        ("needs", "Rent", "2024-03-01"),
        ("needs", "Groceries", "2024-03-15"),
    ] {
        let e = Expense::new(household_id, category, description, dec!(10), date, None).unwrap();
        db.insert_expense(&e).unwrap();
    }
    app.refresh_expenses(&db).unwrap();

    let order: Vec<&str> = app
        .visible_expenses()
        .iter()
        .map(|e| e.description.as_str())
        .collect();
    assert_eq!(order, vec!["Groceries", "Rent", "Dinner out"]);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn test_unknown_command_suggests_closest() {
    let (mut db, mut app) = setup();
    handle_command("incom 100", &mut app, &mut db).unwrap();
    assert!(app.status_message.contains("Did you mean :income?"));
}

#[test]
fn test_income_command_allocates() {
    let (mut db, mut app) = setup();
    handle_command("income 4,000", &mut app, &mut db).unwrap();

    assert_eq!(app.income, dec!(4000));
    assert_eq!(app.summary.allocated, dec!(4000));
    assert_eq!(app.budgets[0].allocated, dec!(2000));
    assert!(!app.income_editor.is_editing());
    assert_eq!(
        db.get_income(app.household_id().unwrap(), MONTH).unwrap(),
        dec!(4000)
    );
}

#[test]
fn test_income_command_without_amount_opens_editor() {
    let (mut db, mut app) = setup();
    app.screen = Screen::Expenses;
    handle_command("income", &mut app, &mut db).unwrap();
    assert_eq!(app.screen, Screen::Dashboard);
    assert_eq!(app.input_mode, InputMode::Editing);
}

#[test]
fn test_income_command_rejects_negative() {
    let (mut db, mut app) = setup();
    handle_command("income -50", &mut app, &mut db).unwrap();
    assert_eq!(app.income, Decimal::ZERO);
    assert!(!app.status_message.is_empty());
}

#[test]
fn test_add_command_updates_feed_and_snapshot() {
    let (mut db, mut app) = setup();
    handle_command("income 1000", &mut app, &mut db).unwrap();
    handle_command("add needs 82.15 Weekly groceries --date 2024-03-14", &mut app, &mut db)
        .unwrap();

    assert_eq!(app.feed.expenses.len(), 1);
    assert_eq!(app.feed.expenses[0].description, "Weekly groceries");
    assert_eq!(spent_in(&app, "needs"), dec!(82.15));
    assert_eq!(app.summary.remaining, dec!(917.85));
    assert!(app.status_message.starts_with("Added Weekly groceries"));
}

#[test]
fn test_add_command_outside_month_is_stored_not_shown() {
    let (mut db, mut app) = setup();
    handle_command("add wants 20 Movie --date 2024-04-02", &mut app, &mut db).unwrap();
    assert!(app.feed.expenses.is_empty());
    assert!(app.status_message.contains("outside 2024-03"));
    assert_eq!(db.get_expense_count(app.household_id().unwrap()).unwrap(), 1);
}

#[test]
fn test_add_command_unknown_category() {
    let (mut db, mut app) = setup();
    handle_command("add vacation 500 Flights --date 2024-03-02", &mut app, &mut db).unwrap();
    assert!(app.feed.expenses.is_empty());
    assert!(!app.status_message.is_empty());
}

#[test]
fn test_delete_command_asks_for_confirmation() {
    let (mut db, mut app) = setup();
    handle_command("add needs 40 Gas bill --date 2024-03-05", &mut app, &mut db).unwrap();
    app.screen = Screen::Expenses;
    handle_command("delete", &mut app, &mut db).unwrap();

    assert_eq!(app.input_mode, InputMode::Confirm);
    assert!(matches!(
        app.pending_action,
        Some(PendingAction::DeleteExpense { ref description, .. }) if description == "Gas bill"
    ));
    assert!(app.confirm_message.contains("Gas bill"));
}

#[test]
fn test_delete_command_needs_expenses_screen() {
    let (mut db, mut app) = setup();
    handle_command("delete", &mut app, &mut db).unwrap();
    assert_eq!(app.input_mode, InputMode::Normal);
    assert!(app.pending_action.is_none());
}

#[test]
fn test_month_command() {
    let (mut db, mut app) = setup();
    handle_command("month 2023-12", &mut app, &mut db).unwrap();
    assert_eq!(app.current_month, "2023-12");
    handle_command("next-month", &mut app, &mut db).unwrap();
    assert_eq!(app.current_month, "2024-01");
    handle_command("month banana", &mut app, &mut db).unwrap();
    assert_eq!(app.current_month, "2024-01");
}

#[test]
fn test_plan_command_switches_preset() {
    let (mut db, mut app) = setup();
    handle_command("plan couple", &mut app, &mut db).unwrap();
    assert_eq!(app.plan.categories.len(), 4);
    assert_eq!(app.budgets.len(), 4);
    handle_command("plan nonsense", &mut app, &mut db).unwrap();
    assert_eq!(app.plan.categories.len(), 4);
}

#[test]
fn test_plan_switch_warns_about_uncounted_expenses() {
    let (mut db, mut app) = setup();
    let household_id = app.household_id().unwrap();
    let fun = Expense::new(household_id, "wants", "Movies", dec!(25), "2024-03-02", None).unwrap();
    db.insert_expense(&fun).unwrap();

    handle_command("plan couple", &mut app, &mut db).unwrap();
    assert!(app.status_message.contains("1 expense(s) in other categories"));
    assert!(app.budgets.iter().all(|b| b.spent.is_zero()));

    handle_command("plan classic", &mut app, &mut db).unwrap();
    assert_eq!(app.status_message, "Switched to the classic plan");
}

#[test]
fn test_member_cannot_change_plan() {
    let (mut db, app) = setup();
    let code = app.session.household.as_ref().unwrap().invite_code.clone();
    let sam = db.login("sam@example.com", Some("Sam")).unwrap();
    db.join_household(sam.user_id().unwrap(), &code).unwrap();

    let mut sam_app = app_for(&db);
    handle_command("plan couple", &mut sam_app, &mut db).unwrap();
    assert_eq!(sam_app.status_message, "Only owners and admins can do that");
    assert_eq!(sam_app.plan.categories.len(), 3);

    handle_command("label wants Fun money", &mut sam_app, &mut db).unwrap();
    assert_eq!(sam_app.status_message, "Only owners and admins can do that");
    assert_eq!(sam_app.plan.label_for("wants"), "Wants");
}

#[test]
fn test_label_command_renames_category() {
    let (mut db, mut app) = setup();
    handle_command("label wants Fun money", &mut app, &mut db).unwrap();
    assert_eq!(app.plan.label_for("wants"), "Fun money");
    assert_eq!(app.budgets[1].label, "Fun money");
}

#[test]
fn test_create_command_selects_new_household() {
    let (mut db, mut app) = setup();
    handle_command("create Beach House", &mut app, &mut db).unwrap();
    assert_eq!(app.household_name(), "Beach House");
    assert_eq!(app.households.len(), 2);
    assert_eq!(app.screen, Screen::Household);
    assert!(app.status_message.contains("Invite code"));
}

#[test]
fn test_member_cannot_remove_owner() {
    let (mut db, app) = setup();
    let code = app.session.household.as_ref().unwrap().invite_code.clone();
    let sam = db.login("sam@example.com", Some("Sam")).unwrap();
    db.join_household(sam.user_id().unwrap(), &code).unwrap();

    let mut sam_app = app_for(&db);
    sam_app.screen = Screen::Household;
    sam_app.member_index = sam_app
        .members
        .iter()
        .position(|m| m.role == Role::Owner)
        .unwrap();
    handle_command("remove", &mut sam_app, &mut db).unwrap();

    assert!(sam_app.pending_action.is_none());
    assert_eq!(sam_app.status_message, "Only owners and admins can remove members");
}

#[test]
fn test_owner_remove_asks_for_confirmation() {
    let (mut db, mut app) = setup();
    let code = app.session.household.as_ref().unwrap().invite_code.clone();
    let alex_email = app.session.user.email.clone();
    let sam = db.login("sam@example.com", Some("Sam")).unwrap();
    db.join_household(sam.user_id().unwrap(), &code).unwrap();
    db.login(&alex_email, None).unwrap();

    app.refresh_all(&db).unwrap();
    app.screen = Screen::Household;
    app.member_index = app
        .members
        .iter()
        .position(|m| m.email == "sam@example.com")
        .unwrap();
    handle_command("remove", &mut app, &mut db).unwrap();

    assert_eq!(app.input_mode, InputMode::Confirm);
    assert!(matches!(
        app.pending_action,
        Some(PendingAction::RemoveMember { ref name, .. }) if name == "Sam"
    ));
}

#[test]
fn test_commands_without_household() {
    let (mut db, _) = setup();
    db.login("loner@example.com", None).unwrap();
    let mut app = App::new(db.require_session().unwrap(), PlanPreset::Classic);
    app.refresh_all(&db).unwrap();

    assert!(app.household_id().is_none());
    handle_command("add needs 5 Coffee", &mut app, &mut db).unwrap();
    assert!(app.status_message.starts_with("No household"));
    assert!(!app.poll_changes(&db).unwrap());
}

#[test]
fn test_quit_command() {
    let (mut db, mut app) = setup();
    handle_command("q", &mut app, &mut db).unwrap();
    assert!(!app.running);
}
