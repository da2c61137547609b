use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::warn;

use super::app::{App, InputMode, PendingAction, Screen};
use crate::budget::{format_currency, parse_month};
use crate::db::Database;
use crate::models::{MonthlyBudget, PlanPreset, Role};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit HouseBudget", cmd_quit, r);
    register_command!("quit", "Quit HouseBudget", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("e", "Go to Expenses", cmd_expenses, r);
    register_command!("expenses", "Go to Expenses", cmd_expenses, r);
    register_command!("household", "Go to Household", cmd_household, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("month", "Set month (e.g. :month 2024-01)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2024-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "income",
        "Set this month's income (e.g. :income 5000)",
        cmd_income,
        r
    );
    register_command!(
        "add",
        "Add expense (e.g. :add needs 82.15 Groceries --date 2024-01-14)",
        cmd_add,
        r
    );
    register_command!(
        "a",
        "Add expense (e.g. :a wants 12 Movie)",
        cmd_add,
        r
    );
    register_command!("delete", "Delete selected expense", cmd_delete, r);
    register_command!(
        "plan",
        "Show or switch the category plan (e.g. :plan couple)",
        cmd_plan,
        r
    );
    register_command!(
        "label",
        "Rename a category (e.g. :label person_a_spend Ryan Spend)",
        cmd_label,
        r
    );
    register_command!(
        "create",
        "Create a household (e.g. :create Beach House)",
        cmd_create,
        r
    );
    register_command!(
        "join",
        "Join a household by invite code (e.g. :join K7M2QX)",
        cmd_join,
        r
    );
    register_command!(
        "switch",
        "Switch household (e.g. :switch Home)",
        cmd_switch,
        r
    );
    register_command!(
        "remove",
        "Remove selected member from the household",
        cmd_remove,
        r
    );
    register_command!(
        "role",
        "Set selected member's role (e.g. :role admin)",
        cmd_role,
        r
    );
    register_command!(
        "login",
        "Switch user (e.g. :login sam@example.com Sam)",
        cmd_login,
        r
    );
    register_command!(
        "export",
        "Export this month's expenses to CSV (e.g. :export ~/jan.csv)",
        cmd_export,
        r
    );
    register_command!(
        "import",
        "Import expenses from CSV (e.g. :import ~/jan.csv)",
        cmd_import,
        r
    );
    register_command!("refresh", "Reload everything from disk", cmd_refresh, r);

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, db)?;
    } else {
        // Try fuzzy match
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Household id for commands that need one; sets the status otherwise.
fn require_household(app: &mut App) -> Option<i64> {
    let id = app.household_id();
    if id.is_none() {
        app.set_status("No household. Use :create <name> or :join <code>");
    }
    id
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh_budget(db)?;
    Ok(())
}

fn cmd_expenses(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Expenses;
    app.refresh_expenses(db)?;
    Ok(())
}

fn cmd_household(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Household;
    app.refresh_household(db)?;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_refresh(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.refresh_all(db)?;
    app.set_status("Reloaded");
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        let month = crate::budget::current_month();
        app.set_month(db, month)?;
        app.set_status(format!("Switched to month: {}", app.current_month));
        return Ok(());
    }

    match parse_month(args, &app.current_month) {
        Ok(m) => {
            app.set_month(db, m)?;
            app.set_status(format!("Switched to month: {}", app.current_month));
        }
        Err(e) => app.set_status(e.to_string()),
    }

    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.shift_month(db, 1)
}

fn cmd_prev_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.shift_month(db, -1)
}

fn cmd_income(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(household_id) = require_household(app) else {
        return Ok(());
    };
    if args.is_empty() {
        app.screen = Screen::Dashboard;
        app.income_editor.begin(app.income);
        app.input_mode = InputMode::Editing;
        return Ok(());
    }

    let income = match MonthlyBudget::parse_income(args) {
        Ok(i) => i,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    db.set_income(household_id, &app.current_month, income)?;
    app.refresh_budget(db)?;
    app.set_status(format!(
        "Income for {} set to {}",
        app.current_month,
        format_currency(income)
    ));
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(household_id) = require_household(app) else {
        return Ok(());
    };
    if args.is_empty() {
        app.set_status(format!(
            "Usage: :add <category> <amount> <description> [--date YYYY-MM-DD]. Categories: {}",
            app.plan.keys().join(", ")
        ));
        return Ok(());
    }

    let tokens: Vec<&str> = args.split_whitespace().collect();
    let expense = match crate::run::parse_add_args(&tokens, household_id, app.session.user.id) {
        Ok(e) => e,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    if !app.plan.contains(&expense.category) {
        app.set_status(format!(
            "Unknown category '{}'. Categories: {}",
            expense.category,
            app.plan.keys().join(", ")
        ));
        return Ok(());
    }

    db.insert_expense(&expense)?;
    let label = app.plan.label_for(&expense.category).to_string();
    if !expense.is_in_month(&app.current_month) {
        app.set_status(format!(
            "Added {} to {label} on {} (outside {})",
            format_currency(expense.amount),
            expense.date,
            app.current_month
        ));
    } else {
        app.set_status(format!(
            "Added {}: {} to {label}",
            expense.description,
            format_currency(expense.amount)
        ));
    }
    // The feed picks the new row up from the change log.
    app.poll_changes(db)?;
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Expenses {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    }

    let Some(expense) = app.selected_expense() else {
        app.set_status("No expense selected");
        return Ok(());
    };
    if let Some(id) = expense.id {
        let description = expense.description.clone();
        let amount = format_currency(expense.amount);
        app.confirm(
            PendingAction::DeleteExpense {
                id,
                description: description.clone(),
            },
            format!("Delete '{description}' ({amount})?"),
        );
    }

    Ok(())
}

fn cmd_plan(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(household_id) = require_household(app) else {
        return Ok(());
    };
    if args.is_empty() {
        let parts: Vec<String> = app.plan.categories.iter().map(|c| c.to_string()).collect();
        app.set_status(format!("Plan: {}", parts.join(" / ")));
        return Ok(());
    }

    let Some(preset) = PlanPreset::parse(args) else {
        let names: Vec<&str> = PlanPreset::all().iter().map(|p| p.as_str()).collect();
        app.set_status(format!("Unknown plan '{args}'. Available: {}", names.join(", ")));
        return Ok(());
    };
    let user_id = app.session.user_id()?;
    let orphaned = match db.save_plan(user_id, household_id, &preset.plan()) {
        Ok(orphaned) => orphaned,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    app.refresh_session(db)?;
    app.refresh_budget(db)?;
    if orphaned > 0 {
        app.set_status(format!(
            "Switched to the {preset} plan. {orphaned} expense(s) in other categories are no longer counted"
        ));
    } else {
        app.set_status(format!("Switched to the {preset} plan"));
    }
    Ok(())
}

fn cmd_label(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(household_id) = require_household(app) else {
        return Ok(());
    };
    let Some((key, label)) = args.split_once(' ') else {
        app.set_status("Usage: :label <category> <new label>");
        return Ok(());
    };

    let user_id = app.session.user_id()?;
    match db.relabel_category(user_id, household_id, key, label) {
        Ok(plan) => {
            app.plan = plan;
            app.recalculate();
            app.set_status(format!("Renamed {key} to '{}'", label.trim()));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_create(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :create <household name>");
        return Ok(());
    }
    let user_id = app.session.user_id()?;
    let household = db.create_household(user_id, args, app.default_plan)?;
    if let Some(id) = household.id {
        db.set_current_household(user_id, id)?;
    }
    app.refresh_all(db)?;
    app.screen = Screen::Household;
    app.set_status(format!(
        "Created '{}'. Invite code: {}",
        household.name, household.invite_code
    ));
    Ok(())
}

fn cmd_join(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :join <invite code>");
        return Ok(());
    }
    let user_id = app.session.user_id()?;
    match db.join_household(user_id, args) {
        Ok(household) => {
            if let Some(id) = household.id {
                db.set_current_household(user_id, id)?;
            }
            app.refresh_all(db)?;
            app.screen = Screen::Household;
            app.set_status(format!("Joined '{}'", household.name));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_switch(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        let names: Vec<&str> = app.households.iter().map(|h| h.name.as_str()).collect();
        app.set_status(format!("Usage: :switch <name>. Yours: {}", names.join(", ")));
        return Ok(());
    }
    let user_id = app.session.user_id()?;
    match db.switch_household(user_id, args) {
        Ok(household) => {
            app.refresh_all(db)?;
            app.set_status(format!("Switched to '{}'", household.name));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_remove(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Household {
        app.set_status("Navigate to Household and select a member first");
        return Ok(());
    }
    let Some(me) = app.my_membership() else {
        app.set_status("You are not a member of this household");
        return Ok(());
    };
    let Some(target) = app.selected_member() else {
        app.set_status("No member selected");
        return Ok(());
    };
    if !me.can_remove(target) {
        let reason = if !me.role.can_manage_members() {
            "Only owners and admins can remove members"
        } else if target.role == Role::Owner {
            "The household owner cannot be removed"
        } else {
            "You cannot remove yourself"
        };
        app.set_status(reason);
        return Ok(());
    }

    let (id, name) = (target.id, target.display_name().to_string());
    let message = format!("Remove {name} from {}?", app.household_name());
    app.confirm(PendingAction::RemoveMember { id, name }, message);
    Ok(())
}

fn cmd_role(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Household {
        app.set_status("Navigate to Household and select a member first");
        return Ok(());
    }
    let role = match args.trim().to_lowercase().as_str() {
        "admin" => Role::Admin,
        "member" => Role::Member,
        _ => {
            app.set_status("Usage: :role <admin|member>");
            return Ok(());
        }
    };
    let Some(target) = app.selected_member().map(|m| m.id) else {
        app.set_status("No member selected");
        return Ok(());
    };
    let user_id = app.session.user_id()?;
    match db.set_member_role(user_id, target, role) {
        Ok(member) => {
            app.refresh_household(db)?;
            app.set_status(format!("{} is now {role}", member.display_name()));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_login(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(format!("Logged in as {}", app.session.user.email));
        return Ok(());
    }
    let (email, name) = match args.split_once(' ') {
        Some((e, n)) => (e, Some(n)),
        None => (args, None),
    };
    match db.login(email, name) {
        Ok(session) => {
            app.refresh_all(db)?;
            app.screen = Screen::Dashboard;
            let note = if session.household.is_none() {
                ". Create or join a household to start"
            } else {
                ""
            };
            app.set_status(format!("Logged in as {}{note}", session.user.display_name()));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(household_id) = require_household(app) else {
        return Ok(());
    };
    let path = if args.is_empty() {
        crate::run::default_export_path(&app.current_month)
    } else {
        crate::run::shellexpand(args)
    };

    let expenses = db.get_expenses(household_id, Some(&app.current_month))?;
    if expenses.is_empty() {
        app.set_status("No expenses to export");
        return Ok(());
    }
    let count = crate::csv_io::export_expenses(std::path::Path::new(&path), &expenses)?;
    app.set_status(format!("Exported {count} expenses to {path}"));
    Ok(())
}

fn cmd_import(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(household_id) = require_household(app) else {
        return Ok(());
    };
    if args.is_empty() {
        app.set_status("Usage: :import <file.csv>");
        return Ok(());
    }
    let path = crate::run::shellexpand(args);
    let parsed = crate::csv_io::parse_expenses(
        std::path::Path::new(&path),
        household_id,
        app.session.user.id,
        &app.plan,
    )?;
    for row in &parsed.rejected {
        warn!(line = row.line, reason = %row.reason, "import row rejected");
    }
    let count = db.insert_expenses_batch(&parsed.expenses)?;
    app.poll_changes(db)?;
    app.set_status(format!(
        "Imported {count} expenses ({} rows rejected)",
        parsed.rejected.len()
    ));
    Ok(())
}
