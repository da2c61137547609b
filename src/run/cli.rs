use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::budget::{calculate_category_budgets, current_month, format_currency, parse_month, today, BudgetSummary};
use crate::config::Config;
use crate::db::{Database, Session};
use crate::models::{Expense, MonthlyBudget, PlanPreset, Role};

pub(crate) fn as_cli(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    info!(command = %args[1], "cli");
    match args[1].as_str() {
        "summary" | "s" => cli_summary(&args[2..], db),
        "income" => cli_income(&args[2..], db),
        "add" => cli_add(&args[2..], db),
        "delete" => cli_delete(&args[2..], db),
        "list" | "ls" => cli_list(&args[2..], db),
        "plan" => cli_plan(&args[2..], db),
        "login" => cli_login(&args[2..], db),
        "logout" => {
            db.logout()?;
            println!("Logged out");
            Ok(())
        }
        "whoami" => cli_whoami(db),
        "household" | "hh" => cli_household(&args[2..], db, config),
        "export" => cli_export(&args[2..], db),
        "import" => cli_import(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("housebudget {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("HouseBudget - fixed-ratio household budget tracker");
    println!();
    println!("Usage: housebudget [command]");
    println!();
    println!("Commands:");
    println!("  (none)                              Launch interactive TUI");
    println!("  summary [YYYY-MM]                   Allocated vs spent per category");
    println!("  income [amount] [--month YYYY-MM]   Show or set monthly income");
    println!("  income --all                        Income for every recorded month");
    println!("  add <category> <amount> <description...> [--date YYYY-MM-DD]");
    println!("                                      Record an expense");
    println!("  delete <id>                         Delete an expense");
    println!("  list [YYYY-MM]                      List expenses grouped by category");
    println!("  plan [classic|couple]               Show or switch the category plan");
    println!("  plan label <category> <label...>    Rename a category");
    println!("  login <email> [name...]             Switch to (or create) a user");
    println!("  logout                              Forget the current user");
    println!("  whoami                              Show user and household");
    println!("  household [list]                    Your households");
    println!("  household create <name...>          Create a household (you become owner)");
    println!("  household join <code>               Join with an invite code");
    println!("  household members                   Members of the current household");
    println!("  household remove <member-id>        Remove a member (owner/admin)");
    println!("  household role <member-id> <admin|member>");
    println!("                                      Change a member's role (owner)");
    println!("  household switch <name|code>        Change the current household");
    println!("  export [path] [--month YYYY-MM]     Export expenses to CSV");
    println!("  import <file.csv>                   Import date,category,description,amount rows");
    println!("  --help, -h                          Show this help");
    println!("  --version, -V                       Show version");
}

/// Value following `flag`, e.g. `--month 2024-01`.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments with `--flag value` pairs removed.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn month_arg(value: Option<&str>) -> Result<String> {
    let current = current_month();
    match value {
        Some(m) => Ok(parse_month(m, &current)?),
        None => Ok(current),
    }
}

fn household_session(db: &Database) -> Result<(Session, i64)> {
    let session = db.require_session()?;
    let household_id = session.household_id()?;
    Ok((session, household_id))
}

/// Build an expense from `<category> <amount> <description...> [--date D]`.
pub(crate) fn parse_add_args(tokens: &[&str], household_id: i64, created_by: Option<i64>) -> Result<Expense> {
    let mut date = None;
    let mut rest = Vec::new();
    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        if token == "--date" {
            date = iter.next().copied();
        } else {
            rest.push(token);
        }
    }

    let [category, amount, description @ ..] = rest.as_slice() else {
        anyhow::bail!("Usage: add <category> <amount> <description...> [--date YYYY-MM-DD]");
    };
    let amount = Expense::parse_amount(amount)?;
    let date = date.map_or_else(today, str::to_string);
    Ok(Expense::new(
        household_id,
        category,
        &description.join(" "),
        amount,
        &date,
        created_by,
    )?)
}

pub(crate) fn default_export_path(month: &str) -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    format!("{home}/housebudget-export-{month}.csv")
}

// ── Budget ───────────────────────────────────────────────────

fn cli_summary(args: &[String], db: &mut Database) -> Result<()> {
    let (session, household_id) = household_session(db)?;
    let month = month_arg(positional(args).first().copied())?;

    let plan = db.get_plan(household_id)?;
    let income = db.get_income(household_id, &month)?;
    let expenses = db.get_expenses(household_id, Some(&month))?;
    let budgets = calculate_category_budgets(income, &expenses, &month, &plan);
    let summary = BudgetSummary::from_budgets(&budgets);

    let household = session.require_household()?;
    println!("{} - {month}", household.name);
    println!("{}", "─".repeat(72));
    println!("  Income: {}", format_currency(income));
    if income.is_zero() {
        println!("  (no income set; use `housebudget income <amount>`)");
    }
    println!();
    println!(
        "  {:<20} {:>5} {:>13} {:>13} {:>13}",
        "Category", "%", "Allocated", "Spent", "Remaining"
    );
    for b in &budgets {
        let flag = if b.is_over_budget() {
            format!("  over by {}", format_currency(b.over_by()))
        } else {
            format!("  {:.0}% used, {}", b.spending_percentage(), b.tier())
        };
        println!(
            "  {:<20} {:>4}% {:>13} {:>13} {:>13}{flag}",
            b.label,
            b.percentage,
            format_currency(b.allocated),
            format_currency(b.spent),
            format_currency(b.remaining),
        );
    }
    println!("{}", "─".repeat(72));
    println!(
        "  {:<20} {:>5} {:>13} {:>13} {:>13}",
        "Total",
        "",
        format_currency(summary.allocated),
        format_currency(summary.spent),
        format_currency(summary.remaining),
    );
    Ok(())
}

fn cli_income(args: &[String], db: &mut Database) -> Result<()> {
    let (_, household_id) = household_session(db)?;
    if args.iter().any(|a| a == "--all") {
        let budgets = db.get_budgets(household_id)?;
        if budgets.is_empty() {
            println!("No income recorded yet");
        }
        for budget in budgets {
            println!("  {}  {:>14}", budget.month, format_currency(budget.income));
        }
        return Ok(());
    }
    let month = month_arg(flag_value(args, "--month"))?;

    match positional(args).first() {
        None => {
            let income = db.get_income(household_id, &month)?;
            println!("Income for {month}: {}", format_currency(income));
        }
        Some(value) => {
            let income = MonthlyBudget::parse_income(value)?;
            db.set_income(household_id, &month, income)?;
            println!("Income for {month} set to {}", format_currency(income));
        }
    }
    Ok(())
}

fn cli_add(args: &[String], db: &mut Database) -> Result<()> {
    let (session, household_id) = household_session(db)?;
    let tokens: Vec<&str> = args.iter().map(String::as_str).collect();
    let expense = parse_add_args(&tokens, household_id, session.user.id)?;

    let id = match db.insert_expense(&expense) {
        Ok(id) => id,
        Err(e) => {
            let plan = db.get_plan(household_id)?;
            anyhow::bail!("{e}. Categories: {}", plan.keys().join(", "));
        }
    };
    let plan = db.get_plan(household_id)?;
    println!(
        "Added #{id}: {} {} to {} on {}",
        expense.description,
        format_currency(expense.amount),
        plan.label_for(&expense.category),
        expense.date
    );
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database) -> Result<()> {
    let (_, household_id) = household_session(db)?;
    let id: i64 = args
        .first()
        .and_then(|a| a.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Usage: housebudget delete <id>"))?;
    db.delete_expense(household_id, id)?;
    println!("Deleted expense #{id}");
    Ok(())
}

fn cli_list(args: &[String], db: &mut Database) -> Result<()> {
    let (_, household_id) = household_session(db)?;
    let month = month_arg(positional(args).first().copied())?;
    let plan = db.get_plan(household_id)?;
    let expenses = db.get_expenses(household_id, Some(&month))?;

    if expenses.is_empty() {
        println!("No expenses for {month}");
        return Ok(());
    }

    for group in crate::budget::group_by_category(&expenses, &plan) {
        println!("{} ({})", group.label, format_currency(group.total));
        for e in &group.expenses {
            println!(
                "  #{:<5} {}  {:<36} {:>12}",
                e.id.unwrap_or(0),
                e.date,
                e.description,
                format_currency(e.amount)
            );
        }
    }
    Ok(())
}

fn cli_plan(args: &[String], db: &mut Database) -> Result<()> {
    let (session, household_id) = household_session(db)?;

    match args.first().map(String::as_str) {
        None => {
            let plan = db.get_plan(household_id)?;
            for cat in &plan.categories {
                println!("  {:<16} {:<20} {:>3}%", cat.key, cat.label, cat.percentage);
            }
        }
        Some("label") => {
            let (Some(key), true) = (args.get(1), args.len() > 2) else {
                anyhow::bail!("Usage: housebudget plan label <category> <label...>");
            };
            let label = args[2..].join(" ");
            let plan = db.relabel_category(session.user_id()?, household_id, key, &label)?;
            println!("{} is now labelled '{}'", key, plan.label_for(key));
        }
        Some(name) => {
            let preset = PlanPreset::parse(name).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown plan '{name}'. Available: {}",
                    PlanPreset::all()
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?;
            let plan = preset.plan();
            let orphaned = db.save_plan(session.user_id()?, household_id, &plan)?;
            let parts: Vec<String> = plan.categories.iter().map(|c| c.to_string()).collect();
            println!("Switched to {preset}: {}", parts.join(" / "));
            if orphaned > 0 {
                println!(
                    "Note: {orphaned} expense(s) use categories outside this plan and are not counted. \
                     Switch back to see them again."
                );
            }
        }
    }
    Ok(())
}

// ── Session ──────────────────────────────────────────────────

fn cli_login(args: &[String], db: &mut Database) -> Result<()> {
    let Some(email) = args.first() else {
        anyhow::bail!("Usage: housebudget login <email> [name...]");
    };
    let name = (args.len() > 1).then(|| args[1..].join(" "));
    let session = db.login(email, name.as_deref())?;
    println!("Logged in as {}", session.user.display_name());
    match &session.household {
        Some(h) => println!("Household: {}", h.name),
        None => println!("No household yet. Create one or join with an invite code"),
    }
    Ok(())
}

fn cli_whoami(db: &mut Database) -> Result<()> {
    let session = db.require_session()?;
    println!("{} <{}>", session.user.display_name(), session.user.email);
    match &session.household {
        Some(h) => {
            let role = match (h.id, session.user.id) {
                (Some(hid), Some(uid)) => db.get_membership(hid, uid)?.map(|m| m.role),
                _ => None,
            };
            let count = match h.id {
                Some(hid) => db.get_expense_count(hid)?,
                None => 0,
            };
            println!(
                "Household: {} ({}) invite code {}, {count} expenses",
                h.name,
                role.map_or("?", |r| r.as_str()),
                h.invite_code
            );
        }
        None => println!("No household selected"),
    }
    Ok(())
}

// ── Household ────────────────────────────────────────────────

fn cli_household(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let session = db.require_session()?;
    let user_id = session.user_id()?;
    let rest = args.get(1..).unwrap_or_default();

    match args.first().map(String::as_str).unwrap_or("list") {
        "list" => {
            let households = db.get_households_for_user(user_id)?;
            if households.is_empty() {
                println!("No households");
                return Ok(());
            }
            let current = session.household.as_ref().and_then(|h| h.id);
            for h in &households {
                let marker = if h.id == current { "*" } else { " " };
                println!("{marker} {:<24} {}", h.name, h.invite_code);
            }
        }
        "create" => {
            if rest.is_empty() {
                anyhow::bail!("Usage: housebudget household create <name...>");
            }
            let household = db.create_household(user_id, &rest.join(" "), config.default_plan)?;
            if let Some(id) = household.id {
                db.set_current_household(user_id, id)?;
            }
            println!(
                "Created '{}'. Share invite code {} to add members",
                household.name, household.invite_code
            );
        }
        "join" => {
            let Some(code) = rest.first() else {
                anyhow::bail!("Usage: housebudget household join <code>");
            };
            let household = db.join_household(user_id, code)?;
            if let Some(id) = household.id {
                db.set_current_household(user_id, id)?;
            }
            println!("Joined '{}'", household.name);
        }
        "members" => {
            let household_id = session.household_id()?;
            println!("{:<5} {:<32} {:<8} Joined", "ID", "Name", "Role");
            println!("{}", "─".repeat(60));
            for m in db.get_members(household_id)? {
                let you = if m.user_id == user_id { " (you)" } else { "" };
                println!(
                    "{:<5} {:<32} {:<8} {}{you}",
                    m.id,
                    m.display_name(),
                    m.role,
                    m.joined_at.get(..10).unwrap_or(m.joined_at.as_str())
                );
            }
        }
        "remove" => {
            let member_id = parse_member_id(rest.first())?;
            let removed = db.remove_member(user_id, member_id)?;
            println!("Removed {}", removed.display_name());
        }
        "role" => {
            let member_id = parse_member_id(rest.first())?;
            let role = match rest.get(1).map(|r| r.to_lowercase()).as_deref() {
                Some("admin") => Role::Admin,
                Some("member") => Role::Member,
                _ => anyhow::bail!("Usage: housebudget household role <member-id> <admin|member>"),
            };
            let member = db.set_member_role(user_id, member_id, role)?;
            println!("{} is now {}", member.display_name(), member.role);
        }
        "switch" => {
            if rest.is_empty() {
                anyhow::bail!("Usage: housebudget household switch <name|code>");
            }
            let household = db.switch_household(user_id, &rest.join(" "))?;
            println!("Switched to '{}'", household.name);
        }
        other => anyhow::bail!("Unknown household command: {other}"),
    }
    Ok(())
}

fn parse_member_id(arg: Option<&String>) -> Result<i64> {
    arg.and_then(|a| a.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Expected a member id (see `housebudget household members`)"))
}

// ── CSV ──────────────────────────────────────────────────────

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let (_, household_id) = household_session(db)?;
    let month = month_arg(flag_value(args, "--month"))?;

    // Output path is the first non-flag argument
    let output_path = positional(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| default_export_path(&month));

    let expenses = db.get_expenses(household_id, Some(&month))?;
    if expenses.is_empty() {
        println!("No expenses for {month}");
        return Ok(());
    }
    let count = crate::csv_io::export_expenses(Path::new(&output_path), &expenses)?;
    println!("Exported {count} expenses to {output_path}");
    Ok(())
}

fn cli_import(args: &[String], db: &mut Database) -> Result<()> {
    let (session, household_id) = household_session(db)?;
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: housebudget import <file.csv>");
    };
    let path = shellexpand(file_path);
    let path = Path::new(&path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let plan = db.get_plan(household_id)?;
    let parsed = crate::csv_io::parse_expenses(path, household_id, session.user.id, &plan)?;
    for row in &parsed.rejected {
        warn!(line = row.line, reason = %row.reason, "import row rejected");
        eprintln!("  line {}: {}", row.line, row.reason);
    }

    let count = db.insert_expenses_batch(&parsed.expenses)?;
    println!(
        "Imported {count} expenses ({} rows rejected)",
        parsed.rejected.len()
    );
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rust_decimal_macros::dec;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_add_args() {
        let e = parse_add_args(&["needs", "$82.15", "Weekly", "groceries"], 3, Some(9)).unwrap();
        assert_eq!(e.category, "needs");
        assert_eq!(e.amount, dec!(82.15));
        assert_eq!(e.description, "Weekly groceries");
        assert_eq!(e.household_id, 3);
        assert_eq!(e.created_by, Some(9));
        assert_eq!(e.date, today());
    }

    #[test]
    fn test_parse_add_args_with_date_anywhere() {
        let e = parse_add_args(&["wants", "--date", "2024-01-14", "12", "Movie"], 1, None).unwrap();
        assert_eq!(e.date, "2024-01-14");
        assert_eq!(e.description, "Movie");
    }

    #[test]
    fn test_parse_add_args_rejects() {
        assert!(parse_add_args(&["needs", "10"], 1, None).is_err());
        assert!(parse_add_args(&["needs", "-10", "Refund"], 1, None).is_err());
        assert!(parse_add_args(&["needs", "10", "Rent", "--date", "2024-02-30"], 1, None).is_err());
    }

    #[test]
    fn test_positional_skips_flags() {
        let args = strings(&["out.csv", "--month", "2024-01"]);
        assert_eq!(positional(&args), vec!["out.csv"]);
        assert_eq!(flag_value(&args, "--month"), Some("2024-01"));
        assert_eq!(flag_value(&args, "--date"), None);
    }

    #[test]
    fn test_month_arg() {
        assert_eq!(month_arg(Some("2024-3")).unwrap(), "2024-03");
        assert_eq!(month_arg(None).unwrap(), current_month());
        assert!(month_arg(Some("2024-13")).is_err());
    }

    #[test]
    fn test_shellexpand() {
        assert_eq!(shellexpand("/tmp/x.csv"), "/tmp/x.csv");
        assert!(!shellexpand("~/x.csv").starts_with('~'));
    }
}
