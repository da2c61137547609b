mod household;
mod schema;
mod session;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::BudgetError;
use crate::feed::{ChangeKind, ChangeRecord};
use crate::models::*;

pub(crate) use session::Session;

pub(crate) struct Database {
    conn: Connection,
}

/// Change records kept when a database is opened.
const CHANGE_LOG_KEEP: i64 = 1000;
const PRUNED_THROUGH_KEY: &str = "changes_pruned_through";

const EXPENSE_COLUMNS: &str =
    "id, household_id, category, description, amount, date, created_by, created_at";

fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let amount_str: String = row.get(4)?;
    Ok(Expense {
        id: Some(row.get(0)?),
        household_id: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        date: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn budget_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MonthlyBudget> {
    let income_str: String = row.get(3)?;
    Ok(MonthlyBudget {
        id: Some(row.get(0)?),
        household_id: row.get(1)?,
        month: row.get(2)?,
        income: Decimal::from_str(&income_str).unwrap_or_default(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        // A CLI and a TUI may share the file
        conn.busy_timeout(std::time::Duration::from_secs(2))?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.prune_changes(CHANGE_LOG_KEEP)?;
        info!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        // Check if schema_version table exists
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            debug!(version = schema::CURRENT_VERSION, "created fresh schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            info!(from = current, to = schema::CURRENT_VERSION, "schema migrated");
        }

        Ok(())
    }

    // ── Settings ──────────────────────────────────────────────

    pub(crate) fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    pub(crate) fn delete_setting(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Expenses ──────────────────────────────────────────────

    /// Store a new expense after checking its category against the
    /// household's plan. Returns the new row id.
    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        let plan = self.get_plan(expense.household_id)?;
        if !plan.contains(&expense.category) {
            return Err(BudgetError::UnknownCategory(expense.category.clone()).into());
        }
        self.conn.execute(
            "INSERT INTO expenses (household_id, category, description, amount, date, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                expense.household_id,
                expense.category,
                expense.description,
                expense.amount.to_string(),
                expense.date,
                expense.created_by,
                expense.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(
            id,
            household = expense.household_id,
            category = %expense.category,
            amount = %expense.amount,
            "expense added"
        );
        Ok(id)
    }

    /// Insert many expenses in one transaction. Every row must already be
    /// valid for the plan; the first failure rolls the batch back.
    pub(crate) fn insert_expenses_batch(&mut self, expenses: &[Expense]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        for expense in expenses {
            tx.execute(
                "INSERT INTO expenses (household_id, category, description, amount, date, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    expense.household_id,
                    expense.category,
                    expense.description,
                    expense.amount.to_string(),
                    expense.date,
                    expense.created_by,
                    expense.created_at,
                ],
            )?;
            count += 1;
        }
        tx.commit()?;
        info!(count, "expense batch inserted");
        Ok(count)
    }

    /// Expenses for a household, newest first, optionally limited to one month.
    pub(crate) fn get_expenses(&self, household_id: i64, month: Option<&str>) -> Result<Vec<Expense>> {
        let mut sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE household_id = ?1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(household_id)];

        if let Some(m) = month {
            sql.push_str(" AND date LIKE ?2");
            param_values.push(Box::new(format!("{m}-%")));
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"),
                params![id],
                expense_from_row,
            )
            .optional()?)
    }

    pub(crate) fn delete_expense(&self, household_id: i64, id: i64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM expenses WHERE id = ?1 AND household_id = ?2",
            params![id, household_id],
        )?;
        if deleted == 0 {
            return Err(BudgetError::ExpenseNotFound(id).into());
        }
        info!(id, household = household_id, "expense deleted");
        Ok(())
    }

    pub(crate) fn get_expense_count(&self, household_id: i64) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE household_id = ?1",
            params![household_id],
            |row| row.get(0),
        )?)
    }

    // ── Budgets ───────────────────────────────────────────────

    /// Fetch the month's budget, creating a zero-income row if none exists.
    pub(crate) fn get_or_create_budget(&self, household_id: i64, month: &str) -> Result<MonthlyBudget> {
        let fresh = MonthlyBudget::new(household_id, month.to_string(), Decimal::ZERO);
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO budgets (household_id, month, income, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fresh.household_id,
                fresh.month,
                fresh.income.to_string(),
                fresh.created_at,
                fresh.updated_at,
            ],
        )?;
        if inserted > 0 {
            debug!(household = household_id, month, "created empty budget");
        }
        Ok(self.conn.query_row(
            "SELECT id, household_id, month, income, created_at, updated_at
             FROM budgets WHERE household_id = ?1 AND month = ?2",
            params![household_id, month],
            budget_from_row,
        )?)
    }

    /// Income for a month without creating anything; zero when unset.
    pub(crate) fn get_income(&self, household_id: i64, month: &str) -> Result<Decimal> {
        let income: Option<String> = self
            .conn
            .query_row(
                "SELECT income FROM budgets WHERE household_id = ?1 AND month = ?2",
                params![household_id, month],
                |row| row.get(0),
            )
            .optional()?;
        Ok(income
            .and_then(|s| Decimal::from_str(&s).ok())
            .unwrap_or_default())
    }

    pub(crate) fn set_income(&self, household_id: i64, month: &str, income: Decimal) -> Result<MonthlyBudget> {
        if income < Decimal::ZERO || !within_limit(income) {
            return Err(BudgetError::InvalidIncome(income.to_string()).into());
        }
        let budget = MonthlyBudget::new(household_id, month.to_string(), income);
        self.conn.execute(
            "INSERT INTO budgets (household_id, month, income, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(household_id, month) DO UPDATE SET income = ?3, updated_at = ?5",
            params![
                budget.household_id,
                budget.month,
                budget.income.to_string(),
                budget.created_at,
                budget.updated_at,
            ],
        )?;
        info!(household = household_id, month, income = %income, "income updated");
        self.get_or_create_budget(household_id, month)
    }

    pub(crate) fn get_budgets(&self, household_id: i64) -> Result<Vec<MonthlyBudget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, household_id, month, income, created_at, updated_at
             FROM budgets WHERE household_id = ?1 ORDER BY month DESC",
        )?;
        let rows = stmt.query_map(params![household_id], budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Change log ────────────────────────────────────────────

    /// Highest sequence number removed by `prune_changes`, 0 if none.
    pub(crate) fn changes_pruned_through(&self) -> Result<i64> {
        Ok(self
            .get_setting(PRUNED_THROUGH_KEY)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    /// Drop all but the newest `keep` change records.
    ///
    /// Feeds whose cursor falls behind the prune point reload from the
    /// expenses table instead of replaying the log.
    pub(crate) fn prune_changes(&mut self, keep: i64) -> Result<usize> {
        let latest: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM expense_changes",
            [],
            |row| row.get(0),
        )?;
        let cutoff = latest - keep;
        if cutoff <= self.changes_pruned_through()? {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM expense_changes WHERE seq <= ?1", params![cutoff])?;
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![PRUNED_THROUGH_KEY, cutoff.to_string()],
        )?;
        tx.commit()?;
        if removed > 0 {
            debug!(removed, through = cutoff, "change log pruned");
        }
        Ok(removed)
    }

    pub(crate) fn latest_change_seq(&self, household_id: i64) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM expense_changes WHERE household_id = ?1",
            params![household_id],
            |row| row.get(0),
        )?)
    }

    /// Change records for a household with `seq > since`, oldest first.
    pub(crate) fn changes_since(&self, household_id: i64, since: i64) -> Result<Vec<ChangeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, expense_id, kind FROM expense_changes
             WHERE household_id = ?1 AND seq > ?2 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![household_id, since], |row| {
            let kind: String = row.get(2)?;
            Ok(ChangeRecord {
                seq: row.get(0)?,
                expense_id: row.get(1)?,
                kind: ChangeKind::parse(&kind),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
