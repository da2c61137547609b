//! Live expense list for one month.
//!
//! Triggers on `expenses` append to the `expense_changes` log. Every open
//! view remembers the last sequence number it has seen and patches its
//! local list from newer records, so writes from another process (a CLI
//! run, a second TUI) show up without a full reload.

use anyhow::Result;
use tracing::debug;

use crate::budget::{group_by_category, ExpenseGroup};
use crate::db::Database;
use crate::models::{BudgetPlan, Expense};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Unknown kinds are treated as updates, which re-read the row.
    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "insert" => Self::Insert,
            "delete" => Self::Delete,
            _ => Self::Update,
        }
    }
}

/// One row of the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChangeRecord {
    pub(crate) seq: i64,
    pub(crate) expense_id: i64,
    pub(crate) kind: ChangeKind,
}

/// A change resolved against the current state of the store.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExpenseChange {
    Inserted(Expense),
    Updated(Expense),
    Deleted(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListState {
    Loading,
    Ready,
}

/// What the expense list should render.
#[derive(Debug)]
pub(crate) enum FeedView<'a> {
    Loading,
    Empty,
    Grouped(Vec<ExpenseGroup<'a>>),
}

#[derive(Debug, Clone)]
pub(crate) struct ExpenseFeed {
    pub(crate) household_id: i64,
    pub(crate) month: String,
    pub(crate) expenses: Vec<Expense>,
    pub(crate) state: ListState,
    pub(crate) last_seq: i64,
}

impl ExpenseFeed {
    pub(crate) fn new(household_id: i64, month: &str) -> Self {
        Self {
            household_id,
            month: month.to_string(),
            expenses: Vec::new(),
            state: ListState::Loading,
            last_seq: 0,
        }
    }

    /// Replace the list with a fresh read and catch up on the change log.
    pub(crate) fn load(&mut self, db: &Database) -> Result<()> {
        self.state = ListState::Loading;
        self.last_seq = db
            .latest_change_seq(self.household_id)?
            .max(db.changes_pruned_through()?);
        self.expenses = db.get_expenses(self.household_id, Some(&self.month))?;
        self.state = ListState::Ready;
        Ok(())
    }

    /// Point the feed at another month and reload.
    pub(crate) fn set_month(&mut self, db: &Database, month: &str) -> Result<()> {
        self.month = month.to_string();
        self.load(db)
    }

    pub(crate) fn contains(&self, id: i64) -> bool {
        self.expenses.iter().any(|e| e.id == Some(id))
    }

    /// Patch the local list with one change.
    ///
    /// Returns whether the list changed.
    pub(crate) fn apply(&mut self, change: ExpenseChange) -> bool {
        match change {
            ExpenseChange::Inserted(expense) => {
                let Some(id) = expense.id else {
                    return false;
                };
                if !expense.is_in_month(&self.month) || self.contains(id) {
                    return false;
                }
                self.expenses.insert(0, expense);
                true
            }
            ExpenseChange::Updated(expense) => {
                let Some(id) = expense.id else {
                    return false;
                };
                let position = self.expenses.iter().position(|e| e.id == Some(id));
                match (position, expense.is_in_month(&self.month)) {
                    (Some(i), true) => {
                        self.expenses[i] = expense;
                        true
                    }
                    (Some(i), false) => {
                        self.expenses.remove(i);
                        true
                    }
                    (None, true) => {
                        self.expenses.insert(0, expense);
                        true
                    }
                    (None, false) => false,
                }
            }
            ExpenseChange::Deleted(id) => {
                let before = self.expenses.len();
                self.expenses.retain(|e| e.id != Some(id));
                self.expenses.len() != before
            }
        }
    }

    /// Pull change records newer than `last_seq` and apply them.
    ///
    /// Returns the number of changes that altered the list. A feed whose
    /// cursor predates the pruned part of the log reloads instead.
    pub(crate) fn poll(&mut self, db: &Database) -> Result<usize> {
        if db.changes_pruned_through()? > self.last_seq {
            let before = std::mem::take(&mut self.expenses);
            self.load(db)?;
            debug!(seq = self.last_seq, month = %self.month, "feed reloaded after prune");
            return Ok(usize::from(before != self.expenses));
        }
        let records = db.changes_since(self.household_id, self.last_seq)?;
        let mut applied = 0;
        for record in records {
            self.last_seq = self.last_seq.max(record.seq);
            debug!(seq = record.seq, expense = record.expense_id, kind = record.kind.as_str(), "change");
            let change = resolve(db, &record)?;
            if self.apply(change) {
                applied += 1;
            }
        }
        if applied > 0 {
            debug!(applied, seq = self.last_seq, month = %self.month, "feed updated");
        }
        Ok(applied)
    }

    pub(crate) fn view<'a>(&'a self, plan: &BudgetPlan) -> FeedView<'a> {
        match self.state {
            ListState::Loading => FeedView::Loading,
            ListState::Ready if self.expenses.is_empty() => FeedView::Empty,
            ListState::Ready => FeedView::Grouped(group_by_category(&self.expenses, plan)),
        }
    }
}

/// Turn a log record into a change. A row that no longer exists is a
/// delete, whatever the record says.
fn resolve(db: &Database, record: &ChangeRecord) -> Result<ExpenseChange> {
    if record.kind == ChangeKind::Delete {
        return Ok(ExpenseChange::Deleted(record.expense_id));
    }
    Ok(match db.get_expense(record.expense_id)? {
        Some(expense) if record.kind == ChangeKind::Insert => ExpenseChange::Inserted(expense),
        Some(expense) => ExpenseChange::Updated(expense),
        None => ExpenseChange::Deleted(record.expense_id),
    })
}
