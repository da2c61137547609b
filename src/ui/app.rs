use anyhow::Result;
use rust_decimal::Decimal;

use crate::budget::{calculate_category_budgets, group_by_category, BudgetSummary, CategoryBudget};
use crate::db::{Database, Session};
use crate::error::BudgetError;
use crate::feed::{ExpenseFeed, ListState};
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Expenses,
    Household,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Expenses, Self::Household]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Expenses => write!(f, "Expenses"),
            Self::Household => write!(f, "Household"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Editing => write!(f, "INCOME"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone)]
pub(crate) enum PendingAction {
    DeleteExpense { id: i64, description: String },
    RemoveMember { id: i64, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditorMode {
    Display,
    Editing,
}

/// The monthly income field on the dashboard.
///
/// A month without income shows the input field straight away; once an
/// income is saved the field collapses to a read-only figure.
#[derive(Debug, Clone)]
pub(crate) struct IncomeEditor {
    pub(crate) mode: EditorMode,
    pub(crate) input: String,
}

impl IncomeEditor {
    pub(crate) fn for_income(income: Decimal) -> Self {
        Self {
            mode: if income.is_zero() {
                EditorMode::Editing
            } else {
                EditorMode::Display
            },
            input: String::new(),
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.mode == EditorMode::Editing
    }

    /// Open the field pre-filled with the current income.
    pub(crate) fn begin(&mut self, current: Decimal) {
        self.mode = EditorMode::Editing;
        self.input = if current.is_zero() {
            String::new()
        } else {
            current.to_string()
        };
    }

    pub(crate) fn cancel(&mut self, current: Decimal) {
        *self = Self::for_income(current);
    }

    /// Validate the typed value. The editor is left untouched on error so
    /// the user can fix the input.
    pub(crate) fn submit(&mut self) -> Result<Decimal, BudgetError> {
        let income = MonthlyBudget::parse_income(&self.input)?;
        *self = Self::for_income(income);
        Ok(income)
    }
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) current_month: String,

    // Session
    pub(crate) session: Session,
    pub(crate) plan: BudgetPlan,
    /// Plan new households start with.
    pub(crate) default_plan: PlanPreset,

    // Dashboard
    pub(crate) income: Decimal,
    pub(crate) income_editor: IncomeEditor,
    pub(crate) budgets: Vec<CategoryBudget>,
    pub(crate) summary: BudgetSummary,

    // Expenses
    pub(crate) feed: ExpenseFeed,
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,

    // Household
    pub(crate) households: Vec<Household>,
    pub(crate) members: Vec<Member>,
    pub(crate) member_index: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(session: Session, default_plan: PlanPreset) -> Self {
        let current_month = crate::budget::current_month();
        let household_id = household_id_of(&session).unwrap_or_default();

        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,

            session,
            plan: BudgetPlan::default(),
            default_plan,

            income: Decimal::ZERO,
            income_editor: IncomeEditor::for_income(Decimal::ZERO),
            budgets: Vec::new(),
            summary: BudgetSummary::from_budgets(&[]),

            feed: ExpenseFeed::new(household_id, &current_month),
            expense_index: 0,
            expense_scroll: 0,

            households: Vec::new(),
            members: Vec::new(),
            member_index: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
            current_month,
        }
    }

    pub(crate) fn household_id(&self) -> Option<i64> {
        household_id_of(&self.session)
    }

    pub(crate) fn household_name(&self) -> &str {
        self.session
            .household
            .as_ref()
            .map_or("(no household)", |h| h.name.as_str())
    }

    /// The caller's own membership row in the current household.
    pub(crate) fn my_membership(&self) -> Option<&Member> {
        let user_id = self.session.user.id?;
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// Re-read who is logged in and which household is selected.
    pub(crate) fn refresh_session(&mut self, db: &Database) -> Result<()> {
        self.session = db.require_session()?;
        self.plan = match self.household_id() {
            Some(id) => db.get_plan(id)?,
            None => BudgetPlan::default(),
        };
        Ok(())
    }

    pub(crate) fn refresh_expenses(&mut self, db: &Database) -> Result<()> {
        match self.household_id() {
            Some(id) => {
                self.feed = ExpenseFeed::new(id, &self.current_month);
                self.feed.load(db)?;
            }
            None => {
                self.feed = ExpenseFeed::new(0, &self.current_month);
                self.feed.state = ListState::Ready;
            }
        }
        self.clamp_expense_cursor();
        Ok(())
    }

    /// Reload the month's income and rebuild the snapshot.
    pub(crate) fn refresh_budget(&mut self, db: &Database) -> Result<()> {
        self.income = match self.household_id() {
            Some(id) => db.get_income(id, &self.current_month)?,
            None => Decimal::ZERO,
        };
        if self.input_mode != InputMode::Editing {
            self.income_editor = IncomeEditor::for_income(self.income);
        }
        self.recalculate();
        Ok(())
    }

    /// Recompute the snapshot from the in-memory income and expense list.
    pub(crate) fn recalculate(&mut self) {
        self.budgets =
            calculate_category_budgets(self.income, &self.feed.expenses, &self.current_month, &self.plan);
        self.summary = BudgetSummary::from_budgets(&self.budgets);
    }

    pub(crate) fn refresh_household(&mut self, db: &Database) -> Result<()> {
        let user_id = self.session.user_id()?;
        self.households = db.get_households_for_user(user_id)?;
        self.members = match self.household_id() {
            Some(id) => db.get_members(id)?,
            None => Vec::new(),
        };
        if self.member_index >= self.members.len() {
            self.member_index = self.members.len().saturating_sub(1);
        }
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_session(db)?;
        self.refresh_expenses(db)?; // the snapshot reads the loaded expenses
        self.refresh_budget(db)?;
        self.refresh_household(db)?;
        Ok(())
    }

    /// Apply changes other writers made since the last poll.
    /// Returns true when anything visible changed.
    pub(crate) fn poll_changes(&mut self, db: &Database) -> Result<bool> {
        if self.household_id().is_none() {
            return Ok(false);
        }
        let applied = self.feed.poll(db)?;
        if applied == 0 {
            return Ok(false);
        }
        self.recalculate();
        self.clamp_expense_cursor();
        Ok(true)
    }

    pub(crate) fn set_month(&mut self, db: &Database, month: String) -> Result<()> {
        self.current_month = month;
        self.expense_index = 0;
        self.expense_scroll = 0;
        match self.household_id() {
            Some(id) if self.feed.household_id == id => {
                self.feed.set_month(db, &self.current_month)?;
            }
            _ => self.refresh_expenses(db)?,
        }
        self.refresh_budget(db)?;
        Ok(())
    }

    pub(crate) fn shift_month(&mut self, db: &Database, delta: i32) -> Result<()> {
        let month = crate::budget::shift_month(&self.current_month, delta);
        self.set_month(db, month)?;
        self.set_status(format!("Month: {}", self.current_month));
        Ok(())
    }

    /// Expenses in the order the Expenses screen lists them.
    pub(crate) fn visible_expenses(&self) -> Vec<&Expense> {
        group_by_category(&self.feed.expenses, &self.plan)
            .into_iter()
            .flat_map(|g| g.expenses)
            .collect()
    }

    pub(crate) fn selected_expense(&self) -> Option<&Expense> {
        self.visible_expenses().get(self.expense_index).copied()
    }

    pub(crate) fn selected_member(&self) -> Option<&Member> {
        self.members.get(self.member_index)
    }

    fn clamp_expense_cursor(&mut self) {
        let len = self.feed.expenses.len();
        if self.expense_index >= len {
            self.expense_index = len.saturating_sub(1);
        }
        if self.expense_scroll > self.expense_index {
            self.expense_scroll = self.expense_index;
        }
    }

    pub(crate) fn confirm(&mut self, action: PendingAction, message: String) {
        self.confirm_message = message;
        self.pending_action = Some(action);
        self.input_mode = InputMode::Confirm;
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

fn household_id_of(session: &Session) -> Option<i64> {
    session.household.as_ref().and_then(|h| h.id)
}
