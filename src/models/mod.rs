mod budget;
mod category;
mod expense;
mod household;
mod plan;

pub use budget::MonthlyBudget;
pub use category::BudgetCategory;
pub use expense::{Expense, DATE_FMT, MAX_AMOUNT};
pub(crate) use expense::within_limit;
pub use household::{
    generate_invite_code, normalize_invite_code, Household, Member, Profile, Role,
    INVITE_CODE_LEN,
};
pub use plan::{BudgetPlan, PlanPreset};
