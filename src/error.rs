use thiserror::Error;

/// Domain rejections raised outside the budget calculator.
///
/// These travel inside `anyhow::Error`; callers that need to branch on a
/// specific case use `err.downcast_ref::<BudgetError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum BudgetError {
    #[error("Amount must be a positive number up to {max}, got '{0}'", max = crate::models::MAX_AMOUNT)]
    InvalidAmount(String),

    #[error("Description cannot be empty")]
    EmptyDescription,

    #[error("Invalid date '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid month '{0}'. Use YYYY-MM (e.g. 2024-01)")]
    InvalidMonth(String),

    #[error("Income must be between 0 and {max}, got '{0}'", max = crate::models::MAX_AMOUNT)]
    InvalidIncome(String),

    #[error("Invalid budget plan: {0}")]
    InvalidPlan(String),

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Not logged in. Use `login <email>` first")]
    NotLoggedIn,

    #[error("No household selected. Create one or join with an invite code")]
    NoHousehold,

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Already a member of this household")]
    AlreadyMember,

    #[error("Not a member of this household")]
    NotAMember,

    #[error("Only {0} can do that")]
    PermissionDenied(&'static str),

    #[error("The household owner cannot be removed")]
    CannotRemoveOwner,

    #[error("The owner role can't be reassigned")]
    OwnerRoleFixed,

    #[error("You cannot remove yourself")]
    CannotRemoveSelf,

    #[error("Member {0} not found")]
    MemberNotFound(i64),

    #[error("Expense {0} not found")]
    ExpenseNotFound(i64),
}
