use anyhow::Result;
use tracing::info;

use super::Database;
use crate::error::BudgetError;
use crate::models::*;

const CURRENT_USER_KEY: &str = "current_user";

fn household_key(user_id: i64) -> String {
    format!("current_household:{user_id}")
}

/// Who is using the program and which household they are looking at.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) user: Profile,
    pub(crate) household: Option<Household>,
}

impl Session {
    pub(crate) fn user_id(&self) -> Result<i64> {
        Ok(self.user.id.ok_or(BudgetError::NotLoggedIn)?)
    }

    pub(crate) fn require_household(&self) -> Result<&Household> {
        Ok(self.household.as_ref().ok_or(BudgetError::NoHousehold)?)
    }

    pub(crate) fn household_id(&self) -> Result<i64> {
        Ok(self.require_household()?.id.ok_or(BudgetError::NoHousehold)?)
    }
}

impl Database {
    /// The stored session, or `None` when nobody has logged in.
    pub(crate) fn current_session(&self) -> Result<Option<Session>> {
        let Some(user_id) = self
            .get_setting(CURRENT_USER_KEY)?
            .and_then(|v| v.parse::<i64>().ok())
        else {
            return Ok(None);
        };
        let Some(user) = self.get_profile_by_id(user_id)? else {
            return Ok(None);
        };

        let households = self.get_households_for_user(user_id)?;
        let selected = self
            .get_setting(&household_key(user_id))?
            .and_then(|v| v.parse::<i64>().ok());
        let household = selected
            .and_then(|id| households.iter().find(|h| h.id == Some(id)).cloned())
            .or_else(|| households.into_iter().next());

        Ok(Some(Session { user, household }))
    }

    pub(crate) fn require_session(&self) -> Result<Session> {
        Ok(self.current_session()?.ok_or(BudgetError::NotLoggedIn)?)
    }

    /// Select `email` as the current user, creating the profile if needed.
    pub(crate) fn login(&self, email: &str, full_name: Option<&str>) -> Result<Session> {
        let profile = self.find_or_create_profile(email, full_name)?;
        let id = profile.id.ok_or(BudgetError::NotLoggedIn)?;
        self.set_setting(CURRENT_USER_KEY, &id.to_string())?;
        info!(user = id, email = %profile.email, "logged in");
        self.require_session()
    }

    pub(crate) fn logout(&self) -> Result<()> {
        self.delete_setting(CURRENT_USER_KEY)
    }

    /// Make `household_id` the user's current household. The user must
    /// belong to it.
    pub(crate) fn set_current_household(&self, user_id: i64, household_id: i64) -> Result<Household> {
        if self.get_membership(household_id, user_id)?.is_none() {
            return Err(BudgetError::NotAMember.into());
        }
        let household = self
            .get_household(household_id)?
            .ok_or(BudgetError::NoHousehold)?;
        self.set_setting(&household_key(user_id), &household_id.to_string())?;
        info!(user = user_id, household = household_id, "household selected");
        Ok(household)
    }

    /// Switch to one of the user's households by name (case-insensitive)
    /// or by invite code.
    pub(crate) fn switch_household(&self, user_id: i64, name_or_code: &str) -> Result<Household> {
        let wanted = name_or_code.trim();
        let household = self
            .get_households_for_user(user_id)?
            .into_iter()
            .find(|h| h.name.eq_ignore_ascii_case(wanted) || h.invite_code.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow::anyhow!("No household named '{wanted}'"))?;
        let id = household.id.ok_or(BudgetError::NoHousehold)?;
        self.set_current_household(user_id, id)
    }

    /// First run: with no profiles at all, create a local user and a "Home"
    /// household so a single person can start tracking right away.
    ///
    /// Returns `None` after a `logout`; the profiles are kept and the user
    /// picks one again with `login`.
    pub(crate) fn ensure_default_session(&mut self, preset: PlanPreset) -> Result<Option<Session>> {
        if self.get_profile_count()? == 0 {
            let user = std::env::var("USER")
                .ok()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| "me".to_string());
            let session = self.login(&format!("{user}@localhost"), None)?;
            let user_id = session.user_id()?;
            let household = self.create_household(user_id, "Home", preset)?;
            if let Some(id) = household.id {
                self.set_current_household(user_id, id)?;
            }
            info!(user = user_id, "created default profile and household");
        }
        self.current_session()
    }
}
