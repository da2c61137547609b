use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use tracing::{info, warn};

use super::Database;
use crate::error::BudgetError;
use crate::models::*;

/// Attempts at drawing an unused invite code before giving up.
const INVITE_CODE_ATTEMPTS: usize = 8;

const MEMBER_SELECT: &str = "SELECT m.id, m.household_id, m.user_id, m.role, m.joined_at, p.email, p.full_name
     FROM household_members m
     JOIN profiles p ON p.id = m.user_id";

fn household_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Household> {
    Ok(Household {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        invite_code: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn member_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        household_id: row.get(1)?,
        user_id: row.get(2)?,
        role: Role::parse(&row.get::<_, String>(3)?),
        joined_at: row.get(4)?,
        email: row.get(5)?,
        full_name: row.get(6)?,
    })
}

fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: Some(row.get(0)?),
        email: row.get(1)?,
        full_name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Database {
    // ── Profiles ──────────────────────────────────────────────

    pub(crate) fn insert_profile(&self, profile: &Profile) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO profiles (email, full_name, created_at) VALUES (?1, ?2, ?3)",
            params![profile.email, profile.full_name, profile.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_profile_by_id(&self, id: i64) -> Result<Option<Profile>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, full_name, created_at FROM profiles WHERE id = ?1",
                params![id],
                profile_from_row,
            )
            .optional()?)
    }

    pub(crate) fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, full_name, created_at FROM profiles WHERE email = ?1",
                params![email.trim().to_lowercase()],
                profile_from_row,
            )
            .optional()?)
    }

    pub(crate) fn get_profile_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?)
    }

    /// Look up a profile by email, creating it if missing. A non-empty
    /// `full_name` replaces the stored one.
    pub(crate) fn find_or_create_profile(&self, email: &str, full_name: Option<&str>) -> Result<Profile> {
        let wanted = Profile::new(email, full_name);
        if wanted.email.is_empty() || !wanted.email.contains('@') {
            anyhow::bail!("Invalid email address: '{}'", email.trim());
        }

        if let Some(mut existing) = self.get_profile_by_email(&wanted.email)? {
            if wanted.full_name.is_some() && wanted.full_name != existing.full_name {
                self.conn.execute(
                    "UPDATE profiles SET full_name = ?1 WHERE email = ?2",
                    params![wanted.full_name, wanted.email],
                )?;
                existing.full_name = wanted.full_name;
            }
            return Ok(existing);
        }

        let id = self.insert_profile(&wanted)?;
        info!(id, email = %wanted.email, "profile created");
        Ok(Profile {
            id: Some(id),
            ..wanted
        })
    }

    // ── Households ────────────────────────────────────────────

    /// Create a household owned by `user_id`, seeded with `preset`'s plan.
    pub(crate) fn create_household(&mut self, user_id: i64, name: &str, preset: PlanPreset) -> Result<Household> {
        if name.trim().is_empty() {
            anyhow::bail!("Household name cannot be empty");
        }

        let tx = self.conn.transaction()?;
        let mut household = Household::new(name, user_id);
        let mut attempts = 0;
        loop {
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM households WHERE invite_code = ?1)",
                params![household.invite_code],
                |row| row.get(0),
            )?;
            if !taken {
                break;
            }
            attempts += 1;
            if attempts >= INVITE_CODE_ATTEMPTS {
                anyhow::bail!("Could not generate a unique invite code");
            }
            warn!(code = %household.invite_code, "invite code collision, retrying");
            household.invite_code = generate_invite_code();
        }

        tx.execute(
            "INSERT INTO households (name, invite_code, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                household.name,
                household.invite_code,
                household.created_by,
                household.created_at,
            ],
        )?;
        let household_id = tx.last_insert_rowid();
        household.id = Some(household_id);

        tx.execute(
            "INSERT INTO household_members (household_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
            params![household_id, user_id, Role::Owner.as_str(), household.created_at],
        )?;

        for (position, cat) in preset.plan().categories.iter().enumerate() {
            tx.execute(
                "INSERT INTO plan_categories (household_id, position, key, label, percentage)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![household_id, position as i64, cat.key, cat.label, cat.percentage],
            )?;
        }
        tx.commit()?;

        info!(id = household_id, name = %household.name, owner = user_id, plan = %preset, "household created");
        Ok(household)
    }

    pub(crate) fn get_household(&self, id: i64) -> Result<Option<Household>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, invite_code, created_by, created_at FROM households WHERE id = ?1",
                params![id],
                household_from_row,
            )
            .optional()?)
    }

    pub(crate) fn find_household_by_code(&self, code: &str) -> Result<Option<Household>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, invite_code, created_by, created_at FROM households WHERE invite_code = ?1",
                params![code],
                household_from_row,
            )
            .optional()?)
    }

    pub(crate) fn get_households_for_user(&self, user_id: i64) -> Result<Vec<Household>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.id, h.name, h.invite_code, h.created_by, h.created_at
             FROM households h
             JOIN household_members m ON m.household_id = h.id
             WHERE m.user_id = ?1
             ORDER BY h.name, h.id",
        )?;
        let rows = stmt.query_map(params![user_id], household_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Join the household behind `code` as a plain member.
    pub(crate) fn join_household(&self, user_id: i64, code: &str) -> Result<Household> {
        let code = normalize_invite_code(code).ok_or(BudgetError::InvalidInviteCode)?;
        let household = self
            .find_household_by_code(&code)?
            .ok_or(BudgetError::InvalidInviteCode)?;
        let household_id = household.id.ok_or(BudgetError::InvalidInviteCode)?;

        if self.get_membership(household_id, user_id)?.is_some() {
            return Err(BudgetError::AlreadyMember.into());
        }

        self.conn.execute(
            "INSERT INTO household_members (household_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                household_id,
                user_id,
                Role::Member.as_str(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        info!(household = household_id, user = user_id, "joined household");
        Ok(household)
    }

    // ── Members ───────────────────────────────────────────────

    /// Members of a household in the order they joined.
    pub(crate) fn get_members(&self, household_id: i64) -> Result<Vec<Member>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT} WHERE m.household_id = ?1 ORDER BY m.joined_at, m.id"
        ))?;
        let rows = stmt.query_map(params![household_id], member_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_member(&self, member_id: i64) -> Result<Option<Member>> {
        Ok(self
            .conn
            .query_row(
                &format!("{MEMBER_SELECT} WHERE m.id = ?1"),
                params![member_id],
                member_from_row,
            )
            .optional()?)
    }

    pub(crate) fn get_membership(&self, household_id: i64, user_id: i64) -> Result<Option<Member>> {
        Ok(self
            .conn
            .query_row(
                &format!("{MEMBER_SELECT} WHERE m.household_id = ?1 AND m.user_id = ?2"),
                params![household_id, user_id],
                member_from_row,
            )
            .optional()?)
    }

    /// Remove `member_id` on behalf of `actor_user_id`. Owners and admins may
    /// remove anyone except the owner and themselves.
    pub(crate) fn remove_member(&self, actor_user_id: i64, member_id: i64) -> Result<Member> {
        let target = self
            .get_member(member_id)?
            .ok_or(BudgetError::MemberNotFound(member_id))?;
        let actor = self
            .get_membership(target.household_id, actor_user_id)?
            .ok_or(BudgetError::NotAMember)?;

        if !actor.role.can_manage_members() {
            return Err(BudgetError::PermissionDenied("owners and admins").into());
        }
        if target.user_id == actor.user_id {
            return Err(BudgetError::CannotRemoveSelf.into());
        }
        if target.role == Role::Owner {
            return Err(BudgetError::CannotRemoveOwner.into());
        }
        debug_assert!(actor.can_remove(&target));

        self.conn.execute(
            "DELETE FROM household_members WHERE id = ?1",
            params![member_id],
        )?;
        info!(
            household = target.household_id,
            member = member_id,
            by = actor_user_id,
            "member removed"
        );
        Ok(target)
    }

    /// Promote or demote a member. Only the owner may do this, and ownership
    /// itself can't be handed out.
    pub(crate) fn set_member_role(&self, actor_user_id: i64, member_id: i64, role: Role) -> Result<Member> {
        let target = self
            .get_member(member_id)?
            .ok_or(BudgetError::MemberNotFound(member_id))?;
        let actor = self
            .get_membership(target.household_id, actor_user_id)?
            .ok_or(BudgetError::NotAMember)?;

        if actor.role != Role::Owner {
            return Err(BudgetError::PermissionDenied("the owner").into());
        }
        if target.role == Role::Owner || role == Role::Owner {
            return Err(BudgetError::OwnerRoleFixed.into());
        }

        self.conn.execute(
            "UPDATE household_members SET role = ?1 WHERE id = ?2",
            params![role.as_str(), member_id],
        )?;
        info!(member = member_id, role = %role, "member role changed");
        Ok(Member { role, ..target })
    }

    // ── Plan ──────────────────────────────────────────────────

    /// The household's category table; the classic preset if none is stored.
    pub(crate) fn get_plan(&self, household_id: i64) -> Result<BudgetPlan> {
        let mut stmt = self.conn.prepare(
            "SELECT key, label, percentage FROM plan_categories
             WHERE household_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![household_id], |row| {
            Ok(BudgetCategory {
                key: row.get(0)?,
                label: row.get(1)?,
                percentage: row.get(2)?,
            })
        })?;
        let categories = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        if categories.is_empty() {
            return Ok(BudgetPlan::default());
        }
        Ok(BudgetPlan { categories })
    }

    /// Owners and admins may change the plan; plain members may not.
    fn require_plan_manager(&self, actor_user_id: i64, household_id: i64) -> Result<()> {
        let actor = self
            .get_membership(household_id, actor_user_id)?
            .ok_or(BudgetError::NotAMember)?;
        if !actor.role.can_manage_members() {
            return Err(BudgetError::PermissionDenied("owners and admins").into());
        }
        Ok(())
    }

    /// Expenses filed under categories `plan` doesn't have. They stay
    /// stored but drop out of the snapshot until a plan with their
    /// category is restored.
    pub(crate) fn orphaned_expense_count(&self, household_id: i64, plan: &BudgetPlan) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) FROM expenses WHERE household_id = ?1 GROUP BY category",
        )?;
        let rows = stmt.query_map(params![household_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut orphaned = 0;
        for row in rows {
            let (category, count) = row?;
            if !plan.contains(&category) {
                orphaned += count as usize;
            }
        }
        Ok(orphaned)
    }

    /// Replace the household's plan on behalf of `actor_user_id`.
    ///
    /// Returns how many stored expenses the new plan leaves uncounted.
    pub(crate) fn save_plan(&mut self, actor_user_id: i64, household_id: i64, plan: &BudgetPlan) -> Result<usize> {
        plan.validate()?;
        self.require_plan_manager(actor_user_id, household_id)?;
        self.write_plan(household_id, plan)?;
        let orphaned = self.orphaned_expense_count(household_id, plan)?;
        if orphaned > 0 {
            warn!(household = household_id, orphaned, "plan leaves expenses uncategorised");
        }
        Ok(orphaned)
    }

    fn write_plan(&mut self, household_id: i64, plan: &BudgetPlan) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM plan_categories WHERE household_id = ?1",
            params![household_id],
        )?;
        for (position, cat) in plan.categories.iter().enumerate() {
            tx.execute(
                "INSERT INTO plan_categories (household_id, position, key, label, percentage)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![household_id, position as i64, cat.key, cat.label, cat.percentage],
            )?;
        }
        tx.commit()?;
        info!(household = household_id, categories = ?plan.keys(), "plan saved");
        Ok(())
    }

    pub(crate) fn relabel_category(
        &mut self,
        actor_user_id: i64,
        household_id: i64,
        key: &str,
        label: &str,
    ) -> Result<BudgetPlan> {
        self.require_plan_manager(actor_user_id, household_id)?;
        let mut plan = self.get_plan(household_id)?;
        plan.relabel(key, label)?;
        self.write_plan(household_id, &plan)?;
        Ok(plan)
    }
}
