use regex::Regex;
use std::sync::LazyLock;

pub const INVITE_CODE_LEN: usize = 6;

/// Invite code alphabet; drops I, O, 0 and 1 so codes read back unambiguously.
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

static INVITE_CODE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6}$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "owner" => Self::Owner,
            "admin" => Self::Admin,
            _ => Self::Member,
        }
    }

    /// Owners and admins may remove other members.
    pub fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Option<i64>,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: String,
}

impl Profile {
    pub fn new(email: &str, full_name: Option<&str>) -> Self {
        Self {
            id: None,
            email: email.trim().to_lowercase(),
            full_name: full_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone)]
pub struct Household {
    pub id: Option<i64>,
    pub name: String,
    pub invite_code: String,
    pub created_by: i64,
    pub created_at: String,
}

impl Household {
    pub fn new(name: &str, created_by: i64) -> Self {
        Self {
            id: None,
            name: name.trim().to_string(),
            invite_code: generate_invite_code(),
            created_by,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl std::fmt::Display for Household {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A user's membership in a household, joined with their profile.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: i64,
    pub household_id: i64,
    pub user_id: i64,
    pub role: Role,
    pub joined_at: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl Member {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }

    /// Whether `self` is allowed to remove `target` from the household.
    pub fn can_remove(&self, target: &Member) -> bool {
        self.role.can_manage_members()
            && self.household_id == target.household_id
            && self.user_id != target.user_id
            && target.role != Role::Owner
    }
}

pub fn generate_invite_code() -> String {
    uuid::Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(INVITE_CODE_LEN)
        .map(|b| INVITE_ALPHABET[*b as usize % INVITE_ALPHABET.len()] as char)
        .collect()
}

/// Canonical form of a user-typed invite code, or `None` if it can't be one.
pub fn normalize_invite_code(input: &str) -> Option<String> {
    let code = input.trim().to_uppercase();
    INVITE_CODE_RE
        .as_ref()
        .is_some_and(|re| re.is_match(&code))
        .then_some(code)
}
