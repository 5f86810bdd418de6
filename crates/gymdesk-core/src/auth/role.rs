use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform roles, least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Member,
    Trainer,
    Staff,
    Admin,
    SystemAdmin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SystemAdmin,
        Role::Admin,
        Role::Staff,
        Role::Trainer,
        Role::Member,
    ];

    /// Upper-snake form used in tokens
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "SYSTEM_ADMIN",
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::Trainer => "TRAINER",
            Role::Member => "MEMBER",
        }
    }

    /// Highest-privileged role among the parseable names; unknown names are skipped
    pub fn highest<'a, I>(names: I) -> Option<Role>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().filter_map(|n| n.parse().ok()).max()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::SystemAdmin => "System Admin",
            Role::Admin => "Admin",
            Role::Staff => "Staff",
            Role::Trainer => "Trainer",
            Role::Member => "Member",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let normalized = normalized.strip_prefix("role").unwrap_or(normalized.as_str());
        match normalized {
            "systemadmin" | "superadmin" => Ok(Role::SystemAdmin),
            "admin" | "gymadmin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "trainer" => Ok(Role::Trainer),
            "member" => Ok(Role::Member),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
