//! Staff members and their roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque staff identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, enough to tell a small roster apart.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<&str> for StaffId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StaffId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff role. Each role gets its own break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pharmacist,
    Clerk,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Pharmacist, Role::Clerk];

    /// Get the stored name for the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pharmacist => "pharmacist",
            Role::Clerk => "clerk",
        }
    }

    /// Get the display label for the role.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Pharmacist => "Pharmacists",
            Role::Clerk => "Clerks",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role text did not name a known role.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role '{0}', expected 'pharmacist' or 'clerk'")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pharmacist" => Ok(Role::Pharmacist),
            "clerk" => Ok(Role::Clerk),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub role: Role,
}

/// Present and total counts for one role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCount {
    pub present: usize,
    pub total: usize,
}

impl fmt::Display for RoleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.present, self.total)
    }
}

/// Presence counts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceSummary {
    pub pharmacists: RoleCount,
    pub clerks: RoleCount,
}

impl PresenceSummary {
    pub fn for_role(&self, role: Role) -> RoleCount {
        match role {
            Role::Pharmacist => self.pharmacists,
            Role::Clerk => self.clerks,
        }
    }

    pub fn present(&self) -> usize {
        self.pharmacists.present + self.clerks.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("pharmacist".parse::<Role>().unwrap(), Role::Pharmacist);
        assert_eq!(" Clerk ".parse::<Role>().unwrap(), Role::Clerk);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Pharmacist).unwrap();
        assert_eq!(json, "\"pharmacist\"");
    }

    #[test]
    fn test_staff_member_layout() {
        let json = r#"{"id":"lq2x9abcde","name":"Sato","role":"clerk"}"#;
        let member: StaffMember = serde_json::from_str(json).unwrap();
        assert_eq!(member.id.as_str(), "lq2x9abcde");
        assert_eq!(member.role, Role::Clerk);
        assert_eq!(serde_json::to_string(&member).unwrap(), json);
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = StaffId::generate();
        let b = StaffId::generate();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn test_short_id_of_short_value() {
        assert_eq!(StaffId::from("abc").short(), "abc");
    }

    #[test]
    fn test_role_count_display() {
        let count = RoleCount { present: 2, total: 5 };
        assert_eq!(count.to_string(), "2/5");
    }
}
