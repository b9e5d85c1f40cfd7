use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role identifier used for hierarchy checks.
///
/// Roles are opaque strings at this layer; their rank comes from a
/// [`RoleHierarchy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const GUEST: Role = Role(Cow::Borrowed("guest"));
    pub const USER: Role = Role(Cow::Borrowed("user"));
    pub const MODERATOR: Role = Role(Cow::Borrowed("moderator"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == Self::ADMIN.as_str()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Level reported for role names the hierarchy does not know.
pub const UNKNOWN_LEVEL: i32 = -1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("invalid role level entry '{0}' (expected name:level)")]
    InvalidEntry(String),
}

/// Ordered role table: name → level, higher is more privileged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    levels: Vec<(Role, i32)>,
}

impl Default for RoleHierarchy {
    /// guest < user < moderator < admin
    fn default() -> Self {
        Self {
            levels: vec![
                (Role::GUEST, 0),
                (Role::USER, 1),
                (Role::MODERATOR, 2),
                (Role::ADMIN, 3),
            ],
        }
    }
}

impl RoleHierarchy {
    /// Add a role, or move an existing one to a new level.
    pub fn with_role(mut self, role: Role, level: i32) -> Self {
        match self.levels.iter_mut().find(|(r, _)| *r == role) {
            Some(entry) => entry.1 = level,
            None => self.levels.push((role, level)),
        }
        self
    }

    /// Extend the hierarchy from a `name:level[,name:level...]` list.
    pub fn with_levels(mut self, levels: &str) -> Result<Self, HierarchyError> {
        for (role, level) in parse_levels(levels)? {
            self = self.with_role(role, level);
        }
        Ok(self)
    }

    pub fn level_of(&self, role: &str) -> i32 {
        self.levels
            .iter()
            .find(|(r, _)| r.as_str() == role)
            .map(|(_, level)| *level)
            .unwrap_or(UNKNOWN_LEVEL)
    }

    /// `"guest: 0, user: 1, ..."` in ascending level order.
    pub fn describe(&self) -> String {
        let mut sorted: Vec<&(Role, i32)> = self.levels.iter().collect();
        sorted.sort_by_key(|(_, level)| *level);
        sorted
            .iter()
            .map(|(role, level)| format!("{role}: {level}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse `name:level` pairs separated by commas. Blank input yields nothing.
pub fn parse_levels(levels: &str) -> Result<Vec<(Role, i32)>, HierarchyError> {
    levels
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, level) = entry
                .split_once(':')
                .ok_or_else(|| HierarchyError::InvalidEntry(entry.to_string()))?;
            let name = name.trim();
            let level = level
                .trim()
                .parse::<i32>()
                .map_err(|_| HierarchyError::InvalidEntry(entry.to_string()))?;
            if name.is_empty() {
                return Err(HierarchyError::InvalidEntry(entry.to_string()));
            }
            Ok((Role::new(name.to_string()), level))
        })
        .collect()
}
