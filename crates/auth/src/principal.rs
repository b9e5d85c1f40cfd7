use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::UserId;

use crate::Role;

fn default_active() -> bool {
    true
}

/// A user as reported by the external user directory (read-only here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Something a user may want to modify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "ownerId", alias = "owner_id")]
    pub owner_id: UserId,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("user lookup unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the user directory.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, LookupError>;
}
