use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use warden_core::UserId;

use crate::{Resource, Role, RoleHierarchy, User, UserLookup};

/// Role-hierarchy and ownership checks against the external user directory.
///
/// Every method is fail-closed: a missing user or a failing lookup
/// resolves to "deny". Nothing here returns an error. Only the role checks
/// look at `active`; ownership checks do not.
pub struct RoleAuthorizer {
    lookup: Arc<dyn UserLookup>,
    hierarchy: RoleHierarchy,
}

impl RoleAuthorizer {
    pub fn new(lookup: Arc<dyn UserLookup>) -> Self {
        Self::with_hierarchy(lookup, RoleHierarchy::default())
    }

    pub fn with_hierarchy(lookup: Arc<dyn UserLookup>, hierarchy: RoleHierarchy) -> Self {
        Self { lookup, hierarchy }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn level_of(&self, role: &str) -> i32 {
        self.hierarchy.level_of(role)
    }

    pub fn describe_hierarchy(&self) -> String {
        self.hierarchy.describe()
    }

    /// Whether the user's role ranks at least as high as `required`.
    ///
    /// Unknown roles rank at -1 on both sides of the comparison: a user with
    /// an unknown role ties with an unknown requirement and is granted.
    pub async fn has_permission(&self, user_id: &UserId, required: &Role) -> bool {
        self.explain_permission(user_id, required).await.granted
    }

    /// Admins own everything; everyone else only what carries their id.
    pub async fn enforce_ownership(&self, user_id: &UserId, resource_owner_id: &UserId) -> bool {
        let Some(user) = self.user(user_id).await else {
            return false;
        };
        if user.role.is_admin() {
            return true;
        }
        user.id.loosely_eq(resource_owner_id)
    }

    /// Like [`Self::enforce_ownership`], but a locked resource is off-limits
    /// to non-admins, owner included.
    pub async fn can_modify(&self, user_id: &UserId, resource: &Resource) -> bool {
        let Some(user) = self.user(user_id).await else {
            return false;
        };
        if user.role.is_admin() {
            return true;
        }
        if resource.locked {
            return false;
        }
        user.id.loosely_eq(&resource.owner_id)
    }

    /// [`Self::can_modify`] for each resource, concurrently.
    ///
    /// The result has the same length and order as `resources`.
    pub async fn bulk_check(&self, user_id: &UserId, resources: &[Resource]) -> Vec<bool> {
        join_all(resources.iter().map(|r| self.can_modify(user_id, r))).await
    }

    /// Explain a permission decision (audit trail).
    pub async fn explain_permission(
        &self,
        user_id: &UserId,
        required: &Role,
    ) -> PermissionExplanation {
        let required_level = self.level_of(required.as_str());
        let mut explanation = PermissionExplanation {
            user_id: user_id.clone(),
            required_role: required.clone(),
            required_level,
            user_role: None,
            user_level: None,
            granted: false,
            reason: String::new(),
            denial: None,
        };

        let Some(user) = self.user(user_id).await else {
            explanation.reason = format!("user {user_id} not found");
            explanation.denial = Some(DenialKind::UserMissing);
            return explanation;
        };

        let user_level = self.level_of(user.role.as_str());
        explanation.user_role = Some(user.role.clone());
        explanation.user_level = Some(user_level);

        if !user.active {
            explanation.reason = format!("user {user_id} is inactive");
            explanation.denial = Some(DenialKind::UserInactive);
        } else if user_level >= required_level {
            explanation.granted = true;
            explanation.reason = format!(
                "role '{}' (level {user_level}) meets '{required}' (level {required_level})",
                user.role
            );
        } else {
            explanation.reason = format!(
                "role '{}' (level {user_level}) is below '{required}' (level {required_level})",
                user.role
            );
            explanation.denial = Some(DenialKind::InsufficientLevel);
        }

        explanation
    }

    async fn user(&self, user_id: &UserId) -> Option<User> {
        match self.lookup.find_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(%user_id, error = %e, "user lookup failed; denying");
                None
            }
        }
    }
}

/// Detailed outcome of a permission check.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionExplanation {
    pub user_id: UserId,
    pub required_role: Role,
    pub required_level: i32,
    pub user_role: Option<Role>,
    pub user_level: Option<i32>,
    pub granted: bool,
    pub reason: String,
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    UserMissing,
    UserInactive,
    InsufficientLevel,
}
