//! Acting users and the capabilities they carry into mutating operations.
//!
//! A [`Capability`] can only be minted through [`Actor::grant_under`], which
//! applies a [`RolePolicy`]. Service methods take `&Capability` and re-check
//! that it covers the permission and the concrete target row.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityKind, Permission, Role};
use crate::errors::CoreError;

/// Authenticated user identity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
        }
    }

    /// Mint a capability under the built-in role policy.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` if the actor's role does not grant
    /// `permission`.
    pub fn grant(&self, permission: Permission, scope: Scope) -> Result<Capability, CoreError> {
        self.grant_under(&RolePolicy::default(), permission, scope)
    }

    /// Mint a capability for `permission` over `scope`, checked against
    /// `policy`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` if `policy` does not grant `permission`
    /// to the actor's role.
    pub fn grant_under(
        &self,
        policy: &RolePolicy,
        permission: Permission,
        scope: Scope,
    ) -> Result<Capability, CoreError> {
        if !policy.allows(self.role, permission) {
            return Err(CoreError::Forbidden {
                actor: self.email.clone(),
                permission: permission.to_string(),
                target: scope.to_string(),
            });
        }
        Ok(Capability {
            actor: self.clone(),
            permission,
            scope,
        })
    }
}

/// Permissions granted to each role. Missing roles fall back to
/// [`Role::permissions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RolePolicy {
    pub admin: Vec<Permission>,
    pub manager: Vec<Permission>,
    pub compliance: Vec<Permission>,
    pub viewer: Vec<Permission>,
}

impl RolePolicy {
    #[must_use]
    pub fn permissions(&self, role: Role) -> &[Permission] {
        match role {
            Role::Admin => &self.admin,
            Role::Manager => &self.manager,
            Role::Compliance => &self.compliance,
            Role::Viewer => &self.viewer,
        }
    }

    #[must_use]
    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.permissions(role).contains(&permission)
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            admin: Role::Admin.permissions().to_vec(),
            manager: Role::Manager.permissions().to_vec(),
            compliance: Role::Compliance.permissions().to_vec(),
            viewer: Role::Viewer.permissions().to_vec(),
        }
    }
}

/// A concrete stored row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn project(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Project, id)
    }

    #[must_use]
    pub fn investor(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Investor, id)
    }

    #[must_use]
    pub fn subscription(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Subscription, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// What a capability applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every row of a kind, including rows that do not exist yet.
    Kind(EntityKind),
    /// Exactly one row.
    Entity(EntityRef),
}

impl Scope {
    #[must_use]
    pub fn covers(&self, target: &EntityRef) -> bool {
        match self {
            Self::Kind(kind) => *kind == target.kind,
            Self::Entity(entity) => entity == target,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => write!(f, "any {kind}"),
            Self::Entity(entity) => entity.fmt(f),
        }
    }
}

/// Proof that an actor may perform one permission over one scope.
#[derive(Debug, Clone)]
pub struct Capability {
    actor: Actor,
    permission: Permission,
    scope: Scope,
}

impl Capability {
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    #[must_use]
    pub const fn permission(&self) -> Permission {
        self.permission
    }

    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Check the capability against an existing row.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` if the permission differs or the scope
    /// does not cover `target`.
    pub fn authorize(&self, permission: Permission, target: &EntityRef) -> Result<(), CoreError> {
        if self.permission == permission && self.scope.covers(target) {
            Ok(())
        } else {
            Err(self.forbidden(permission, target.to_string()))
        }
    }

    /// Check the capability for creating a new row of `kind`. Only
    /// kind-scoped capabilities qualify.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` if the capability is not a kind-wide
    /// grant of `permission` for `kind`.
    pub fn authorize_kind(&self, permission: Permission, kind: EntityKind) -> Result<(), CoreError> {
        if self.permission == permission && self.scope == Scope::Kind(kind) {
            Ok(())
        } else {
            Err(self.forbidden(permission, format!("any {kind}")))
        }
    }

    fn forbidden(&self, permission: Permission, target: String) -> CoreError {
        CoreError::Forbidden {
            actor: self.actor.email.clone(),
            permission: permission.to_string(),
            target,
        }
    }
}
