//! Typed permission keys.
//!
//! Permission names are persisted as `<action>-<resource>` strings. Inside the
//! engine they are built from [`Action`], [`ResourceKind`] and [`ScopeTier`]
//! values and only rendered to the canonical string when compared against a
//! [`PermissionSet`](crate::PermissionSet) loaded from storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Verb half of a permission name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Assign,
    Custom(String),
}

impl Action {
    /// Parse a caller-supplied action name. Case-insensitive; blank input is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_ascii_lowercase();
        let action = match value.as_str() {
            "" => return None,
            "create" => Action::Create,
            "read" => Action::Read,
            "update" => Action::Update,
            "delete" => Action::Delete,
            "assign" => Action::Assign,
            _ => Action::Custom(value),
        };
        Some(action)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Assign => "assign",
            Action::Custom(name) => name,
        }
    }

    pub fn is_assign(&self) -> bool {
        matches!(self, Action::Assign)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of entity an action targets.
///
/// `Custom` keeps the enumeration open: a deployment can register scope
/// providers for kinds this crate does not know about.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ResourceKind {
    User,
    Role,
    Team,
    Project,
    Branch,
    Schedule,
    Shift,
    Contract,
    Custom(String),
}

impl ResourceKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_ascii_lowercase();
        if value.is_empty() {
            return None;
        }
        Some(Self::from(value))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Role => "role",
            ResourceKind::Team => "team",
            ResourceKind::Project => "project",
            ResourceKind::Branch => "branch",
            ResourceKind::Schedule => "schedule",
            ResourceKind::Shift => "shift",
            ResourceKind::Contract => "contract",
            ResourceKind::Custom(name) => name,
        }
    }
}

impl From<String> for ResourceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => ResourceKind::User,
            "role" => ResourceKind::Role,
            "team" => ResourceKind::Team,
            "project" => ResourceKind::Project,
            "branch" => ResourceKind::Branch,
            "schedule" => ResourceKind::Schedule,
            "shift" => ResourceKind::Shift,
            "contract" => ResourceKind::Contract,
            _ => ResourceKind::Custom(value),
        }
    }
}

impl From<ResourceKind> for String {
    fn from(value: ResourceKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a subject relates to the resources a scoped permission covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeTier {
    /// Reached through an organizational management relationship.
    Managed,
    /// Reached through direct identity.
    Own,
}

impl ScopeTier {
    /// Evaluation order for scoped grants: the first tier held wins.
    pub const ORDER: [ScopeTier; 2] = [ScopeTier::Managed, ScopeTier::Own];

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeTier::Managed => "managed",
            ScopeTier::Own => "own",
        }
    }
}

impl fmt::Display for ScopeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a permission: a resource kind, optionally restricted to a scope tier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub tier: Option<ScopeTier>,
    pub kind: ResourceKind,
}

impl Target {
    pub fn unscoped(kind: ResourceKind) -> Self {
        Self { tier: None, kind }
    }

    pub fn scoped(tier: ScopeTier, kind: ResourceKind) -> Self {
        Self {
            tier: Some(tier),
            kind,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tier {
            Some(tier) => write!(f, "{tier}-{}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A permission the engine asks about.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PermissionKey {
    /// `*`
    Wildcard,
    /// `<action>-self`
    OnSelf(Action),
    /// `<action>-<target>` or, for dual-resource actions, the unscoped pair
    /// `<action>-<resource>-<resource2>`.
    Grant {
        action: Action,
        target: Target,
        second: Option<ResourceKind>,
    },
}

impl PermissionKey {
    pub fn on_self(action: &Action) -> Self {
        PermissionKey::OnSelf(action.clone())
    }

    pub fn unscoped(action: &Action, kind: &ResourceKind) -> Self {
        PermissionKey::Grant {
            action: action.clone(),
            target: Target::unscoped(kind.clone()),
            second: None,
        }
    }

    pub fn scoped(action: &Action, tier: ScopeTier, kind: &ResourceKind) -> Self {
        PermissionKey::Grant {
            action: action.clone(),
            target: Target::scoped(tier, kind.clone()),
            second: None,
        }
    }

    pub fn pair(action: &Action, kind: &ResourceKind, second: &ResourceKind) -> Self {
        PermissionKey::Grant {
            action: action.clone(),
            target: Target::unscoped(kind.clone()),
            second: Some(second.clone()),
        }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKey::Wildcard => f.write_str("*"),
            PermissionKey::OnSelf(action) => write!(f, "{action}-self"),
            PermissionKey::Grant {
                action,
                target,
                second: None,
            } => write!(f, "{action}-{target}"),
            PermissionKey::Grant {
                action,
                target,
                second: Some(second),
            } => write!(f, "{action}-{target}-{second}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Action::parse("UPDATE"), Some(Action::Update));
        assert_eq!(Action::parse(" Publish "), Some(Action::Custom("publish".into())));
        assert_eq!(Action::parse("  "), None);
        assert_eq!(ResourceKind::parse("Shift"), Some(ResourceKind::Shift));
        assert_eq!(
            ResourceKind::parse("department"),
            Some(ResourceKind::Custom("department".into()))
        );
    }

    #[test]
    fn renders_canonical_names() {
        let user = ResourceKind::User;
        let role = ResourceKind::Role;
        assert_eq!(PermissionKey::Wildcard.to_string(), "*");
        assert_eq!(PermissionKey::on_self(&Action::Update).to_string(), "update-self");
        assert_eq!(PermissionKey::unscoped(&Action::Read, &user).to_string(), "read-user");
        assert_eq!(
            PermissionKey::scoped(&Action::Read, ScopeTier::Managed, &ResourceKind::Shift)
                .to_string(),
            "read-managed-shift"
        );
        assert_eq!(
            PermissionKey::pair(&Action::Assign, &user, &role).to_string(),
            "assign-user-role"
        );
        assert_eq!(
            PermissionKey::scoped(&Action::Assign, ScopeTier::Own, &role).to_string(),
            "assign-own-role"
        );
    }
}
