//! Access decisions for suite resources.
//!
//! A decision combines the subject's permission names (direct grants and role
//! grants) with scopes derived from the organizational hierarchy: a manager
//! may act on the users reachable through direct reports or through the
//! teams, projects and branches they manage. Bulk requests get a partial
//! result listing which IDs are allowed and which are not.
//!
//! ```ignore
//! let engine = AccessDecisionEngine::from_config(permissions, hierarchy, &AuthzConfig::from_env()?);
//! let decision = engine
//!     .check_access(&AccessRequest::new(subject, "update", "user").ids([100013, 100099]))
//!     .await?;
//! ```

use std::collections::BTreeSet;

pub mod catalog;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod escalation;
pub mod hierarchy;
pub mod key;
pub mod scope;

#[cfg(test)]
mod fixtures;

/// Numeric identifier of any persisted resource.
pub type Id = i64;
/// Identifier of the acting user.
pub type SubjectId = Id;
/// Ordered so decisions are deterministic.
pub type IdSet = BTreeSet<Id>;

pub use catalog::{PermissionCatalog, PermissionRepository, PermissionSet};
pub use config::{AuthzConfig, ConfigError};
pub use decision::{AccessDecision, Partition};
pub use engine::{AccessDecisionEngine, AccessRequest};
pub use error::{AuthzError, AuthzResult, LookupError, ScopeError};
pub use escalation::{EscalationRule, RoleEscalationTable, RoleTier};
pub use hierarchy::{HierarchyRepository, ReportDepth, TeamTier};
pub use key::{Action, PermissionKey, ResourceKind, ScopeTier, Target};
pub use scope::{ScopeProvider, ScopeResolver, ScopeResolverBuilder};
