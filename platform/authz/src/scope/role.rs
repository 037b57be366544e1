use std::sync::Arc;

use async_trait::async_trait;

use super::{ScopeProvider, ScopeResolver};
use crate::escalation::RoleEscalationTable;
use crate::error::ScopeError;
use crate::{IdSet, SubjectId};

/// Roles made visible by the escalation table for the roles the subject holds.
///
/// Fetches the subject's roles itself rather than reusing the permission
/// fetch; providers read fresh data and share nothing across lookups.
pub struct ManagedRoles {
    table: Arc<RoleEscalationTable>,
}

impl ManagedRoles {
    pub fn new(table: Arc<RoleEscalationTable>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl ScopeProvider for ManagedRoles {
    fn channel(&self) -> &'static str {
        "role-escalation"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let held = scopes.permissions().get_user_roles(subject).await?;
        Ok(self.table.visible_roles(&held))
    }
}

/// Roles assigned to the subject.
pub struct OwnRoles;

#[async_trait]
impl ScopeProvider for OwnRoles {
    fn channel(&self) -> &'static str {
        "own-roles"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let roles = scopes.permissions().get_user_roles(subject).await?;
        Ok(roles.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthzConfig;
    use crate::fixtures::FakeDirectory;
    use crate::key::ResourceKind;

    #[tokio::test]
    async fn managed_roles_come_from_the_escalation_table() {
        let dir = Arc::new(FakeDirectory::default().assign_role(9, 4));
        let scopes = ScopeResolver::standard(dir.clone(), dir, &AuthzConfig::default());

        let roles = scopes.managed_ids(9, &ResourceKind::Role).await.unwrap();
        assert_eq!(roles, IdSet::from([1, 2, 3]));
    }
}
