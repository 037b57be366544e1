//! Effective permission sets: direct grants unioned with role grants.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LookupError;
use crate::key::{Action, PermissionKey, ResourceKind};
use crate::{Id, SubjectId};

/// Read-only access to persisted permissions and role assignments.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn get_user_permissions(&self, subject: SubjectId) -> Result<Vec<String>, LookupError>;

    async fn get_user_roles(&self, subject: SubjectId) -> Result<Vec<Id>, LookupError>;

    async fn get_role_permissions(&self, role_ids: &[Id]) -> Result<Vec<String>, LookupError>;
}

/// The permission names a subject holds. Membership is all that matters;
/// stored names are matched exactly as persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    names: HashSet<String>,
}

impl PermissionSet {
    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.names.contains(&key.to_string())
    }

    /// Exact match on the canonical `<action>-<resource>[-<resource2>]` name.
    pub fn has_permission(
        &self,
        action: &Action,
        resource: &ResourceKind,
        resource2: Option<&ResourceKind>,
    ) -> bool {
        let key = match resource2 {
            Some(second) => PermissionKey::pair(action, resource, second),
            None => PermissionKey::unscoped(action, resource),
        };
        self.contains(&key)
    }

    pub fn is_wildcard(&self) -> bool {
        self.contains(&PermissionKey::Wildcard)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone)]
pub struct PermissionCatalog {
    repo: Arc<dyn PermissionRepository>,
}

impl PermissionCatalog {
    pub fn new(repo: Arc<dyn PermissionRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn PermissionRepository> {
        &self.repo
    }

    /// Direct grants and role grants are fetched concurrently. A failing
    /// lookup is returned as-is rather than degrading to an empty set.
    pub async fn effective_permissions(
        &self,
        subject: SubjectId,
    ) -> Result<PermissionSet, LookupError> {
        let via_roles = async {
            let roles = self.repo.get_user_roles(subject).await?;
            if roles.is_empty() {
                return Ok::<_, LookupError>(Vec::new());
            }
            self.repo.get_role_permissions(&roles).await
        };
        let (direct, inherited) =
            tokio::try_join!(self.repo.get_user_permissions(subject), via_roles)?;
        Ok(direct.into_iter().chain(inherited).collect())
    }
}
