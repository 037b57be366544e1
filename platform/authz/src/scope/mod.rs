//! Managed and own scopes.
//!
//! A scope is the set of IDs of one resource kind a subject may act on. Each
//! `(tier, kind)` pair is served by one or more [`ScopeProvider`]s; when several
//! are registered (the four user channels, for instance) they run concurrently
//! and their results are unioned.

mod org;
mod role;
mod user;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, try_join_all};
use tracing::{debug, warn};

use crate::catalog::PermissionRepository;
use crate::config::AuthzConfig;
use crate::error::ScopeError;
use crate::hierarchy::HierarchyRepository;
use crate::key::{ResourceKind, ScopeTier};
use crate::{IdSet, SubjectId};

pub use org::{AuthoredSchedules, ManagedBranches, ManagedProjects, ManagedShifts, ManagedTeams, OwnShifts};
pub use role::{ManagedRoles, OwnRoles};
pub use user::{BranchManagement, DirectReports, OwnUser, ProjectManagement, TeamManagement};

/// One channel contributing IDs to a scope.
#[async_trait]
pub trait ScopeProvider: Send + Sync {
    /// Short name used in diagnostics.
    fn channel(&self) -> &'static str;

    async fn resolve(&self, subject: SubjectId, scopes: &ScopeResolver)
    -> Result<IdSet, ScopeError>;
}

type ProviderKey = (ScopeTier, ResourceKind);

/// Registry of scope providers keyed by tier and resource kind.
pub struct ScopeResolver {
    permissions: Arc<dyn PermissionRepository>,
    hierarchy: Arc<dyn HierarchyRepository>,
    providers: HashMap<ProviderKey, Vec<Arc<dyn ScopeProvider>>>,
}

impl ScopeResolver {
    pub fn builder(
        permissions: Arc<dyn PermissionRepository>,
        hierarchy: Arc<dyn HierarchyRepository>,
    ) -> ScopeResolverBuilder {
        ScopeResolverBuilder {
            resolver: ScopeResolver {
                permissions,
                hierarchy,
                providers: HashMap::new(),
            },
        }
    }

    /// Resolver with every built-in channel registered. `contract` and custom
    /// kinds have no provider until one is registered.
    pub fn standard(
        permissions: Arc<dyn PermissionRepository>,
        hierarchy: Arc<dyn HierarchyRepository>,
        config: &AuthzConfig,
    ) -> Self {
        Self::standard_builder(permissions, hierarchy, config).build()
    }

    /// Builder pre-loaded with the built-in channels, for adding more.
    pub fn standard_builder(
        permissions: Arc<dyn PermissionRepository>,
        hierarchy: Arc<dyn HierarchyRepository>,
        config: &AuthzConfig,
    ) -> ScopeResolverBuilder {
        use ResourceKind as Kind;
        use ScopeTier::{Managed, Own};

        Self::builder(permissions, hierarchy)
            .register(Managed, Kind::User, DirectReports::new(config.report_depth))
            .register(Managed, Kind::User, TeamManagement)
            .register(Managed, Kind::User, ProjectManagement)
            .register(Managed, Kind::User, BranchManagement)
            .register(Own, Kind::User, OwnUser)
            .register(
                Managed,
                Kind::Role,
                ManagedRoles::new(Arc::new(config.role_escalation.clone())),
            )
            .register(Own, Kind::Role, OwnRoles)
            .register(Managed, Kind::Team, ManagedTeams)
            .register(Managed, Kind::Project, ManagedProjects)
            .register(Managed, Kind::Branch, ManagedBranches)
            .register(Managed, Kind::Schedule, AuthoredSchedules)
            .register(Managed, Kind::Shift, ManagedShifts)
            .register(Own, Kind::Shift, OwnShifts)
    }

    pub fn permissions(&self) -> &dyn PermissionRepository {
        self.permissions.as_ref()
    }

    pub fn hierarchy(&self) -> &dyn HierarchyRepository {
        self.hierarchy.as_ref()
    }

    pub fn has_provider(&self, tier: ScopeTier, kind: &ResourceKind) -> bool {
        self.providers.contains_key(&(tier, kind.clone()))
    }

    pub async fn managed_ids(
        &self,
        subject: SubjectId,
        kind: &ResourceKind,
    ) -> Result<IdSet, ScopeError> {
        self.resolve(subject, ScopeTier::Managed, kind).await
    }

    pub async fn own_ids(&self, subject: SubjectId, kind: &ResourceKind) -> Result<IdSet, ScopeError> {
        self.resolve(subject, ScopeTier::Own, kind).await
    }

    /// Union of every provider registered for `(tier, kind)`.
    ///
    /// Boxed because providers may resolve other scopes through `self`.
    pub fn resolve<'a>(
        &'a self,
        subject: SubjectId,
        tier: ScopeTier,
        kind: &'a ResourceKind,
    ) -> BoxFuture<'a, Result<IdSet, ScopeError>> {
        async move {
            let Some(providers) = self.providers.get(&(tier, kind.clone())) else {
                return Err(ScopeError::Unregistered {
                    tier,
                    resource: kind.clone(),
                });
            };
            let channels = try_join_all(providers.iter().map(|provider| async move {
                provider.resolve(subject, self).await.inspect_err(|err| {
                    warn!(channel = provider.channel(), subject, error = %err, "scope channel failed");
                })
            }))
            .await?;
            let ids: IdSet = channels.into_iter().flatten().collect();
            debug!(subject, %tier, resource = %kind, count = ids.len(), "scope resolved");
            Ok(ids)
        }
        .boxed()
    }
}

pub struct ScopeResolverBuilder {
    resolver: ScopeResolver,
}

impl ScopeResolverBuilder {
    pub fn register(
        mut self,
        tier: ScopeTier,
        kind: ResourceKind,
        provider: impl ScopeProvider + 'static,
    ) -> Self {
        self.resolver
            .providers
            .entry((tier, kind))
            .or_default()
            .push(Arc::new(provider));
        self
    }

    pub fn build(self) -> ScopeResolver {
        self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FakeDirectory;
    use crate::hierarchy::{ReportDepth, TeamTier};

    fn resolver(dir: FakeDirectory) -> ScopeResolver {
        let dir = Arc::new(dir);
        ScopeResolver::standard(dir.clone(), dir, &AuthzConfig::default())
    }

    #[tokio::test]
    async fn managed_users_union_all_channels() {
        let dir = FakeDirectory::default()
            .reports_to(10, 1)
            .team(50, None)
            .team_member(50, 1, TeamTier::Manager)
            .team_member(50, 11, TeamTier::Member)
            .project(60, 1)
            .project_member(60, 12)
            .branch(70, 1)
            .branch_member(70, 13)
            .reports_to(14, 2);

        let ids = resolver(dir).managed_ids(1, &ResourceKind::User).await.unwrap();
        assert_eq!(ids, IdSet::from([10, 11, 12, 13]));
    }

    #[tokio::test]
    async fn team_channel_expands_one_level_of_subteams() {
        let dir = FakeDirectory::default()
            .team(1, None)
            .team(2, Some(1))
            .team(3, Some(2))
            .team_member(1, 100, TeamTier::Manager)
            .team_member(2, 21, TeamTier::Leader)
            .team_member(2, 22, TeamTier::Member)
            .team_member(2, 23, TeamTier::Manager)
            .team_member(3, 31, TeamTier::Member);

        let ids = resolver(dir).managed_ids(100, &ResourceKind::User).await.unwrap();
        assert_eq!(ids, IdSet::from([21, 22]));
    }

    #[tokio::test]
    async fn transitive_reports_follow_the_chain() {
        let dir = Arc::new(
            FakeDirectory::default()
                .reports_to(2, 1)
                .reports_to(3, 2)
                .reports_to(4, 3),
        );
        let config = AuthzConfig::default().with_report_depth(ReportDepth::Transitive);
        let scopes = ScopeResolver::standard(dir.clone(), dir, &config);

        let ids = scopes.managed_ids(1, &ResourceKind::User).await.unwrap();
        assert_eq!(ids, IdSet::from([2, 3, 4]));
    }

    #[tokio::test]
    async fn own_scopes() {
        let dir = FakeDirectory::default()
            .assign_role(5, 2)
            .assign_role(5, 4)
            .shift(900, 5)
            .shift(901, 6);
        let scopes = resolver(dir);

        assert_eq!(scopes.own_ids(5, &ResourceKind::User).await.unwrap(), IdSet::from([5]));
        assert_eq!(scopes.own_ids(5, &ResourceKind::Role).await.unwrap(), IdSet::from([2, 4]));
        assert_eq!(scopes.own_ids(5, &ResourceKind::Shift).await.unwrap(), IdSet::from([900]));
    }

    #[tokio::test]
    async fn unregistered_kind_is_a_configuration_error() {
        let scopes = resolver(FakeDirectory::default());
        let err = scopes
            .managed_ids(1, &ResourceKind::Contract)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScopeError::Unregistered {
                tier: ScopeTier::Managed,
                resource: ResourceKind::Contract
            }
        ));
        assert!(!scopes.has_provider(ScopeTier::Own, &ResourceKind::Team));
    }

    #[tokio::test]
    async fn custom_kinds_can_be_registered() {
        struct Departments;

        #[async_trait]
        impl ScopeProvider for Departments {
            fn channel(&self) -> &'static str {
                "departments"
            }

            async fn resolve(
                &self,
                _subject: SubjectId,
                _scopes: &ScopeResolver,
            ) -> Result<IdSet, ScopeError> {
                Ok(IdSet::from([7, 8]))
            }
        }

        let dir = Arc::new(FakeDirectory::default());
        let department = ResourceKind::Custom("department".into());
        let scopes = ScopeResolver::standard_builder(dir.clone(), dir, &AuthzConfig::default())
            .register(ScopeTier::Managed, department.clone(), Departments)
            .build();

        let ids = scopes.managed_ids(1, &department).await.unwrap();
        assert_eq!(ids, IdSet::from([7, 8]));
    }

    #[tokio::test]
    async fn a_failing_channel_fails_the_whole_scope() {
        let dir = FakeDirectory::default()
            .reports_to(10, 1)
            .failing("project members")
            .project(60, 1);
        let err = resolver(dir)
            .managed_ids(1, &ResourceKind::User)
            .await
            .unwrap_err();
        match err {
            ScopeError::Lookup(lookup) => assert_eq!(lookup.operation, "project members"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
