//! The access decision tree.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, instrument, warn};

use crate::catalog::{PermissionCatalog, PermissionRepository, PermissionSet};
use crate::config::AuthzConfig;
use crate::decision::{AccessDecision, Partition};
use crate::error::{AuthzError, AuthzResult, ScopeError};
use crate::hierarchy::HierarchyRepository;
use crate::key::{Action, PermissionKey, ResourceKind, ScopeTier};
use crate::scope::ScopeResolver;
use crate::{Id, IdSet, SubjectId};

/// Raw caller input. Absent or blank subject, action or resource denies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessRequest {
    pub subject: Option<SubjectId>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub ids: IdSet,
    pub resource2: Option<String>,
    pub ids2: IdSet,
}

impl AccessRequest {
    pub fn new(subject: SubjectId, action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            subject: Some(subject),
            action: Some(action.into()),
            resource: Some(resource.into()),
            ..Self::default()
        }
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = Id>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }

    /// Second resource of a dual-resource action such as `assign`.
    pub fn second(mut self, resource2: impl Into<String>, ids2: impl IntoIterator<Item = Id>) -> Self {
        self.resource2 = Some(resource2.into());
        self.ids2 = ids2.into_iter().collect();
        self
    }
}

struct Checked<'a> {
    subject: SubjectId,
    action: Action,
    resource: ResourceKind,
    ids: &'a IdSet,
    resource2: Option<ResourceKind>,
    ids2: &'a IdSet,
}

impl<'a> Checked<'a> {
    fn from_request(request: &'a AccessRequest) -> Option<Self> {
        Some(Self {
            subject: request.subject?,
            action: Action::parse(request.action.as_deref()?)?,
            resource: ResourceKind::parse(request.resource.as_deref()?)?,
            ids: &request.ids,
            resource2: request.resource2.as_deref().and_then(ResourceKind::parse),
            ids2: &request.ids2,
        })
    }
}

pub struct AccessDecisionEngine {
    catalog: PermissionCatalog,
    scopes: ScopeResolver,
    timeout: Option<Duration>,
}

impl AccessDecisionEngine {
    pub fn new(catalog: PermissionCatalog, scopes: ScopeResolver) -> Self {
        Self {
            catalog,
            scopes,
            timeout: None,
        }
    }

    /// Engine over the standard scope channels, configured from `config`.
    pub fn from_config(
        permissions: Arc<dyn PermissionRepository>,
        hierarchy: Arc<dyn HierarchyRepository>,
        config: &AuthzConfig,
    ) -> Self {
        let scopes = ScopeResolver::standard(permissions.clone(), hierarchy, config);
        let engine = Self::new(PermissionCatalog::new(permissions), scopes);
        match config.lookup_timeout {
            Some(limit) => engine.with_timeout(limit),
            None => engine,
        }
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn scopes(&self) -> &ScopeResolver {
        &self.scopes
    }

    /// Decide whether `request` is permitted.
    ///
    /// An `Err` means no decision was reached (a lookup failed or the deadline
    /// passed) and must be handled as a deny. Dropping the returned future
    /// cancels every in-flight lookup.
    #[instrument(
        skip_all,
        fields(subject = ?request.subject, action = ?request.action, resource = ?request.resource)
    )]
    pub async fn check_access(&self, request: &AccessRequest) -> AuthzResult<AccessDecision> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.evaluate(request))
                .await
                .map_err(|_| {
                    warn!(?limit, "access check timed out");
                    AuthzError::TimedOut(limit)
                })?,
            None => self.evaluate(request).await,
        }
    }

    async fn evaluate(&self, request: &AccessRequest) -> AuthzResult<AccessDecision> {
        let Some(input) = Checked::from_request(request) else {
            debug!("subject, action or resource missing");
            return Ok(AccessDecision::denied());
        };
        let Checked {
            subject,
            ref action,
            ref resource,
            ids,
            ref resource2,
            ids2,
        } = input;

        let perms = self
            .catalog
            .effective_permissions(subject)
            .await
            .inspect_err(|err| warn!(error = %err, "permission lookup failed"))?;

        if perms.is_wildcard() {
            debug!(rule = "wildcard", "granted");
            return Ok(AccessDecision::full());
        }

        if !action.is_assign()
            && *resource == ResourceKind::User
            && ids.len() == 1
            && ids.contains(&subject)
            && perms.contains(&PermissionKey::on_self(action))
        {
            debug!(rule = "self", "granted");
            return Ok(AccessDecision::full());
        }

        let unscoped = if action.is_assign() {
            let Some(second) = resource2 else {
                debug!("assign without a second resource");
                return Ok(AccessDecision::denied());
            };
            PermissionKey::pair(action, resource, second)
        } else {
            PermissionKey::unscoped(action, resource)
        };
        if perms.contains(&unscoped) {
            debug!(rule = "unscoped", permission = %unscoped, "granted");
            return Ok(AccessDecision::full());
        }

        if *action == Action::Create {
            debug!(rule = "create", "denied");
            return Ok(AccessDecision::create_denied());
        }

        match resource2 {
            Some(second) if action.is_assign() => {
                self.dual(&perms, subject, action, (resource, ids), (second, ids2))
                    .await
            }
            _ => self.single(&perms, subject, action, resource, ids).await,
        }
    }

    async fn single(
        &self,
        perms: &PermissionSet,
        subject: SubjectId,
        action: &Action,
        resource: &ResourceKind,
        ids: &IdSet,
    ) -> AuthzResult<AccessDecision> {
        for tier in ScopeTier::ORDER {
            let key = PermissionKey::scoped(action, tier, resource);
            if !perms.contains(&key) {
                continue;
            }
            let Some(scope) = self.scope(subject, tier, resource).await? else {
                return Ok(AccessDecision::denied());
            };
            let decision = AccessDecision::scoped(ids, &scope);
            debug!(
                rule = "scoped",
                permission = %key,
                allowed = decision.allowed_ids.len(),
                forbidden = decision.forbidden_ids.len(),
                "partitioned"
            );
            return Ok(decision);
        }
        debug!("no rule matched");
        Ok(AccessDecision::denied())
    }

    /// Each side is granted by its own permission: `<action>-<resource>` or
    /// `<action>-<tier>-<resource>`. One scoped side with the other unscoped
    /// partitions only the scoped side; two scoped sides partition both.
    async fn dual(
        &self,
        perms: &PermissionSet,
        subject: SubjectId,
        action: &Action,
        (resource, ids): (&ResourceKind, &IdSet),
        (resource2, ids2): (&ResourceKind, &IdSet),
    ) -> AuthzResult<AccessDecision> {
        let unscoped = |kind: &ResourceKind| perms.contains(&PermissionKey::unscoped(action, kind));
        let scoped_tier = |kind: &ResourceKind| {
            ScopeTier::ORDER
                .into_iter()
                .find(|tier| perms.contains(&PermissionKey::scoped(action, *tier, kind)))
        };

        match (scoped_tier(resource), scoped_tier(resource2)) {
            (Some(tier), _) if unscoped(resource2) => {
                debug!(rule = "dual-first", %tier, "matched");
                let Some(scope) = self.scope(subject, tier, resource).await? else {
                    return Ok(AccessDecision::denied());
                };
                Ok(AccessDecision::scoped_first(
                    Partition::new(ids, &scope),
                    ids2,
                ))
            }
            (_, Some(tier2)) if unscoped(resource) => {
                debug!(rule = "dual-second", %tier2, "matched");
                let Some(scope2) = self.scope(subject, tier2, resource2).await? else {
                    return Ok(AccessDecision::denied());
                };
                Ok(AccessDecision::scoped_second(
                    ids,
                    Partition::new(ids2, &scope2),
                ))
            }
            (Some(tier), Some(tier2)) => {
                debug!(rule = "dual-both", %tier, %tier2, "matched");
                let (scope, scope2) = tokio::try_join!(
                    self.scope(subject, tier, resource),
                    self.scope(subject, tier2, resource2)
                )?;
                let (Some(scope), Some(scope2)) = (scope, scope2) else {
                    return Ok(AccessDecision::denied());
                };
                Ok(AccessDecision::dual(
                    Partition::new(ids, &scope),
                    Partition::new(ids2, &scope2),
                ))
            }
            _ => {
                debug!("no rule matched");
                Ok(AccessDecision::denied())
            }
        }
    }

    /// `None` when no provider serves `(tier, kind)`; the caller denies.
    async fn scope(
        &self,
        subject: SubjectId,
        tier: ScopeTier,
        kind: &ResourceKind,
    ) -> AuthzResult<Option<IdSet>> {
        match self.scopes.resolve(subject, tier, kind).await {
            Ok(ids) => Ok(Some(ids)),
            Err(ScopeError::Unregistered { tier, resource }) => {
                error!(%tier, %resource, "scoped permission references a resource kind without a scope provider");
                Ok(None)
            }
            Err(ScopeError::Lookup(err)) => {
                warn!(error = %err, "scope lookup failed");
                Err(err.into())
            }
        }
    }
}
