//! User scope channels. Each channel independently qualifies users as managed.

use async_trait::async_trait;

use super::{ScopeProvider, ScopeResolver};
use crate::error::ScopeError;
use crate::hierarchy::{ReportDepth, TeamTier};
use crate::{IdSet, SubjectId};

/// Users whose manager relationship names the subject.
pub struct DirectReports {
    depth: ReportDepth,
}

impl DirectReports {
    pub fn new(depth: ReportDepth) -> Self {
        Self { depth }
    }
}

#[async_trait]
impl ScopeProvider for DirectReports {
    fn channel(&self) -> &'static str {
        "direct-reports"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let reports = scopes
            .hierarchy()
            .get_direct_reports(subject, self.depth)
            .await?;
        Ok(reports.into_iter().collect())
    }
}

/// Leaders and members of teams (and direct subteams) the subject manages.
pub struct TeamManagement;

#[async_trait]
impl ScopeProvider for TeamManagement {
    fn channel(&self) -> &'static str {
        "team-management"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let hierarchy = scopes.hierarchy();
        let teams = hierarchy.get_teams_managed_by(subject).await?;
        if teams.is_empty() {
            return Ok(IdSet::new());
        }
        let members = hierarchy
            .get_team_members(&teams, &TeamTier::MANAGED)
            .await?;
        Ok(members.into_iter().collect())
    }
}

/// Users assigned to projects the subject manages.
pub struct ProjectManagement;

#[async_trait]
impl ScopeProvider for ProjectManagement {
    fn channel(&self) -> &'static str {
        "project-management"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let hierarchy = scopes.hierarchy();
        let projects = hierarchy.get_projects_managed_by(subject).await?;
        if projects.is_empty() {
            return Ok(IdSet::new());
        }
        Ok(hierarchy
            .get_project_members(&projects)
            .await?
            .into_iter()
            .collect())
    }
}

/// Users assigned to branches the subject manages.
pub struct BranchManagement;

#[async_trait]
impl ScopeProvider for BranchManagement {
    fn channel(&self) -> &'static str {
        "branch-management"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let hierarchy = scopes.hierarchy();
        let branches = hierarchy.get_branches_managed_by(subject).await?;
        if branches.is_empty() {
            return Ok(IdSet::new());
        }
        Ok(hierarchy
            .get_branch_members(&branches)
            .await?
            .into_iter()
            .collect())
    }
}

/// The subject's own user record.
pub struct OwnUser;

#[async_trait]
impl ScopeProvider for OwnUser {
    fn channel(&self) -> &'static str {
        "self"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        _scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        Ok(IdSet::from([subject]))
    }
}
