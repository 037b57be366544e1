//! Scopes for organizational resources resolved through their managed-by or
//! authored-by relation, and shifts derived from the managed user scope.

use async_trait::async_trait;

use super::{ScopeProvider, ScopeResolver};
use crate::error::ScopeError;
use crate::key::{ResourceKind, ScopeTier};
use crate::{IdSet, SubjectId};

pub struct ManagedTeams;

#[async_trait]
impl ScopeProvider for ManagedTeams {
    fn channel(&self) -> &'static str {
        "managed-teams"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let teams = scopes.hierarchy().get_teams_managed_by(subject).await?;
        Ok(teams.into_iter().collect())
    }
}

pub struct ManagedProjects;

#[async_trait]
impl ScopeProvider for ManagedProjects {
    fn channel(&self) -> &'static str {
        "managed-projects"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let projects = scopes.hierarchy().get_projects_managed_by(subject).await?;
        Ok(projects.into_iter().collect())
    }
}

pub struct ManagedBranches;

#[async_trait]
impl ScopeProvider for ManagedBranches {
    fn channel(&self) -> &'static str {
        "managed-branches"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let branches = scopes.hierarchy().get_branches_managed_by(subject).await?;
        Ok(branches.into_iter().collect())
    }
}

pub struct AuthoredSchedules;

#[async_trait]
impl ScopeProvider for AuthoredSchedules {
    fn channel(&self) -> &'static str {
        "authored-schedules"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let schedules = scopes.hierarchy().get_schedules_authored_by(subject).await?;
        Ok(schedules.into_iter().collect())
    }
}

/// Shifts of every user in the subject's managed user scope.
pub struct ManagedShifts;

#[async_trait]
impl ScopeProvider for ManagedShifts {
    fn channel(&self) -> &'static str {
        "managed-shifts"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let users = scopes
            .resolve(subject, ScopeTier::Managed, &ResourceKind::User)
            .await?;
        if users.is_empty() {
            return Ok(IdSet::new());
        }
        let users: Vec<_> = users.into_iter().collect();
        let shifts = scopes.hierarchy().get_shifts_for_users(&users).await?;
        Ok(shifts.into_iter().collect())
    }
}

/// The subject's own shifts.
pub struct OwnShifts;

#[async_trait]
impl ScopeProvider for OwnShifts {
    fn channel(&self) -> &'static str {
        "own-shifts"
    }

    async fn resolve(
        &self,
        subject: SubjectId,
        scopes: &ScopeResolver,
    ) -> Result<IdSet, ScopeError> {
        let shifts = scopes.hierarchy().get_shifts_for_users(&[subject]).await?;
        Ok(shifts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::AuthzConfig;
    use crate::fixtures::FakeDirectory;
    use crate::hierarchy::TeamTier;

    use super::*;

    #[tokio::test]
    async fn managed_shifts_follow_managed_users() {
        let dir = Arc::new(
            FakeDirectory::default()
                .reports_to(2, 1)
                .team(5, None)
                .team_member(5, 1, TeamTier::Manager)
                .team_member(5, 3, TeamTier::Member)
                .shift(100, 2)
                .shift(101, 3)
                .shift(102, 4)
                .shift(103, 1),
        );
        let scopes = ScopeResolver::standard(dir.clone(), dir, &AuthzConfig::default());

        let shifts = scopes.managed_ids(1, &ResourceKind::Shift).await.unwrap();
        assert_eq!(shifts, IdSet::from([100, 101]));
    }

    #[tokio::test]
    async fn organizational_resources_use_their_own_relation() {
        let dir = Arc::new(
            FakeDirectory::default()
                .team(5, None)
                .team(6, Some(5))
                .team_member(5, 1, TeamTier::Manager)
                .project(10, 1)
                .project(11, 2)
                .branch(20, 1)
                .schedule(30, 1)
                .schedule(31, 2),
        );
        let scopes = ScopeResolver::standard(dir.clone(), dir, &AuthzConfig::default());

        let teams = scopes.managed_ids(1, &ResourceKind::Team).await.unwrap();
        assert_eq!(teams, IdSet::from([5, 6]));
        let projects = scopes.managed_ids(1, &ResourceKind::Project).await.unwrap();
        assert_eq!(projects, IdSet::from([10]));
        let branches = scopes.managed_ids(1, &ResourceKind::Branch).await.unwrap();
        assert_eq!(branches, IdSet::from([20]));
        let schedules = scopes.managed_ids(1, &ResourceKind::Schedule).await.unwrap();
        assert_eq!(schedules, IdSet::from([30]));
    }
}
