//! In-memory permission and hierarchy data for unit tests.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::PermissionRepository;
use crate::error::LookupError;
use crate::hierarchy::{HierarchyRepository, ReportDepth, TeamTier};
use crate::{Id, SubjectId};

#[derive(Default)]
pub struct FakeDirectory {
    user_permissions: BTreeMap<Id, Vec<String>>,
    role_permissions: BTreeMap<Id, Vec<String>>,
    user_roles: BTreeMap<Id, Vec<Id>>,
    managers: BTreeMap<Id, Id>,
    teams: BTreeMap<Id, Option<Id>>,
    team_members: Vec<(Id, Id, TeamTier)>,
    projects: BTreeMap<Id, Id>,
    project_members: Vec<(Id, Id)>,
    branches: BTreeMap<Id, Id>,
    branch_members: Vec<(Id, Id)>,
    schedules: BTreeMap<Id, Id>,
    shifts: BTreeMap<Id, Id>,
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn grant(mut self, user: Id, permission: &str) -> Self {
        self.user_permissions
            .entry(user)
            .or_default()
            .push(permission.to_string());
        self
    }

    pub fn role(mut self, role: Id, permissions: &[&str]) -> Self {
        self.role_permissions
            .entry(role)
            .or_default()
            .extend(permissions.iter().map(|p| p.to_string()));
        self
    }

    pub fn assign_role(mut self, user: Id, role: Id) -> Self {
        self.user_roles.entry(user).or_default().push(role);
        self
    }

    pub fn reports_to(mut self, user: Id, manager: Id) -> Self {
        self.managers.insert(user, manager);
        self
    }

    pub fn team(mut self, team: Id, parent: Option<Id>) -> Self {
        self.teams.insert(team, parent);
        self
    }

    pub fn team_member(mut self, team: Id, user: Id, tier: TeamTier) -> Self {
        self.team_members.push((team, user, tier));
        self
    }

    pub fn project(mut self, project: Id, manager: Id) -> Self {
        self.projects.insert(project, manager);
        self
    }

    pub fn project_member(mut self, project: Id, user: Id) -> Self {
        self.project_members.push((project, user));
        self
    }

    pub fn branch(mut self, branch: Id, manager: Id) -> Self {
        self.branches.insert(branch, manager);
        self
    }

    pub fn branch_member(mut self, branch: Id, user: Id) -> Self {
        self.branch_members.push((branch, user));
        self
    }

    pub fn schedule(mut self, schedule: Id, author: Id) -> Self {
        self.schedules.insert(schedule, author);
        self
    }

    pub fn shift(mut self, shift: Id, user: Id) -> Self {
        self.shifts.insert(shift, user);
        self
    }

    /// Make the named lookup fail.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Delay every lookup.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &'static str) -> Result<(), LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(operation) {
            return Err(LookupError::new(
                operation,
                anyhow::anyhow!("{operation} unavailable"),
            ));
        }
        Ok(())
    }
}

fn managed_by(relation: &BTreeMap<Id, Id>, user: Id) -> Vec<Id> {
    relation
        .iter()
        .filter(|(_, manager)| **manager == user)
        .map(|(id, _)| *id)
        .collect()
}

fn members_of(pairs: &[(Id, Id)], groups: &[Id]) -> Vec<Id> {
    let ids: BTreeSet<Id> = pairs
        .iter()
        .filter(|(group, _)| groups.contains(group))
        .map(|(_, user)| *user)
        .collect();
    ids.into_iter().collect()
}

#[async_trait]
impl PermissionRepository for FakeDirectory {
    async fn get_user_permissions(&self, subject: SubjectId) -> Result<Vec<String>, LookupError> {
        self.enter("user permissions").await?;
        Ok(self
            .user_permissions
            .get(&subject)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_user_roles(&self, subject: SubjectId) -> Result<Vec<Id>, LookupError> {
        self.enter("user roles").await?;
        Ok(self.user_roles.get(&subject).cloned().unwrap_or_default())
    }

    async fn get_role_permissions(&self, role_ids: &[Id]) -> Result<Vec<String>, LookupError> {
        self.enter("role permissions").await?;
        Ok(role_ids
            .iter()
            .filter_map(|role| self.role_permissions.get(role))
            .flatten()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HierarchyRepository for FakeDirectory {
    async fn get_direct_reports(
        &self,
        manager: SubjectId,
        depth: ReportDepth,
    ) -> Result<Vec<Id>, LookupError> {
        self.enter("direct reports").await?;
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([manager]);
        while let Some(current) = queue.pop_front() {
            for report in managed_by(&self.managers, current) {
                if report != manager && seen.insert(report) && depth == ReportDepth::Transitive {
                    queue.push_back(report);
                }
            }
        }
        Ok(seen.into_iter().collect())
    }

    async fn get_teams_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        self.enter("managed teams").await?;
        let mut teams: BTreeSet<Id> = self
            .team_members
            .iter()
            .filter(|(_, member, tier)| *member == user && *tier == TeamTier::Manager)
            .map(|(team, _, _)| *team)
            .collect();
        let subteams: Vec<Id> = self
            .teams
            .iter()
            .filter(|(_, parent)| parent.is_some_and(|p| teams.contains(&p)))
            .map(|(team, _)| *team)
            .collect();
        teams.extend(subteams);
        Ok(teams.into_iter().collect())
    }

    async fn get_team_members(
        &self,
        team_ids: &[Id],
        tiers: &[TeamTier],
    ) -> Result<Vec<Id>, LookupError> {
        self.enter("team members").await?;
        let ids: BTreeSet<Id> = self
            .team_members
            .iter()
            .filter(|(team, _, tier)| team_ids.contains(team) && tiers.contains(tier))
            .map(|(_, user, _)| *user)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn get_projects_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        self.enter("managed projects").await?;
        Ok(managed_by(&self.projects, user))
    }

    async fn get_project_members(&self, project_ids: &[Id]) -> Result<Vec<Id>, LookupError> {
        self.enter("project members").await?;
        Ok(members_of(&self.project_members, project_ids))
    }

    async fn get_branches_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        self.enter("managed branches").await?;
        Ok(managed_by(&self.branches, user))
    }

    async fn get_branch_members(&self, branch_ids: &[Id]) -> Result<Vec<Id>, LookupError> {
        self.enter("branch members").await?;
        Ok(members_of(&self.branch_members, branch_ids))
    }

    async fn get_schedules_authored_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        self.enter("authored schedules").await?;
        Ok(managed_by(&self.schedules, user))
    }

    async fn get_shifts_for_users(&self, user_ids: &[Id]) -> Result<Vec<Id>, LookupError> {
        self.enter("shifts").await?;
        Ok(self
            .shifts
            .iter()
            .filter(|(_, user)| user_ids.contains(*user))
            .map(|(shift, _)| *shift)
            .collect())
    }
}
