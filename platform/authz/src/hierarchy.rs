//! Read-only view of the organizational hierarchy.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::{Id, SubjectId};

/// Membership tier inside a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamTier {
    Manager,
    Leader,
    Member,
}

impl TeamTier {
    /// Tiers whose holders count as managed by the team's manager.
    pub const MANAGED: [TeamTier; 2] = [TeamTier::Leader, TeamTier::Member];

    pub fn as_str(self) -> &'static str {
        match self {
            TeamTier::Manager => "manager",
            TeamTier::Leader => "leader",
            TeamTier::Member => "member",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "manager" => Some(TeamTier::Manager),
            "leader" => Some(TeamTier::Leader),
            "member" => Some(TeamTier::Member),
            _ => None,
        }
    }
}

impl fmt::Display for TeamTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far down the manager chain the direct-reports channel reaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportDepth {
    /// Users whose manager is the subject.
    #[default]
    Direct,
    /// Every descendant in the manager chain.
    Transitive,
}

#[async_trait]
pub trait HierarchyRepository: Send + Sync {
    async fn get_direct_reports(
        &self,
        manager: SubjectId,
        depth: ReportDepth,
    ) -> Result<Vec<Id>, LookupError>;

    /// Teams the user manages, plus their direct subteams.
    async fn get_teams_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError>;

    async fn get_team_members(
        &self,
        team_ids: &[Id],
        tiers: &[TeamTier],
    ) -> Result<Vec<Id>, LookupError>;

    async fn get_projects_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError>;

    async fn get_project_members(&self, project_ids: &[Id]) -> Result<Vec<Id>, LookupError>;

    async fn get_branches_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError>;

    async fn get_branch_members(&self, branch_ids: &[Id]) -> Result<Vec<Id>, LookupError>;

    async fn get_schedules_authored_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError>;

    async fn get_shifts_for_users(&self, user_ids: &[Id]) -> Result<Vec<Id>, LookupError>;
}
