use std::collections::BTreeSet;

use async_trait::async_trait;
use entity::{
    branch_members, branches, project_members, projects, schedules, shifts, team_members, teams,
    users,
};
use platform_authz::{HierarchyRepository, Id, LookupError, ReportDepth, SubjectId, TeamTier};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

fn lookup(operation: &'static str) -> impl FnOnce(DbErr) -> LookupError {
    move |err| LookupError::new(operation, err)
}

/// Organizational hierarchy read through sea-orm.
#[derive(Clone)]
pub struct SeaHierarchyRepository {
    db: DatabaseConnection,
}

impl SeaHierarchyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn reports_of(&self, managers: &[Id]) -> Result<Vec<Id>, LookupError> {
        users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::ManagerId.is_in(managers.iter().copied()))
            .order_by_asc(users::Column::Id)
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("direct reports"))
    }
}

#[async_trait]
impl HierarchyRepository for SeaHierarchyRepository {
    async fn get_direct_reports(
        &self,
        manager: SubjectId,
        depth: ReportDepth,
    ) -> Result<Vec<Id>, LookupError> {
        let direct = self.reports_of(&[manager]).await?;
        if depth == ReportDepth::Direct {
            return Ok(direct);
        }

        // Breadth-first over the manager chain; `seen` guards against cycles.
        let mut seen: BTreeSet<Id> = BTreeSet::from([manager]);
        let mut reports = BTreeSet::new();
        let mut frontier: Vec<Id> = direct;
        let mut levels = 1usize;
        while !frontier.is_empty() {
            frontier.retain(|id| seen.insert(*id));
            reports.extend(frontier.iter().copied());
            if frontier.is_empty() {
                break;
            }
            frontier = self.reports_of(&frontier).await?;
            levels += 1;
        }
        debug!(manager, levels, reports = reports.len(), "transitive reports resolved");
        Ok(reports.into_iter().collect())
    }

    async fn get_teams_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        let managed: Vec<Id> = team_members::Entity::find()
            .select_only()
            .column(team_members::Column::TeamId)
            .filter(team_members::Column::UserId.eq(user))
            .filter(team_members::Column::Tier.eq(TeamTier::Manager.as_str()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("managed teams"))?;
        if managed.is_empty() {
            return Ok(managed);
        }
        let subteams: Vec<Id> = teams::Entity::find()
            .select_only()
            .column(teams::Column::Id)
            .filter(teams::Column::ParentId.is_in(managed.iter().copied()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("managed teams"))?;
        let all: BTreeSet<Id> = managed.into_iter().chain(subteams).collect();
        Ok(all.into_iter().collect())
    }

    async fn get_team_members(
        &self,
        team_ids: &[Id],
        tiers: &[TeamTier],
    ) -> Result<Vec<Id>, LookupError> {
        if team_ids.is_empty() || tiers.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Id> = team_members::Entity::find()
            .select_only()
            .column(team_members::Column::UserId)
            .filter(team_members::Column::TeamId.is_in(team_ids.iter().copied()))
            .filter(team_members::Column::Tier.is_in(tiers.iter().map(|t| t.as_str())))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("team members"))?;
        Ok(dedup(ids))
    }

    async fn get_projects_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        projects::Entity::find()
            .select_only()
            .column(projects::Column::Id)
            .filter(projects::Column::ManagerId.eq(user))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("managed projects"))
    }

    async fn get_project_members(&self, project_ids: &[Id]) -> Result<Vec<Id>, LookupError> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Id> = project_members::Entity::find()
            .select_only()
            .column(project_members::Column::UserId)
            .filter(project_members::Column::ProjectId.is_in(project_ids.iter().copied()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("project members"))?;
        Ok(dedup(ids))
    }

    async fn get_branches_managed_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        branches::Entity::find()
            .select_only()
            .column(branches::Column::Id)
            .filter(branches::Column::ManagerId.eq(user))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("managed branches"))
    }

    async fn get_branch_members(&self, branch_ids: &[Id]) -> Result<Vec<Id>, LookupError> {
        if branch_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Id> = branch_members::Entity::find()
            .select_only()
            .column(branch_members::Column::UserId)
            .filter(branch_members::Column::BranchId.is_in(branch_ids.iter().copied()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("branch members"))?;
        Ok(dedup(ids))
    }

    async fn get_schedules_authored_by(&self, user: SubjectId) -> Result<Vec<Id>, LookupError> {
        schedules::Entity::find()
            .select_only()
            .column(schedules::Column::Id)
            .filter(schedules::Column::AuthorId.eq(user))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("authored schedules"))
    }

    async fn get_shifts_for_users(&self, user_ids: &[Id]) -> Result<Vec<Id>, LookupError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        shifts::Entity::find()
            .select_only()
            .column(shifts::Column::Id)
            .filter(shifts::Column::UserId.is_in(user_ids.iter().copied()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("shifts"))
    }
}

fn dedup(ids: Vec<Id>) -> Vec<Id> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
