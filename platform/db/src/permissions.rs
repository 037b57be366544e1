use async_trait::async_trait;
use entity::{permissions, role_permissions, user_permissions, user_roles};
use platform_authz::{Id, LookupError, PermissionRepository, SubjectId};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect};

fn lookup(operation: &'static str) -> impl FnOnce(DbErr) -> LookupError {
    move |err| LookupError::new(operation, err)
}

fn names(rows: Vec<(impl Sized, Option<permissions::Model>)>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|(_, permission)| permission.map(|p| p.name))
        .collect()
}

/// Permission names and role assignments read through sea-orm.
#[derive(Clone)]
pub struct SeaPermissionRepository {
    db: DatabaseConnection,
}

impl SeaPermissionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PermissionRepository for SeaPermissionRepository {
    async fn get_user_permissions(&self, subject: SubjectId) -> Result<Vec<String>, LookupError> {
        let rows = user_permissions::Entity::find()
            .filter(user_permissions::Column::UserId.eq(subject))
            .find_also_related(permissions::Entity)
            .all(&self.db)
            .await
            .map_err(lookup("user permissions"))?;
        Ok(names(rows))
    }

    async fn get_user_roles(&self, subject: SubjectId) -> Result<Vec<Id>, LookupError> {
        user_roles::Entity::find()
            .select_only()
            .column(user_roles::Column::RoleId)
            .filter(user_roles::Column::UserId.eq(subject))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(lookup("user roles"))
    }

    async fn get_role_permissions(&self, role_ids: &[Id]) -> Result<Vec<String>, LookupError> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = role_permissions::Entity::find()
            .filter(role_permissions::Column::RoleId.is_in(role_ids.iter().copied()))
            .find_also_related(permissions::Entity)
            .all(&self.db)
            .await
            .map_err(lookup("role permissions"))?;
        Ok(names(rows))
    }
}
