//! Read model of permissions, roles and the organizational hierarchy.

pub mod branch_members;
pub mod branches;
pub mod permissions;
pub mod project_members;
pub mod projects;
pub mod role_permissions;
pub mod roles;
pub mod schedules;
pub mod shifts;
pub mod team_members;
pub mod teams;
pub mod user_permissions;
pub mod user_roles;
pub mod users;
