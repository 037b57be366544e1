use sea_orm_migration::sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

// One statement per entry so the same list runs on SQLite and Postgres.
const UP_SQL: &[&str] = &[
    r#"CREATE TABLE users (
        id BIGINT PRIMARY KEY,
        email TEXT NOT NULL,
        manager_id BIGINT REFERENCES users (id) ON DELETE SET NULL
    )"#,
    "CREATE INDEX users_manager_idx ON users (manager_id)",
    r#"CREATE TABLE permissions (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE roles (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL
    )"#,
    r#"CREATE TABLE user_permissions (
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        permission_id BIGINT NOT NULL REFERENCES permissions (id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, permission_id)
    )"#,
    r#"CREATE TABLE user_roles (
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        role_id BIGINT NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, role_id)
    )"#,
    r#"CREATE TABLE role_permissions (
        role_id BIGINT NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
        permission_id BIGINT NOT NULL REFERENCES permissions (id) ON DELETE CASCADE,
        PRIMARY KEY (role_id, permission_id)
    )"#,
    r#"CREATE TABLE teams (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        parent_id BIGINT REFERENCES teams (id) ON DELETE SET NULL
    )"#,
    "CREATE INDEX teams_parent_idx ON teams (parent_id)",
    r#"CREATE TABLE team_members (
        team_id BIGINT NOT NULL REFERENCES teams (id) ON DELETE CASCADE,
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        tier TEXT NOT NULL CHECK (tier IN ('manager', 'leader', 'member')),
        PRIMARY KEY (team_id, user_id)
    )"#,
    "CREATE INDEX team_members_user_idx ON team_members (user_id, tier)",
    r#"CREATE TABLE projects (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        manager_id BIGINT REFERENCES users (id) ON DELETE SET NULL
    )"#,
    r#"CREATE TABLE project_members (
        project_id BIGINT NOT NULL REFERENCES projects (id) ON DELETE CASCADE,
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        PRIMARY KEY (project_id, user_id)
    )"#,
    r#"CREATE TABLE branches (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        manager_id BIGINT REFERENCES users (id) ON DELETE SET NULL
    )"#,
    r#"CREATE TABLE branch_members (
        branch_id BIGINT NOT NULL REFERENCES branches (id) ON DELETE CASCADE,
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        PRIMARY KEY (branch_id, user_id)
    )"#,
    r#"CREATE TABLE schedules (
        id BIGINT PRIMARY KEY,
        title TEXT NOT NULL,
        author_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE shifts (
        id BIGINT PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        schedule_id BIGINT REFERENCES schedules (id) ON DELETE SET NULL
    )"#,
    "CREATE INDEX shifts_user_idx ON shifts (user_id)",
];

const DOWN_SQL: &[&str] = &[
    "DROP TABLE IF EXISTS shifts",
    "DROP TABLE IF EXISTS schedules",
    "DROP TABLE IF EXISTS branch_members",
    "DROP TABLE IF EXISTS branches",
    "DROP TABLE IF EXISTS project_members",
    "DROP TABLE IF EXISTS projects",
    "DROP TABLE IF EXISTS team_members",
    "DROP TABLE IF EXISTS teams",
    "DROP TABLE IF EXISTS role_permissions",
    "DROP TABLE IF EXISTS user_roles",
    "DROP TABLE IF EXISTS user_permissions",
    "DROP TABLE IF EXISTS roles",
    "DROP TABLE IF EXISTS permissions",
    "DROP TABLE IF EXISTS users",
];

async fn run_all(manager: &SchemaManager<'_>, statements: &[&str]) -> Result<(), DbErr> {
    let conn = manager.get_connection();
    for sql in statements {
        conn.execute_unprepared(sql).await?;
    }
    Ok(())
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        run_all(manager, UP_SQL).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        run_all(manager, DOWN_SQL).await
    }
}
