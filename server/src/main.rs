mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use migration::{Migrator, MigratorTrait};
use platform_authz::{
    AccessDecisionEngine, AccessRequest, Id, IdSet, ResourceKind, ScopeTier, SubjectId,
};
use platform_db::{DbPool, SeaHierarchyRepository, SeaPermissionRepository, connect};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;

/// Exit status of `check --strict` when the subject has no access at all.
const DENIED: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "accessctl", version, about = "Access decision engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one access request and print the decision as JSON.
    Check(CheckCommand),
    /// Print the managed or own scope of a subject for a resource kind.
    Scope(ScopeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Print the active role escalation table as JSON.
    #[command(name = "escalation:print")]
    EscalationPrint,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct CheckCommand {
    #[arg(long)]
    subject: SubjectId,
    #[arg(long)]
    action: String,
    #[arg(long)]
    resource: String,
    #[arg(long, value_delimiter = ',', help = "Comma separated target IDs")]
    ids: Vec<Id>,
    #[arg(long, help = "Second resource of an assign request")]
    resource2: Option<String>,
    #[arg(long, value_delimiter = ',', requires = "resource2")]
    ids2: Vec<Id>,
    #[arg(long, value_name = "MS", help = "Overrides ACCESS_CHECK_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
    #[arg(long, help = "Exit non-zero when access is denied")]
    strict: bool,
}

impl CheckCommand {
    fn request(&self) -> AccessRequest {
        let request = AccessRequest::new(self.subject, &self.action, &self.resource)
            .ids(self.ids.iter().copied());
        match &self.resource2 {
            Some(resource2) => request.second(resource2, self.ids2.iter().copied()),
            None => request,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TierArg {
    Managed,
    Own,
}

impl From<TierArg> for ScopeTier {
    fn from(value: TierArg) -> Self {
        match value {
            TierArg::Managed => ScopeTier::Managed,
            TierArg::Own => ScopeTier::Own,
        }
    }
}

#[derive(Args, Debug)]
struct ScopeCommand {
    #[arg(long)]
    subject: SubjectId,
    #[arg(long, value_enum, default_value = "managed")]
    tier: TierArg,
    #[arg(long)]
    resource: String,
}

#[derive(Serialize)]
struct ScopeOutput<'a> {
    subject: SubjectId,
    tier: ScopeTier,
    resource: &'a ResourceKind,
    ids: IdSet,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing(ObsConfig::from_env())?;
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Check(cmd) => run_check(cmd).await,
        Command::Scope(cmd) => run_scope(cmd).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::EscalationPrint => escalation_print(),
    };
    shutdown_tracing()?;
    outcome
}

async fn setup_pool(config: &AppConfig) -> Result<DbPool> {
    connect(&config.database).await.map_err(Into::into)
}

fn build_engine(pool: DbPool, config: &AppConfig) -> AccessDecisionEngine {
    let permissions = Arc::new(SeaPermissionRepository::new(pool.clone()));
    let hierarchy = Arc::new(SeaHierarchyRepository::new(pool));
    AccessDecisionEngine::from_config(permissions, hierarchy, &config.authz)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_check(cmd: CheckCommand) -> Result<ExitCode> {
    let config = AppConfig::load()?.with_timeout_override(cmd.timeout_ms);
    let engine = build_engine(setup_pool(&config).await?, &config);
    let decision = engine.check_access(&cmd.request()).await?;
    print_json(&decision)?;
    if cmd.strict && !decision.has_access {
        return Ok(ExitCode::from(DENIED));
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_scope(cmd: ScopeCommand) -> Result<ExitCode> {
    let resource = ResourceKind::parse(&cmd.resource)
        .ok_or_else(|| anyhow!("resource kind must not be blank"))?;
    let config = AppConfig::load()?;
    let engine = build_engine(setup_pool(&config).await?, &config);
    let tier = ScopeTier::from(cmd.tier);
    let ids = engine
        .scopes()
        .resolve(cmd.subject, tier, &resource)
        .await?;
    print_json(&ScopeOutput {
        subject: cmd.subject,
        tier,
        resource: &resource,
        ids,
    })?;
    Ok(ExitCode::SUCCESS)
}

async fn migrate_up() -> Result<ExitCode> {
    let config = AppConfig::load()?;
    let pool = setup_pool(&config).await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(ExitCode::SUCCESS)
}

async fn migrate_down() -> Result<ExitCode> {
    let config = AppConfig::load()?;
    let pool = setup_pool(&config).await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(ExitCode::SUCCESS)
}

fn escalation_print() -> Result<ExitCode> {
    let config = AppConfig::load()?;
    print_json(&config.authz.role_escalation)?;
    Ok(ExitCode::SUCCESS)
}
