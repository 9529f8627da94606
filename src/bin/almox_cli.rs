use std::{path::PathBuf, process::ExitCode, sync::Arc};

use almox_api::{
    config::{self, AppConfig},
    db::{self, DatabaseTarget, DbPool},
    entities::User,
    errors::ServiceError,
    services::{
        BootstrapGuard, BootstrapStatus, LegacyMigrationService, MigrationOutcome, MigrationStep,
        SeedOutcome, SeederService,
    },
};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "almox-cli",
    about = "Operator commands for the almoxarifado database bootstrap",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Legacy SQLite store to read instead of <app_dir>/database/app.db"
    )]
    legacy_db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default administrator if it does not exist
    InitDb,
    /// Apply the target schema and copy the legacy store once
    Migrate,
    /// Apply the target schema and run the full migrate-or-seed sequence
    Bootstrap,
    /// Show the resolved target, legacy store presence and user count
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ServiceError>() {
                Some(service_err) => {
                    eprintln!("error [{}]: {:#}", service_err.category(), e);
                    ExitCode::from(exit_code(service_err))
                }
                None => {
                    eprintln!("error: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = config::load_config().map_err(ServiceError::from)?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(path) = &cli.legacy_db {
        cfg.legacy_db_path = Some(path.display().to_string());
    }

    let context = CliContext::initialize(cfg).await?;

    match cli.command {
        Commands::InitDb => handle_init_db(&context, cli.json).await,
        Commands::Migrate => handle_migrate(&context, cli.json).await,
        Commands::Bootstrap => handle_bootstrap(&context, cli.json).await,
        Commands::Status => handle_status(&context, cli.json).await,
    }
}

struct CliContext {
    config: AppConfig,
    target: DatabaseTarget,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize(config: AppConfig) -> Result<Self> {
        let (target, db_pool) = db::establish_connection_from_app_config(&config).await?;
        Ok(Self {
            config,
            target,
            db: Arc::new(db_pool),
        })
    }

    async fn apply_schema(&self) -> Result<()> {
        db::run_migrations(&self.db).await?;
        Ok(())
    }
}

async fn handle_init_db(context: &CliContext, json: bool) -> Result<()> {
    context.apply_schema().await?;
    let outcome = SeederService::from_config(context.db.clone(), &context.config)
        .seed_default_data()
        .await?;

    if json {
        print_json(&outcome)?;
    } else {
        render_seed(Some(outcome));
    }
    Ok(())
}

async fn handle_migrate(context: &CliContext, json: bool) -> Result<()> {
    context.apply_schema().await?;
    let service =
        LegacyMigrationService::from_config(context.db.clone(), &context.target, &context.config);
    let outcome = service
        .migrate()
        .await
        .with_context(|| format!("migration from {} failed", service.legacy_path().display()))?;

    if json {
        print_json(&outcome)?;
    } else {
        render_migration(&outcome);
    }
    Ok(())
}

async fn handle_bootstrap(context: &CliContext, json: bool) -> Result<()> {
    context.apply_schema().await?;
    let guard = BootstrapGuard::from_config(context.db.clone(), &context.target, &context.config);
    let status = guard.trigger().await?;

    if json {
        return print_json(&status);
    }

    match status {
        BootstrapStatus::AlreadyDone => println!("Bootstrap already done"),
        BootstrapStatus::Completed(report) => {
            match &report.migration {
                MigrationStep::Completed(outcome) => render_migration(outcome),
                MigrationStep::Failed(reason) => {
                    println!("Migration failed and was rolled back: {}", reason)
                }
            }
            render_seed(report.seed);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusReport {
    environment: String,
    target: String,
    legacy_path: String,
    legacy_present: bool,
    /// `None` when the target schema has not been applied yet.
    users: Option<u64>,
}

async fn handle_status(context: &CliContext, json: bool) -> Result<()> {
    let legacy_path = context.config.legacy_db_path();
    let users = match User::find().count(&*context.db).await {
        Ok(count) => Some(count),
        Err(e) => match ServiceError::from(e) {
            ServiceError::DatabaseError(_) => None,
            other => return Err(other.into()),
        },
    };

    let report = StatusReport {
        environment: context.target.environment.to_string(),
        target: context.target.redacted_url(),
        legacy_path: legacy_path.display().to_string(),
        legacy_present: legacy_path.exists(),
        users,
    };

    if json {
        return print_json(&report);
    }

    println!("environment   {}", report.environment);
    println!("target        {}", report.target);
    println!(
        "legacy store  {} ({})",
        report.legacy_path,
        if report.legacy_present { "present" } else { "absent" }
    );
    match report.users {
        Some(count) => println!("users         {}", count),
        None => println!("users         schema not applied"),
    }
    Ok(())
}

fn render_migration(outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::Skipped(reason) => println!("Migration skipped: {}", reason),
        MigrationOutcome::Migrated(report) => {
            println!("Migration committed:");
            println!("{}", report);
        }
    }
}

fn render_seed(outcome: Option<SeedOutcome>) {
    match outcome {
        Some(SeedOutcome::Created) => println!("Default administrator created"),
        Some(SeedOutcome::AlreadyPresent) => println!("Default administrator already present"),
        None => println!("Default data not needed"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// sysexits-style codes so scripts can tell failure categories apart.
fn exit_code(err: &ServiceError) -> u8 {
    match err {
        ServiceError::Configuration(_) => 78,
        ServiceError::Connectivity(_) | ServiceError::PoolExhausted => 69,
        ServiceError::LegacySource(_) | ServiceError::Mapping(_) => 65,
        ServiceError::Seeding(_) => 73,
        ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => 70,
    }
}
