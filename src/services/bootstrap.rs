/*!
 * One-shot bootstrap of a fresh installation.
 *
 * The first trigger in a process migrates the legacy store and, when that
 * leaves the target without users, seeds the default administrator. Every
 * later trigger is a no-op. The gate is per process; concurrent processes
 * rely on the user-count and username checks done inside the database.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::db::{DatabaseTarget, DbPool};
use crate::errors::ServiceError;
use crate::services::legacy_migration::{LegacyMigrationService, MigrationOutcome};
use crate::services::seeder::{SeedOutcome, SeederService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NotStarted,
    Done,
}

/// What the migration step produced during a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStep {
    Completed(MigrationOutcome),
    /// The pass failed and was rolled back; the message is kept for reporting.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub migration: MigrationStep,
    /// `None` when the seeder was not needed.
    pub seed: Option<SeedOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapStatus {
    Completed(BootstrapReport),
    AlreadyDone,
}

/// Process-wide one-shot gate around the migrate-or-seed sequence.
pub struct BootstrapGuard {
    state: Mutex<BootstrapState>,
    done: AtomicBool,
    migration: LegacyMigrationService,
    seeder: SeederService,
}

impl BootstrapGuard {
    pub fn new(migration: LegacyMigrationService, seeder: SeederService) -> Self {
        Self {
            state: Mutex::new(BootstrapState::NotStarted),
            done: AtomicBool::new(false),
            migration,
            seeder,
        }
    }

    pub fn from_config(db_pool: Arc<DbPool>, target: &DatabaseTarget, cfg: &AppConfig) -> Self {
        Self::new(
            LegacyMigrationService::from_config(db_pool.clone(), target, cfg),
            SeederService::from_config(db_pool, cfg),
        )
    }

    /// Has the sequence completed in this process.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub async fn state(&self) -> BootstrapState {
        *self.state.lock().await
    }

    /// Runs the bootstrap sequence unless it already completed.
    ///
    /// Concurrent callers wait for the first one and then observe
    /// [`BootstrapStatus::AlreadyDone`].
    ///
    /// # Errors
    /// A seeder failure is returned and leaves the guard in
    /// [`BootstrapState::NotStarted`], so the next trigger retries.
    #[instrument(skip(self))]
    pub async fn trigger(&self) -> Result<BootstrapStatus, ServiceError> {
        if self.is_done() {
            return Ok(BootstrapStatus::AlreadyDone);
        }

        let mut state = self.state.lock().await;
        if *state == BootstrapState::Done {
            return Ok(BootstrapStatus::AlreadyDone);
        }

        counter!("almox_bootstrap.runs", 1);
        let report = self.run_sequence().await.map_err(|e| {
            counter!("almox_bootstrap.failures", 1, "category" => e.category());
            error!(category = e.category(), "Bootstrap failed: {}", e);
            e
        })?;

        *state = BootstrapState::Done;
        self.done.store(true, Ordering::Release);
        info!(seeded = ?report.seed, "Bootstrap complete");

        Ok(BootstrapStatus::Completed(report))
    }

    async fn run_sequence(&self) -> Result<BootstrapReport, ServiceError> {
        let migration = match self.migration.migrate().await {
            Ok(outcome) => MigrationStep::Completed(outcome),
            Err(e) => {
                warn!(
                    category = e.category(),
                    "Legacy migration failed, falling back to default data: {}", e
                );
                MigrationStep::Failed(e.to_string())
            }
        };

        let seed = if self.target_has_users(&migration).await {
            info!("Target has users, default data not needed");
            None
        } else {
            Some(self.seeder.seed_default_data().await?)
        };

        Ok(BootstrapReport { migration, seed })
    }

    /// A failed pass says nothing about the target, so it is counted again.
    async fn target_has_users(&self, migration: &MigrationStep) -> bool {
        match migration {
            MigrationStep::Completed(outcome) => outcome.target_has_users(),
            MigrationStep::Failed(_) => match self.seeder.existing_users().await {
                Ok(users) => users > 0,
                Err(e) => {
                    warn!("Counting users after the failed migration failed: {}", e);
                    false
                }
            },
        }
    }
}
