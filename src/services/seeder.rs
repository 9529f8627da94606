use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::db::{with_transaction, DbPool};
use crate::entities::{user, User, UserActiveModel};
use crate::errors::ServiceError;

pub const ADMIN_USERNAME: &str = "Monter";
pub const ADMIN_EMAIL: &str = "admin@sistema.com";
pub const ADMIN_ROLE: &str = "almoxarifado";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

/// Creates the default administrator account of an empty installation.
#[derive(Clone)]
pub struct SeederService {
    db_pool: Arc<DbPool>,
    admin_password: String,
}

impl SeederService {
    pub fn new(db_pool: Arc<DbPool>, admin_password: impl Into<String>) -> Self {
        Self {
            db_pool,
            admin_password: admin_password.into(),
        }
    }

    pub fn from_config(db_pool: Arc<DbPool>, cfg: &AppConfig) -> Self {
        Self::new(db_pool, cfg.admin_password.clone())
    }

    /// Number of users currently in the target.
    pub async fn existing_users(&self) -> Result<u64, ServiceError> {
        Ok(User::find().count(&*self.db_pool).await?)
    }

    /// Ensures the administrator account exists.
    ///
    /// A concurrent insert of the same username by another process is
    /// reported as [`SeedOutcome::AlreadyPresent`].
    ///
    /// # Errors
    /// Every other failure is returned as [`ServiceError::Seeding`] after the
    /// transaction has been rolled back.
    #[instrument(skip(self))]
    pub async fn seed_default_data(&self) -> Result<SeedOutcome, ServiceError> {
        let password = self.admin_password.clone();

        let result: Result<SeedOutcome, ServiceError> =
            with_transaction(&self.db_pool, "seed_default_data", |txn| {
                Box::pin(async move {
                    let existing = User::find()
                        .filter(user::Column::Username.eq(ADMIN_USERNAME))
                        .one(txn)
                        .await?;
                    if existing.is_some() {
                        return Ok(SeedOutcome::AlreadyPresent);
                    }

                    let admin = UserActiveModel {
                        username: Set(ADMIN_USERNAME.to_string()),
                        email: Set(ADMIN_EMAIL.to_string()),
                        password_hash: Set(hash_password(&password)?),
                        role: Set(ADMIN_ROLE.to_string()),
                        active: Set(true),
                        created_at: Set(Utc::now().naive_utc()),
                        ..Default::default()
                    };
                    admin.insert(txn).await?;
                    Ok(SeedOutcome::Created)
                })
            })
            .await;

        match result {
            Ok(SeedOutcome::Created) => {
                counter!("almox_seeder.admin_created", 1);
                info!(username = ADMIN_USERNAME, "Default administrator created");
                Ok(SeedOutcome::Created)
            }
            Ok(SeedOutcome::AlreadyPresent) => {
                info!(username = ADMIN_USERNAME, "Default administrator already present");
                Ok(SeedOutcome::AlreadyPresent)
            }
            Err(e) if e.is_unique_violation() => {
                info!(
                    username = ADMIN_USERNAME,
                    "Default administrator created concurrently by another worker"
                );
                Ok(SeedOutcome::AlreadyPresent)
            }
            Err(e) => {
                error!("Seeding default data failed: {}", e);
                Err(ServiceError::Seeding(Box::new(e)))
            }
        }
    }
}

/// Hashes `password` into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {}", e)))
}

/// Checks `password` against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
