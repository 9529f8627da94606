//! almox-api library
//!
//! Bootstrap and legacy data migration core of the almoxarifado inventory
//! backend: target schema, connection provisioning, the one-shot
//! migrate-or-seed sequence and the thin HTTP surface that triggers it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod legacy;
pub mod middleware_helpers;
pub mod migrator;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::{DatabaseTarget, DbPool};
use crate::services::BootstrapGuard;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub bootstrap: Arc<BootstrapGuard>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, target: &DatabaseTarget, config: AppConfig) -> Self {
        let bootstrap = Arc::new(BootstrapGuard::from_config(db.clone(), target, &config));
        Self {
            db,
            config,
            bootstrap,
        }
    }
}

/// HTTP router: `/health` behind the before-request bootstrap trigger.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware_helpers::bootstrap_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
