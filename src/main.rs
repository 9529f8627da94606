use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use almox_api as api;
use api::errors::ServiceError;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("almox-api: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("configuration failed (configuration)")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    // Init DB
    let (target, db_pool) = api::db::establish_connection_from_app_config(&cfg)
        .await
        .map_err(fatal("connecting to the database"))?;
    api::db::run_migrations(&db_pool)
        .await
        .map_err(fatal("applying the target schema"))?;

    let app_state = api::AppState::new(Arc::new(db_pool), &target, cfg.clone());
    let db = app_state.db.clone();

    // Bootstrap before accepting traffic
    let status = app_state
        .bootstrap
        .trigger()
        .await
        .map_err(fatal("bootstrapping the database"))?;
    info!(?status, "Database bootstrap finished");

    let app = api::app_router(app_state);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    info!("almox-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    api::db::close_pool(&db)
        .await
        .map_err(fatal("closing the database pool"))?;

    Ok(())
}

/// Logs a startup failure with its category and turns it into the process error.
fn fatal(stage: &'static str) -> impl FnOnce(ServiceError) -> anyhow::Error {
    move |e| {
        let category = e.category();
        error!(stage, category, "Startup failed: {}", e);
        anyhow::Error::new(e).context(format!("{} failed ({})", stage, category))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
