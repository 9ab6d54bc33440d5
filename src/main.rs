// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use passowl_server::api::router;
use passowl_server::auth::TokenSigner;
use passowl_server::config;
use passowl_server::state::AppState;
use passowl_server::storage::VaultDatabase;

#[tokio::main]
async fn main() {
    init_tracing();

    // Open (or create) the vault database
    let data_dir = env::var(config::DATA_DIR_ENV)
        .unwrap_or_else(|_| config::DEFAULT_DATA_DIR.to_string());
    let db_path = PathBuf::from(&data_dir).join(config::DATABASE_FILE);
    let db = VaultDatabase::open(&db_path)
        .unwrap_or_else(|e| panic!("Failed to open vault database at {}: {e}", db_path.display()));
    tracing::info!(path = %db_path.display(), "vault database ready");

    // Initialize application state
    let tokens = TokenSigner::from_env();
    let state = AppState::new(Arc::new(db), Arc::new(tokens))
        .with_seed_admin(env::var(config::SEED_ADMIN_ENV).ok());

    let app = router(state);

    // Parse bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    tracing::info!("PassOwl server listening on http://{addr} (docs at /docs)");

    let handle = axum_server::Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("HTTP server failed");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    if env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal(handle: axum_server::Handle<SocketAddr>) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("shutdown signal received");
    handle.graceful_shutdown(Some(Duration::from_secs(5)));
}
