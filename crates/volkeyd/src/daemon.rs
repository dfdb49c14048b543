//! Daemon lifecycle: startup checks, systemd notify, HTTP server

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use volkey_core::config::VolkeyConfig;

use crate::api::{self, AppState};

pub async fn run(config: VolkeyConfig) -> Result<()> {
    info!("daemon starting");

    config.validate()?;
    let addr = config.server.listen_addr()?;

    // ── Storage layout ───────────────────────────────────────────────────
    config.store.prepare_dirs()?;
    info!(
        config_file = %config.store.config_path().display(),
        uploads = %config.store.uploads_path().display(),
        serialize_updates = config.store.serialize_updates,
        "storage ready"
    );

    if config.server.auth_token.is_none() {
        warn!("no server.auth_token set: every endpoint is unauthenticated");
    }

    info!(
        openssl = %config.keys.openssl_path.display(),
        timeout_secs = config.keys.timeout_secs,
        pbkdf2 = config.keys.pbkdf2,
        "key primitive configured"
    );

    let state = AppState::from_config(&config);
    let app = api::router(state, &config.server);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    notify_ready();
    info!(listen = %addr, "HTTP: listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server")?;

    info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for ctrl-c: {e} (running until killed)");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(unix)]
fn notify_ready() {
    // sd_notify(READY=1) via $NOTIFY_SOCKET; no-op outside systemd
    if let Ok(socket) = std::env::var("NOTIFY_SOCKET") {
        use std::os::unix::net::UnixDatagram;
        if let Ok(sock) = UnixDatagram::unbound() {
            let _ = sock.send_to(b"READY=1\n", &socket);
            tracing::debug!(notify_socket = %socket, "sent systemd READY=1");
        }
    }
}

#[cfg(not(unix))]
fn notify_ready() {}
