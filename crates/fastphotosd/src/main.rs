//! fastphotosd — FastPhotos receiver daemon.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use fastphotos_core::config::FastPhotosConfig;
use fastphotos_services::{new_connection_table, ReceiverRuntime, ReceiverSettings, Viewport};
use fastphotosd::{transport, HeadlessScreen, HttpFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = FastPhotosConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = FastPhotosConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        FastPhotosConfig::default()
    });

    let listen_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.network.listen_addr.clone());
    tracing::info!(listen_addr, "fastphotosd starting");

    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind transport on {listen_addr}"))?;

    let viewport = Viewport {
        width: config.display.width,
        height: config.display.height,
    };
    if viewport.width == 0 || viewport.height == 0 {
        tracing::error!(
            width = viewport.width,
            height = viewport.height,
            "display size is not set"
        );
    }
    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let connections = new_connection_table();

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let (runtime, handle) = ReceiverRuntime::new(
        HeadlessScreen::new(viewport),
        fetcher,
        connections.clone(),
        ReceiverSettings::from(&config),
        shutdown_tx.clone(),
    );
    let status = handle.status_watch();
    let mut runtime_task = tokio::spawn(runtime.run());

    let transport_task = tokio::spawn(transport::listener_loop(
        listener,
        handle,
        shutdown_tx.subscribe(),
    ));

    // Status HTTP endpoint
    let api_port = config.network.api_port;
    let _api_server = {
        let state = fastphotos_api::ApiState {
            status,
            connections,
            shutdown_tx: shutdown_tx.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = fastphotos_api::serve(state, api_port).await {
                tracing::error!(error = %e, "status server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv()   => tracing::info!("shutting down"),
        r = &mut runtime_task    => tracing::error!("receiver runtime exited: {:?}", r),
        r = transport_task       => tracing::error!("transport listener exited: {:?}", r),
    }

    // Let the runtime log its counters.
    if !runtime_task.is_finished() {
        let _ = tokio::time::timeout(Duration::from_secs(1), &mut runtime_task).await;
    }

    Ok(())
}
