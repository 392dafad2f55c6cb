//! TCP transport — one connection per sender, one JSON frame per line.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};

use fastphotos_core::protocol::Frame;
use fastphotos_core::{Inbound, ResponseEnvelope};
use fastphotos_services::ReceiverHandle;

/// Accept senders until shutdown.
pub async fn listener_loop(
    listener: TcpListener,
    handle: ReceiverHandle,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("transport listener shutting down");
                return Ok(());
            }

            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let handle = handle.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, peer, handle).await {
                        tracing::debug!(peer = %peer, error = %e, "connection ended with error");
                    }
                });
            }
        }
    }
}

/// Run one sender connection to completion.
pub async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handle: ReceiverHandle,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ResponseEnvelope>();

    let sender = handle
        .connect(peer, outbound_tx)
        .await
        .context("receiver unavailable")?;
    tracing::debug!(sender = %sender, peer = %peer, "transport attached");

    let writer = tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            let line = match Frame::photos(&envelope).and_then(|frame| frame.encode()) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode response");
                    continue;
                }
            };
            write_half.write_all(line.as_bytes()).await?;
            write_half.write_all(b"\n").await?;
        }
        anyhow::Ok(())
    });

    let mut lines = BufReader::new(read_half).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(sender = %sender, error = %e, "read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match Inbound::decode(&line) {
            Ok(message) => {
                if handle.deliver(sender, message).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(sender = %sender, error = %e, "dropping undecodable frame"),
        }
    }

    // The runtime drops our outbound sender on disconnect, which ends the
    // writer once pending responses are flushed.
    if handle.disconnect(sender).is_err() {
        writer.abort();
    }
    match writer.await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
