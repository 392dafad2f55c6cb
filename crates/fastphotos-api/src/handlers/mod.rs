//! HTTP API handlers — exposes receiver state as JSON.

pub mod senders;
pub mod status;

use fastphotos_services::{ConnectionTable, ReceiverStatus};

#[derive(Clone)]
pub struct ApiState {
    /// Snapshot published by the receiver runtime after every event.
    pub status: tokio::sync::watch::Receiver<ReceiverStatus>,
    pub connections: ConnectionTable,
    /// Shutdown broadcast sender — signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

pub use senders::handle_senders;
pub use status::{handle_shutdown, handle_status};
