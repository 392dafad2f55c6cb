//! Status snapshots published by the receiver for the local API.

use fastphotos_core::SenderId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub loading_url: Option<String>,
    pub queued: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderStatus {
    pub id: SenderId,
    pub has_token: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiverStatus {
    pub senders: Vec<SenderStatus>,
    pub active_sender: Option<SenderId>,
    pub photos_shown: u64,
    pub videos_shown: u64,
    pub display_url: Option<String>,
    pub foreground: SchedulerStatus,
    pub preload: SchedulerStatus,
    pub preloads_completed: u64,
    pub preloads_failed: u64,
    pub stream_level: usize,
    pub stream_url: Option<String>,
}
