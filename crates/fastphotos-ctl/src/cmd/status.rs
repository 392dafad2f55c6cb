//! Receiver status, senders, and shutdown commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, post_json};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    senders: Vec<SenderSummary>,
    active_sender: Option<u64>,
    photos_shown: u64,
    videos_shown: u64,
    display_url: Option<String>,
    foreground: SchedulerInfo,
    preload: SchedulerInfo,
    preloads_completed: u64,
    preloads_failed: u64,
    stream_level: usize,
    stream_url: Option<String>,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct SenderSummary {
    id: u64,
    has_token: bool,
    active: bool,
}

#[derive(Deserialize)]
struct SchedulerInfo {
    loading_url: Option<String>,
    queued: usize,
}

#[derive(Deserialize)]
struct SendersResponse {
    senders: Vec<SenderInfo>,
}

#[derive(Deserialize)]
struct SenderInfo {
    id: String,
    peer: String,
    connected_secs: u64,
    has_token: bool,
    active: bool,
}

#[derive(Deserialize)]
struct ShutdownResponse {
    message: String,
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  FastPhotos Receiver Status");
    println!("═══════════════════════════════════════");
    println!("  Senders          : {}", resp.senders.len());
    match resp.active_sender {
        Some(id) => println!("  Active sender    : sender-{}", id),
        None => println!("  Active sender    : -"),
    }
    println!("  Photos shown     : {}", resp.photos_shown);
    println!("  Videos shown     : {}", resp.videos_shown);
    println!("  Display URL      : {}", or_dash(&resp.display_url));

    println!("\n  Foreground:");
    println!("  ┌─ loading : {}", or_dash(&resp.foreground.loading_url));
    println!("  └─ queued  : {}", resp.foreground.queued);

    println!("\n  Preload:");
    println!("  ┌─ loading   : {}", or_dash(&resp.preload.loading_url));
    println!("  │  queued    : {}", resp.preload.queued);
    println!("  │  completed : {}", resp.preloads_completed);
    println!("  └─ failed    : {}", resp.preloads_failed);

    println!("\n  Stream:");
    println!("  ┌─ level : {}", resp.stream_level);
    println!("  └─ url   : {}", or_dash(&resp.stream_url));

    Ok(())
}

pub async fn cmd_senders(port: u16) -> Result<()> {
    let resp: SendersResponse = get_json(&format!("{}/senders", base_url(port))).await?;

    if resp.senders.is_empty() {
        println!("No senders connected.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Connected Senders ({})", resp.senders.len());
    println!("═══════════════════════════════════════");

    for s in &resp.senders {
        let marker = if s.active { "*" } else { " " };
        println!("  ┌─ {} {}", marker, s.id);
        println!("  │  peer      : {}", s.peer);
        println!("  │  token     : {}", if s.has_token { "yes" } else { "no" });
        println!("  └─ connected : {}s", s.connected_secs);
    }

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    let resp: ShutdownResponse =
        post_json(&format!("{}/daemon/shutdown", base_url(port))).await?;
    println!("{}", resp.message);
    Ok(())
}
