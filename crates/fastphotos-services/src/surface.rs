//! Collaborator seams — what the scheduling core needs from the outside.
//!
//! The core never touches sockets, timers, or pixels directly. It talks to a
//! [`Host`], which is any type that can present (display + playback), deliver
//! responses (transport), and run background work (fetches + timers).
//! Background work reports back through the owner of the host; the core
//! matches completions against the ticket it handed out and ignores stale ones.

use std::time::Duration;

use bytes::Bytes;
use fastphotos_core::{ResponseEnvelope, SenderId};
use serde::Serialize;

/// Viewport size reported by the display surface. Zero means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Placement of an image inside the viewport, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// A fetched and decoded-enough-to-measure image.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub url: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    pub bytes: Bytes,
}

/// Events raised by the playback surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Seek { current_time: f64 },
    Pause,
    TimeUpdate { current_time: f64 },
    Ended,
    MetadataError,
}

/// Which scheduler a fetch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    Foreground,
    Preload,
}

/// Handle for one fetch attempt. The generation is unique per lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub lane: Lane,
    pub generation: u64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    LoadTimeout,
    Degrade,
    Splash,
    SessionClose,
}

/// Handle for one armed single-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTicket {
    pub kind: TimerKind,
    pub generation: u64,
}

pub trait DisplaySurface {
    fn show_idle(&mut self);
    /// Switch to the image view without replacing what it shows.
    fn show_photo_view(&mut self);
    /// Replace the shown image and switch to the image view.
    fn show_image(&mut self, image: &LoadedImage, rect: LayoutRect);
    fn show_video(&mut self);
    fn show_spinner(&mut self, visible: bool);
    fn viewport_size(&self) -> Viewport;
    fn is_video_active(&self) -> bool;
}

pub trait PlaybackSurface {
    fn load(&mut self, url: &str);
    fn pause(&mut self);
    fn stop(&mut self);
}

pub trait Transport {
    fn send(&mut self, to: SenderId, envelope: &ResponseEnvelope);
}

/// Background work. Completions come back as events carrying the ticket.
pub trait TaskRunner {
    fn start_fetch(&mut self, ticket: FetchTicket);
    /// Fire-and-forget. A late completion may still arrive and must be ignored.
    fn abort_fetch(&mut self, ticket: &FetchTicket);
    fn arm_timer(&mut self, ticket: TimerTicket, after: Duration);
    fn cancel_timer(&mut self, ticket: TimerTicket);
}

/// Everything the handler drives.
pub trait Host: DisplaySurface + PlaybackSurface + Transport + TaskRunner {}

impl<T: DisplaySurface + PlaybackSurface + Transport + TaskRunner> Host for T {}

/// Display and playback backed by the same screen.
pub trait Screen: DisplaySurface + PlaybackSurface + Send {}

impl<T: DisplaySurface + PlaybackSurface + Send> Screen for T {}
