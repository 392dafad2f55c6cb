//! Recording host for unit tests.

use std::time::Duration;

use bytes::Bytes;
use fastphotos_core::{ResponseEnvelope, SenderId};

use crate::surface::{
    DisplaySurface, FetchTicket, Lane, LayoutRect, LoadedImage, PlaybackSurface, TaskRunner,
    TimerKind, TimerTicket, Transport, Viewport,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenCall {
    Idle,
    PhotoView,
    Image { url: String, rect: LayoutRect },
    Video,
    Spinner(bool),
}

#[derive(Debug)]
pub struct RecordingHost {
    pub viewport: Viewport,
    pub video_active: bool,
    pub spinner: bool,
    pub screen: Vec<ScreenCall>,
    pub loads: Vec<String>,
    pub pauses: usize,
    pub stops: usize,
    pub sent: Vec<(SenderId, ResponseEnvelope)>,
    pub started: Vec<FetchTicket>,
    pub aborted: Vec<FetchTicket>,
    pub armed: Vec<(TimerTicket, Duration)>,
    pub canceled: Vec<TimerTicket>,
    pub fired: Vec<TimerTicket>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            video_active: false,
            spinner: false,
            screen: Vec::new(),
            loads: Vec::new(),
            pauses: 0,
            stops: 0,
            sent: Vec::new(),
            started: Vec::new(),
            aborted: Vec::new(),
            armed: Vec::new(),
            canceled: Vec::new(),
            fired: Vec::new(),
        }
    }
}

impl RecordingHost {
    /// Fetches started on `lane`, in order.
    pub fn fetches(&self, lane: Lane) -> Vec<&FetchTicket> {
        self.started.iter().filter(|t| t.lane == lane).collect()
    }

    pub fn last_fetch(&self, lane: Lane) -> FetchTicket {
        self.fetches(lane)
            .last()
            .map(|t| (*t).clone())
            .expect("no fetch started")
    }

    /// Most recently armed timer of `kind`.
    pub fn last_timer(&self, kind: TimerKind) -> TimerTicket {
        self.armed
            .iter()
            .rev()
            .find(|(t, _)| t.kind == kind)
            .map(|(t, _)| *t)
            .expect("no timer armed")
    }

    /// Mark the latest timer of `kind` as expired and return it for delivery.
    pub fn fire(&mut self, kind: TimerKind) -> TimerTicket {
        let ticket = self.last_timer(kind);
        self.fired.push(ticket);
        ticket
    }

    /// Timers armed and neither canceled nor fired since.
    pub fn live_timers(&self, kind: TimerKind) -> Vec<TimerTicket> {
        self.armed
            .iter()
            .map(|(t, _)| *t)
            .filter(|t| t.kind == kind && !self.canceled.contains(t) && !self.fired.contains(t))
            .collect()
    }

    pub fn take_sent(&mut self) -> Vec<(SenderId, ResponseEnvelope)> {
        std::mem::take(&mut self.sent)
    }

    pub fn images(&self) -> Vec<&ScreenCall> {
        self.screen
            .iter()
            .filter(|c| matches!(c, ScreenCall::Image { .. }))
            .collect()
    }
}

pub fn image(url: &str, width: u32, height: u32) -> LoadedImage {
    LoadedImage {
        url: url.to_string(),
        width,
        height,
        bytes: Bytes::from_static(b"img"),
    }
}

impl DisplaySurface for RecordingHost {
    fn show_idle(&mut self) {
        self.video_active = false;
        self.spinner = false;
        self.screen.push(ScreenCall::Idle);
    }

    fn show_photo_view(&mut self) {
        self.video_active = false;
        self.spinner = false;
        self.screen.push(ScreenCall::PhotoView);
    }

    fn show_image(&mut self, image: &LoadedImage, rect: LayoutRect) {
        self.video_active = false;
        self.spinner = false;
        self.screen.push(ScreenCall::Image {
            url: image.url.clone(),
            rect,
        });
    }

    fn show_video(&mut self) {
        self.video_active = true;
        self.spinner = false;
        self.screen.push(ScreenCall::Video);
    }

    fn show_spinner(&mut self, visible: bool) {
        self.spinner = visible;
        self.screen.push(ScreenCall::Spinner(visible));
    }

    fn viewport_size(&self) -> Viewport {
        self.viewport
    }

    fn is_video_active(&self) -> bool {
        self.video_active
    }
}

impl PlaybackSurface for RecordingHost {
    fn load(&mut self, url: &str) {
        self.video_active = true;
        self.loads.push(url.to_string());
    }

    fn pause(&mut self) {
        self.pauses += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

impl Transport for RecordingHost {
    fn send(&mut self, to: SenderId, envelope: &ResponseEnvelope) {
        self.sent.push((to, envelope.clone()));
    }
}

impl TaskRunner for RecordingHost {
    fn start_fetch(&mut self, ticket: FetchTicket) {
        self.started.push(ticket);
    }

    fn abort_fetch(&mut self, ticket: &FetchTicket) {
        self.aborted.push(ticket.clone());
    }

    fn arm_timer(&mut self, ticket: TimerTicket, after: Duration) {
        self.armed.push((ticket, after));
    }

    fn cancel_timer(&mut self, ticket: TimerTicket) {
        self.canceled.push(ticket);
    }
}
