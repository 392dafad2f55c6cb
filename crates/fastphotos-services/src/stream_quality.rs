//! Adaptive stream quality for video playback.
//!
//! Senders supply a ranked list of stream URLs with every load, best first.
//! The controller remembers a quality level across loads. A stream that shows
//! no playback progress before the degrade timer fires is replaced with the
//! next one down. After a quiet period without changes the best stream is
//! tried again.

use std::time::Duration;

use fastphotos_core::config::StreamConfig;
use fastphotos_core::MediaLoadRequest;
use tokio::time::Instant;

use crate::surface::{Host, TimerKind, TimerTicket};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("load request carries no streams")]
    MissingStreams,
}

#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub degrade_timeout: Duration,
    pub quality_reset: Duration,
    pub progress_threshold: Duration,
}

impl From<&StreamConfig> for StreamSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            degrade_timeout: config.degrade_timeout(),
            quality_reset: config.quality_reset(),
            progress_threshold: config.progress_threshold(),
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

pub struct StreamQualityController {
    level: usize,
    last_change: Instant,
    streams: Vec<String>,
    last_video_time: f64,
    degrade: Option<TimerTicket>,
    generation: u64,
    videos_shown: u64,
    settings: StreamSettings,
}

impl StreamQualityController {
    pub fn new(settings: StreamSettings, now: Instant) -> Self {
        Self {
            level: 0,
            last_change: now,
            streams: Vec::new(),
            last_video_time: 0.0,
            degrade: None,
            generation: 0,
            videos_shown: 0,
            settings,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn videos_shown(&self) -> u64 {
        self.videos_shown
    }

    /// Stream currently selected, if a load has been accepted.
    pub fn current_url(&self) -> Option<&str> {
        self.streams
            .get(self.level)
            .or_else(|| self.streams.last())
            .map(String::as_str)
    }

    fn is_lowest_quality(&self) -> bool {
        self.level + 1 >= self.streams.len()
    }

    /// Start playback of `request`, substituting the stream for the current
    /// quality level. Returns the URL handed to the playback surface.
    pub fn on_load(
        &mut self,
        request: &MediaLoadRequest,
        now: Instant,
        host: &mut impl Host,
    ) -> Result<String, StreamError> {
        host.show_spinner(true);
        self.last_video_time = 0.0;

        let Some(streams) = parse_streams(request) else {
            // The previous video must not be degraded on behalf of this load.
            self.cancel_degrade(host);
            return Err(StreamError::MissingStreams);
        };
        self.streams = streams;

        // Fewer streams than last time.
        if self.level >= self.streams.len() {
            self.level = self.streams.len() - 1;
        }
        if now.duration_since(self.last_change) > self.settings.quality_reset {
            tracing::debug!(from = self.level, "stream quality reset");
            self.level = 0;
            self.last_change = now;
        }

        let url = self.load_current(host)?;
        self.videos_shown += 1;
        tracing::info!(
            content_id = %request.media.content_id,
            url = %url,
            level = self.level,
            streams = self.streams.len(),
            "loading video"
        );
        Ok(url)
    }

    fn load_current(&mut self, host: &mut impl Host) -> Result<String, StreamError> {
        let url = self
            .current_url()
            .map(str::to_string)
            .ok_or(StreamError::MissingStreams)?;
        host.load(&url);
        self.cancel_degrade(host);
        if !self.is_lowest_quality() {
            self.generation += 1;
            let ticket = TimerTicket {
                kind: TimerKind::Degrade,
                generation: self.generation,
            };
            host.arm_timer(ticket, self.settings.degrade_timeout);
            self.degrade = Some(ticket);
        }
        Ok(url)
    }

    fn cancel_degrade(&mut self, host: &mut impl Host) {
        if let Some(ticket) = self.degrade.take() {
            host.cancel_timer(ticket);
        }
    }

    /// Degrade timer fired: drop one quality level if video is still on screen.
    pub fn on_degrade_timeout(&mut self, ticket: TimerTicket, now: Instant, host: &mut impl Host) {
        if self.degrade != Some(ticket) {
            return;
        }
        self.degrade = None;
        if !host.is_video_active() {
            return;
        }

        self.level += 1;
        self.last_change = now;
        self.last_video_time = 0.0;
        match self.load_current(host) {
            Ok(url) => tracing::info!(level = self.level, url = %url, "stream degraded"),
            Err(err) => tracing::error!(error = %err, "cannot degrade stream"),
        }
    }

    pub fn on_time_update(&mut self, current_time: f64, host: &mut impl Host) {
        if current_time - self.last_video_time > self.settings.progress_threshold.as_secs_f64() {
            self.cancel_degrade(host);
            host.show_video();
        }
    }

    pub fn on_seek(&mut self, current_time: f64, host: &mut impl Host) {
        self.last_video_time = current_time;
        host.show_spinner(true);
    }

    pub fn on_pause(&mut self, host: &mut impl Host) {
        host.show_spinner(false);
    }

    pub fn on_metadata_error(&mut self, host: &mut impl Host) {
        tracing::warn!(url = ?self.current_url(), "video metadata failed to load");
        self.cancel_degrade(host);
    }

    /// Playback finished: fall back to the still image.
    pub fn on_ended(&mut self, host: &mut impl Host) {
        self.cancel_degrade(host);
        host.show_photo_view();
    }
}

fn parse_streams(request: &MediaLoadRequest) -> Option<Vec<String>> {
    let streams: Vec<String> = request
        .custom_data
        .as_ref()?
        .get("streams")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    if streams.is_empty() {
        None
    } else {
        Some(streams)
    }
}
