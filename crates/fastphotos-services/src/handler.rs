//! Protocol handler — owns all receiver state and reacts to one event at a time.
//!
//! The handler is synchronous and deterministic. Everything that touches the
//! outside world goes through its [`Host`]; everything that comes back
//! (fetch results, timer expiries, playback events) is fed in by the owner.

use std::collections::BTreeSet;
use std::time::Duration;

use fastphotos_core::config::FastPhotosConfig;
use fastphotos_core::protocol::NewAssetPayload;
use fastphotos_core::validate::validate_asset;
use fastphotos_core::{
    AssetDescriptor, Command, Inbound, MediaCommand, ResponseEnvelope, ResultCode, SenderId,
};
use tokio::time::Instant;

use crate::asset_scheduler::{AssetScheduler, Completion};
use crate::fetch::FetchOutcome;
use crate::job_stack::ImageJob;
use crate::preload::PreloadScheduler;
use crate::session::SessionRegistry;
use crate::status::{ReceiverStatus, SenderStatus};
use crate::stream_quality::{StreamQualityController, StreamSettings};
use crate::surface::{FetchTicket, Host, Lane, PlaybackEvent, TimerKind, TimerTicket};

/// Timing policy of the receiver.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverSettings {
    pub image_load_timeout: Duration,
    pub splash_delay: Duration,
    pub session_close_delay: Duration,
    pub stream: StreamSettings,
}

impl From<&FastPhotosConfig> for ReceiverSettings {
    fn from(config: &FastPhotosConfig) -> Self {
        Self {
            image_load_timeout: config.timing.image_load_timeout(),
            splash_delay: config.timing.splash_delay(),
            session_close_delay: config.timing.session_close_delay(),
            stream: StreamSettings::from(&config.stream),
        }
    }
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self::from(&FastPhotosConfig::default())
    }
}

pub struct ProtocolHandler<H> {
    host: H,
    registry: SessionRegistry,
    foreground: AssetScheduler,
    preload: PreloadScheduler,
    stream: StreamQualityController,
    settings: ReceiverSettings,
    splash: Option<TimerTicket>,
    session_close: Option<TimerTicket>,
    timer_generation: u64,
    exit_requested: bool,
}

impl<H: Host> ProtocolHandler<H> {
    pub fn new(host: H, settings: ReceiverSettings) -> Self {
        Self {
            host,
            registry: SessionRegistry::new(),
            foreground: AssetScheduler::new(settings.image_load_timeout),
            preload: PreloadScheduler::new(),
            stream: StreamQualityController::new(settings.stream, Instant::now()),
            settings,
            splash: None,
            session_close: None,
            timer_generation: 0,
            exit_requested: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Set once the session-close grace period has run out.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    fn next_timer(&mut self, kind: TimerKind) -> TimerTicket {
        self.timer_generation += 1;
        TimerTicket {
            kind,
            generation: self.timer_generation,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Show the start-up spinner and arm the splash timer.
    pub fn start(&mut self) {
        self.host.show_spinner(true);
        let ticket = self.next_timer(TimerKind::Splash);
        self.host.arm_timer(ticket, self.settings.splash_delay);
        self.splash = Some(ticket);
    }

    fn cancel_splash(&mut self) {
        if let Some(ticket) = self.splash.take() {
            self.host.cancel_timer(ticket);
        }
    }

    pub fn on_sender_connected(&mut self) -> SenderId {
        let id = self.registry.register_sender();
        tracing::info!(sender = %id, "sender connected");
        id
    }

    pub fn on_sender_disconnected(&mut self, id: SenderId) {
        let remaining = self.registry.unregister_sender(id);
        tracing::info!(sender = %id, remaining, "sender disconnected");
        if remaining == 0 && self.session_close.is_none() {
            let ticket = self.next_timer(TimerKind::SessionClose);
            self.host.arm_timer(ticket, self.settings.session_close_delay);
            self.session_close = Some(ticket);
        }
    }

    /// Stop playback and log the session counters.
    pub fn finish(&mut self) {
        self.host.stop();
        tracing::info!(
            photos_shown = self.foreground.photos_shown(),
            videos_shown = self.stream.videos_shown(),
            preloads_completed = self.preload.completed(),
            preloads_failed = self.preload.failed(),
            "session ended"
        );
    }

    // ── Inbound messages ──────────────────────────────────────────────────────

    pub fn on_inbound(&mut self, sender: SenderId, message: Inbound) {
        match message {
            Inbound::Photos(command) => self.on_command(sender, command),
            Inbound::Media(command) => self.on_media(sender, command),
        }
    }

    pub fn on_command(&mut self, sender: SenderId, command: Command) {
        tracing::debug!(sender = %sender, name = command.name(), "received command");
        match command {
            Command::NewSession { session_token } => self.new_session(sender, session_token),
            Command::InvalidateSession {} => self.invalidate_session(sender),
            Command::NewAsset { payload } => self.new_asset(sender, payload),
            Command::PrecacheAssets { payload } => {
                if !self.precache_assets(sender, payload.precache.as_deref()) {
                    tracing::debug!(sender = %sender, "no urls to precache");
                }
            }
        }
    }

    fn new_session(&mut self, sender: SenderId, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.registry.set_token(sender, token);
        }
        let viewport = self.host.viewport_size();
        if viewport.width == 0 || viewport.height == 0 {
            tracing::error!(
                window_width = viewport.width,
                window_height = viewport.height,
                "invalid window size"
            );
        }
        self.host
            .send(sender, &ResponseEnvelope::session(viewport.width, viewport.height));
    }

    fn invalidate_session(&mut self, sender: SenderId) {
        if self.registry.is_active(sender) {
            self.host.pause();
            self.host.show_idle();
        }
        self.registry.clear_token(sender);
    }

    fn new_asset(&mut self, sender: SenderId, payload: NewAssetPayload) {
        self.cancel_splash();
        let NewAssetPayload { asset, precache } = payload;

        if let Err(code) = validate_asset(&asset) {
            tracing::info!(sender = %sender, url = %asset.url, result = %code, "asset rejected");
            self.host.send(sender, &ResponseEnvelope::asset_result(code, asset));
            return;
        }

        self.foreground.request_display(&asset.url);
        self.host.pause();
        self.host.show_photo_view();
        self.foreground
            .push(ImageJob::foreground(sender, asset), &mut self.host);

        self.precache_assets(sender, precache.as_deref());
    }

    /// Queue the first precache entry, if valid. Returns whether a non-empty
    /// precache list was present.
    pub fn precache_assets(&mut self, sender: SenderId, precache: Option<&[AssetDescriptor]>) -> bool {
        let Some(first) = precache.and_then(|list| list.first()) else {
            return false;
        };
        match validate_asset(first) {
            Ok(()) => self
                .preload
                .push(ImageJob::preload(sender, first.clone()), &mut self.host),
            Err(code) => {
                tracing::debug!(sender = %sender, url = %first.url, result = %code, "precache asset rejected");
            }
        }
        true
    }

    pub fn on_media(&mut self, sender: SenderId, command: MediaCommand) {
        match command {
            MediaCommand::Load(request) => {
                self.cancel_splash();
                if let Err(err) = self.stream.on_load(&request, Instant::now(), &mut self.host) {
                    tracing::error!(sender = %sender, content_id = %request.media.content_id, error = %err, "video load abandoned");
                }
            }
        }
    }

    // ── Background completions ────────────────────────────────────────────────

    pub fn on_playback(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Seek { current_time } => self.stream.on_seek(current_time, &mut self.host),
            PlaybackEvent::Pause => self.stream.on_pause(&mut self.host),
            PlaybackEvent::TimeUpdate { current_time } => {
                self.stream.on_time_update(current_time, &mut self.host)
            }
            PlaybackEvent::Ended => self.stream.on_ended(&mut self.host),
            PlaybackEvent::MetadataError => self.stream.on_metadata_error(&mut self.host),
        }
    }

    pub fn on_fetch_complete(&mut self, ticket: FetchTicket, outcome: FetchOutcome) {
        match ticket.lane {
            Lane::Foreground => {
                if let Some(done) = self
                    .foreground
                    .on_fetch_complete(&ticket, outcome, &mut self.host)
                {
                    self.report(done);
                }
            }
            Lane::Preload => self
                .preload
                .on_fetch_complete(&ticket, outcome, &mut self.host),
        }
    }

    pub fn on_timer(&mut self, ticket: TimerTicket) {
        match ticket.kind {
            TimerKind::LoadTimeout => {
                if let Some(done) = self.foreground.on_timer(ticket, &mut self.host) {
                    self.report(done);
                }
            }
            TimerKind::Degrade => {
                self.stream
                    .on_degrade_timeout(ticket, Instant::now(), &mut self.host)
            }
            TimerKind::Splash => {
                if self.splash == Some(ticket) {
                    self.splash = None;
                    self.host.show_idle();
                }
            }
            TimerKind::SessionClose => {
                if self.session_close == Some(ticket) {
                    self.session_close = None;
                    tracing::info!("last sender gone, closing session");
                    self.exit_requested = true;
                }
            }
        }
    }

    /// Fan a finished foreground fetch out to the connected senders.
    ///
    /// Each originator still connected gets its result with the asset. Every
    /// other sender hears a bare `newAsset` notice, only on success.
    fn report(&mut self, done: Completion) {
        let mut originators = BTreeSet::new();
        let mut succeeded = false;
        for job in &done.jobs {
            let Some(code) = job.result.result_code() else {
                continue;
            };
            succeeded |= code == ResultCode::Success;
            originators.insert(job.sender);
            if self.registry.contains(job.sender) {
                self.host
                    .send(job.sender, &ResponseEnvelope::asset_result(code, job.asset.clone()));
            }
        }

        if succeeded {
            let notice = ResponseEnvelope::new_asset_notice();
            let others: Vec<SenderId> = self
                .registry
                .senders()
                .filter(|id| !originators.contains(id))
                .collect();
            for id in others {
                self.host.send(id, &notice);
            }
        }

        if let Some(sender) = done.displayed_by {
            self.registry.set_active(sender);
        }
    }

    // ── Status ────────────────────────────────────────────────────────────────

    pub fn status(&self) -> ReceiverStatus {
        let active = self.registry.active();
        ReceiverStatus {
            senders: self
                .registry
                .senders()
                .map(|id| SenderStatus {
                    id,
                    has_token: self.registry.token(id).is_some(),
                    active: active == Some(id),
                })
                .collect(),
            active_sender: active,
            photos_shown: self.foreground.photos_shown(),
            videos_shown: self.stream.videos_shown(),
            display_url: self.foreground.display_url().map(str::to_string),
            foreground: self.foreground.status(),
            preload: self.preload.status(),
            preloads_completed: self.preload.completed(),
            preloads_failed: self.preload.failed(),
            stream_level: self.stream.level(),
            stream_url: self.stream.current_url().map(str::to_string),
        }
    }
}
