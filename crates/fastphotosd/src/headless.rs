//! Headless display and playback surfaces.
//!
//! Nothing is rendered. The screen keeps track of what would be visible and
//! logs every transition, which is enough to drive the receiver on a box with
//! no display attached.

use fastphotos_services::{DisplaySurface, LayoutRect, LoadedImage, PlaybackSurface, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    Splash,
    Photo,
    Video,
}

#[derive(Debug)]
pub struct HeadlessScreen {
    viewport: Viewport,
    mode: ScreenMode,
    spinner: bool,
    image: Option<(String, LayoutRect)>,
    stream_url: Option<String>,
    playing: bool,
}

impl HeadlessScreen {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            mode: ScreenMode::Splash,
            spinner: false,
            image: None,
            stream_url: None,
            playing: false,
        }
    }

    pub fn mode(&self) -> ScreenMode {
        self.mode
    }

    pub fn spinner(&self) -> bool {
        self.spinner
    }

    pub fn image(&self) -> Option<&(String, LayoutRect)> {
        self.image.as_ref()
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.stream_url.as_deref()
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    fn switch(&mut self, mode: ScreenMode) {
        if self.mode != mode {
            tracing::debug!(from = ?self.mode, to = ?mode, "screen mode");
            self.mode = mode;
        }
        self.spinner = false;
    }
}

impl DisplaySurface for HeadlessScreen {
    fn show_idle(&mut self) {
        self.switch(ScreenMode::Splash);
    }

    fn show_photo_view(&mut self) {
        self.switch(ScreenMode::Photo);
    }

    fn show_image(&mut self, image: &LoadedImage, rect: LayoutRect) {
        tracing::info!(
            url = %image.url,
            left = rect.left,
            top = rect.top,
            width = rect.width,
            height = rect.height,
            "showing image"
        );
        self.image = Some((image.url.clone(), rect));
        self.switch(ScreenMode::Photo);
    }

    fn show_video(&mut self) {
        self.switch(ScreenMode::Video);
    }

    fn show_spinner(&mut self, visible: bool) {
        if self.spinner != visible {
            tracing::debug!(visible, "spinner");
        }
        self.spinner = visible;
    }

    fn viewport_size(&self) -> Viewport {
        self.viewport
    }

    fn is_video_active(&self) -> bool {
        self.mode == ScreenMode::Video
    }
}

impl PlaybackSurface for HeadlessScreen {
    /// Loading a stream brings the player forward, spinner still up.
    fn load(&mut self, url: &str) {
        tracing::info!(url, "playback load");
        self.stream_url = Some(url.to_string());
        self.playing = true;
        let spinner = self.spinner;
        self.switch(ScreenMode::Video);
        self.spinner = spinner;
    }

    fn pause(&mut self) {
        if self.playing {
            tracing::debug!("playback paused");
        }
        self.playing = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.stream_url = None;
    }
}
