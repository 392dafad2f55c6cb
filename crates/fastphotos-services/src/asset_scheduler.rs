//! Foreground asset scheduler.
//!
//! Serves the newest display request first with at most one fetch in flight.
//! A request for the URL already loading waits for that fetch instead of
//! starting another. A request for any other URL aborts the fetch in flight;
//! the superseded job is dropped without a response.
//!
//! Every fetch is guarded by a load timeout. Completions and expiries carry
//! the ticket they were issued with, so anything that arrives after its fetch
//! was abandoned is ignored.

use std::time::Duration;

use fastphotos_core::SenderId;

use crate::fetch::FetchOutcome;
use crate::job_stack::{ImageJob, JobStack, Next};
use crate::layout::{aspect_fit, full_viewport};
use crate::status::SchedulerStatus;
use crate::surface::{FetchTicket, Host, Lane, LoadedImage, TimerKind, TimerTicket};

/// Jobs finished by one fetch, newest first, all carrying the same result.
#[derive(Debug)]
pub struct Completion {
    pub jobs: Vec<ImageJob>,
    /// Sender whose request put the image on screen, if it was shown.
    pub displayed_by: Option<SenderId>,
}

#[derive(Debug)]
struct InFlight {
    job: ImageJob,
    ticket: FetchTicket,
}

pub struct AssetScheduler {
    stack: JobStack,
    in_flight: Option<InFlight>,
    /// URL of the most recent display request.
    display_url: Option<String>,
    load_timeout: Duration,
    timeout: Option<TimerTicket>,
    generation: u64,
    photos_shown: u64,
}

impl AssetScheduler {
    pub fn new(load_timeout: Duration) -> Self {
        Self {
            stack: JobStack::new(),
            in_flight: None,
            display_url: None,
            load_timeout,
            timeout: None,
            generation: 0,
            photos_shown: 0,
        }
    }

    /// Record `url` as the one the screen should end up showing.
    pub fn request_display(&mut self, url: &str) {
        self.display_url = Some(url.to_string());
    }

    pub fn display_url(&self) -> Option<&str> {
        self.display_url.as_deref()
    }

    pub fn loading_url(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.ticket.url.as_str())
    }

    pub fn photos_shown(&self) -> u64 {
        self.photos_shown
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            loading_url: self.loading_url().map(str::to_string),
            queued: self.stack.len(),
        }
    }

    pub fn push(&mut self, job: ImageJob, host: &mut impl Host) {
        tracing::debug!(sender = %job.sender, url = %job.url(), "foreground job queued");
        self.stack.push(job);
        self.pump(host);
    }

    /// Look at the top of the stack and start, coalesce, or preempt.
    pub fn pump(&mut self, host: &mut impl Host) {
        let loading = self.in_flight.as_ref().map(|f| f.ticket.url.as_str());
        match self.stack.coalesce_or_preempt(loading) {
            Next::Idle => {}
            Next::Coalesced => {
                tracing::debug!(url = ?self.loading_url(), "request joins fetch in flight");
                // The request switched to the photo view, which hid the spinner.
                if self.display_url.as_deref() == self.loading_url() {
                    host.show_spinner(true);
                }
            }
            Next::Preempt(job) => {
                self.abandon_in_flight(host);
                self.start(job, host);
            }
            Next::Start(job) => self.start(job, host),
        }
    }

    fn start(&mut self, job: ImageJob, host: &mut impl Host) {
        if self.display_url.as_deref() == Some(job.url()) {
            host.show_spinner(true);
        }

        self.generation += 1;
        let timer = TimerTicket {
            kind: TimerKind::LoadTimeout,
            generation: self.generation,
        };
        if let Some(old) = self.timeout.replace(timer) {
            host.cancel_timer(old);
        }
        host.arm_timer(timer, self.load_timeout);

        let ticket = FetchTicket {
            lane: Lane::Foreground,
            generation: self.generation,
            url: job.url().to_string(),
        };
        tracing::info!(sender = %job.sender, url = %ticket.url, generation = ticket.generation, "loading image");
        host.start_fetch(ticket.clone());
        self.in_flight = Some(InFlight { job, ticket });
    }

    fn abandon_in_flight(&mut self, host: &mut impl Host) {
        self.clear_timeout(host);
        if let Some(InFlight { job, ticket }) = self.in_flight.take() {
            tracing::info!(sender = %job.sender, url = %ticket.url, "image load superseded");
            host.abort_fetch(&ticket);
        }
    }

    fn clear_timeout(&mut self, host: &mut impl Host) {
        if let Some(timer) = self.timeout.take() {
            host.cancel_timer(timer);
        }
    }

    /// Handle a finished fetch. Stale tickets return `None`.
    pub fn on_fetch_complete(
        &mut self,
        ticket: &FetchTicket,
        outcome: FetchOutcome,
        host: &mut impl Host,
    ) -> Option<Completion> {
        if self.in_flight.as_ref().map(|f| &f.ticket) != Some(ticket) {
            tracing::debug!(url = %ticket.url, generation = ticket.generation, "stale fetch completion ignored");
            return None;
        }
        let InFlight { mut job, .. } = self.in_flight.take()?;
        self.clear_timeout(host);

        let mut shown = false;
        match outcome {
            Ok(image) => {
                job.mark_success();
                if self.display_url.as_deref() == Some(job.url()) {
                    self.present(&image, host);
                    shown = true;
                }
                tracing::info!(url = %job.url(), shown, "image loaded");
            }
            Err(err) => {
                job.mark_failure();
                tracing::warn!(url = %job.url(), error = %err, "image load failed");
            }
        }

        let completion = self.settle(job, shown);
        self.pump(host);
        Some(completion)
    }

    /// Handle a load-timeout expiry. Stale tickets return `None`.
    pub fn on_timer(&mut self, ticket: TimerTicket, host: &mut impl Host) -> Option<Completion> {
        if self.timeout != Some(ticket) {
            return None;
        }
        self.timeout = None;
        let InFlight { mut job, ticket: fetch } = self.in_flight.take()?;

        tracing::warn!(sender = %job.sender, url = %fetch.url, "image load timed out");
        host.abort_fetch(&fetch);
        host.show_spinner(true);
        job.mark_timed_out();

        let completion = self.settle(job, false);
        self.pump(host);
        Some(completion)
    }

    /// Finish `job` together with every queued request for the same URL.
    fn settle(&mut self, job: ImageJob, shown: bool) -> Completion {
        let mut jobs = self.stack.drain_matching(job.url());
        for waiting in &mut jobs {
            waiting.result = job.result;
        }
        jobs.push(job);
        let displayed_by = if shown { jobs.first().map(|j| j.sender) } else { None };
        Completion { jobs, displayed_by }
    }

    fn present(&mut self, image: &LoadedImage, host: &mut impl Host) {
        let viewport = host.viewport_size();
        let rect = match aspect_fit(image.width, image.height, viewport) {
            Some(rect) => rect,
            None => {
                tracing::error!(
                    image_width = image.width,
                    image_height = image.height,
                    window_width = viewport.width,
                    window_height = viewport.height,
                    "cannot aspect-fit image, showing unscaled"
                );
                full_viewport(viewport)
            }
        };
        host.show_image(image, rect);
        self.photos_shown += 1;
    }
}
