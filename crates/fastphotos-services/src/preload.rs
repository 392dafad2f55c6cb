//! Preload scheduler — warms the fetch path for upcoming images.
//!
//! Newest job first, one fetch at a time, no timeout and no responses. A new
//! job never interrupts the one in flight.

use crate::fetch::FetchOutcome;
use crate::job_stack::{ImageJob, JobStack};
use crate::status::SchedulerStatus;
use crate::surface::{FetchTicket, Lane, TaskRunner};

#[derive(Debug, Default)]
pub struct PreloadScheduler {
    stack: JobStack,
    in_flight: Option<(ImageJob, FetchTicket)>,
    generation: u64,
    completed: u64,
    failed: u64,
}

impl PreloadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: ImageJob, runner: &mut impl TaskRunner) {
        tracing::debug!(sender = %job.sender, url = %job.url(), "preload job queued");
        self.stack.push(job);
        if self.in_flight.is_none() {
            self.start_next(runner);
        }
    }

    fn start_next(&mut self, runner: &mut impl TaskRunner) {
        let Some(job) = self.stack.pop() else {
            return;
        };
        self.generation += 1;
        let ticket = FetchTicket {
            lane: Lane::Preload,
            generation: self.generation,
            url: job.url().to_string(),
        };
        tracing::debug!(url = %ticket.url, "preloading");
        runner.start_fetch(ticket.clone());
        self.in_flight = Some((job, ticket));
    }

    /// Record the outcome and move on to the next job. Stale tickets are
    /// ignored.
    pub fn on_fetch_complete(
        &mut self,
        ticket: &FetchTicket,
        outcome: FetchOutcome,
        runner: &mut impl TaskRunner,
    ) {
        if self.in_flight.as_ref().map(|(_, t)| t) != Some(ticket) {
            return;
        }
        let Some((mut job, _)) = self.in_flight.take() else {
            return;
        };
        match outcome {
            Ok(image) => {
                job.mark_success();
                self.completed += 1;
                tracing::debug!(url = %job.url(), bytes = image.bytes.len(), "successfully precached");
            }
            Err(err) => {
                job.mark_failure();
                self.failed += 1;
                tracing::debug!(url = %job.url(), error = %err, "failed precaching");
            }
        }
        self.start_next(runner);
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            loading_url: self.in_flight.as_ref().map(|(_, t)| t.url.clone()),
            queued: self.stack.len(),
        }
    }
}
