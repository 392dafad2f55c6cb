//! Image jobs and the LIFO stack they wait on.
//!
//! The newest request is always served first. [`JobStack::coalesce_or_preempt`]
//! is the one decision point between the stack and the fetch slot: a request
//! for the URL already loading waits for that fetch, anything else replaces it.

use fastphotos_core::{AssetDescriptor, ResultCode, SenderId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Foreground,
    Preload,
}

/// Outcome of a job. Terminal once it leaves `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobResult {
    Pending,
    Success,
    HttpError,
    TimedOut,
}

impl JobResult {
    /// The code reported to the sender, if the job has finished.
    pub fn result_code(self) -> Option<ResultCode> {
        match self {
            JobResult::Pending => None,
            JobResult::Success => Some(ResultCode::Success),
            JobResult::HttpError => Some(ResultCode::HttpRequestError),
            JobResult::TimedOut => Some(ResultCode::HttpRequestTimeout),
        }
    }
}

/// One request to fetch an image, owned by the scheduler whose stack holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJob {
    pub sender: SenderId,
    pub asset: AssetDescriptor,
    pub kind: JobKind,
    pub result: JobResult,
}

impl ImageJob {
    pub fn foreground(sender: SenderId, asset: AssetDescriptor) -> Self {
        Self {
            sender,
            asset,
            kind: JobKind::Foreground,
            result: JobResult::Pending,
        }
    }

    pub fn preload(sender: SenderId, asset: AssetDescriptor) -> Self {
        Self {
            kind: JobKind::Preload,
            ..Self::foreground(sender, asset)
        }
    }

    pub fn url(&self) -> &str {
        &self.asset.url
    }

    pub fn is_preload(&self) -> bool {
        self.kind == JobKind::Preload
    }

    pub fn mark_success(&mut self) {
        self.result = JobResult::Success;
    }

    pub fn mark_failure(&mut self) {
        self.result = JobResult::HttpError;
    }

    pub fn mark_timed_out(&mut self) {
        self.result = JobResult::TimedOut;
    }
}

/// What to do with the fetch slot after looking at the top of the stack.
#[derive(Debug, PartialEq)]
pub enum Next {
    /// Nothing queued.
    Idle,
    /// Top job wants the URL already loading. It stays on the stack.
    Coalesced,
    /// Slot is free; start this job.
    Start(ImageJob),
    /// Slot is busy with another URL; abandon it and start this job.
    Preempt(ImageJob),
}

/// Pending jobs, newest on top.
#[derive(Debug, Default)]
pub struct JobStack {
    jobs: Vec<ImageJob>,
}

impl JobStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: ImageJob) {
        self.jobs.push(job);
    }

    pub fn pop(&mut self) -> Option<ImageJob> {
        self.jobs.pop()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Iterate from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &ImageJob> {
        self.jobs.iter().rev()
    }

    /// Pop the top job and decide how it relates to the fetch in flight.
    pub fn coalesce_or_preempt(&mut self, in_flight_url: Option<&str>) -> Next {
        let Some(job) = self.jobs.pop() else {
            return Next::Idle;
        };
        match in_flight_url {
            Some(url) if url == job.url() => {
                self.jobs.push(job);
                Next::Coalesced
            }
            Some(_) => Next::Preempt(job),
            None => Next::Start(job),
        }
    }

    /// Remove every job waiting on `url`, newest first.
    pub fn drain_matching(&mut self, url: &str) -> Vec<ImageJob> {
        let mut drained = Vec::new();
        self.jobs.retain(|job| {
            if job.url() == url {
                drained.push(job.clone());
                false
            } else {
                true
            }
        });
        drained.reverse();
        drained
    }
}
