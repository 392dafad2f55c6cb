//! fastphotos-services — the receiver's scheduling core and its actor runtime.

pub mod asset_scheduler;
pub mod fetch;
pub mod handler;
pub mod job_stack;
pub mod layout;
pub mod preload;
pub mod runtime;
pub mod session;
pub mod status;
pub mod stream_quality;
pub mod surface;

#[cfg(test)]
mod testing;

pub use asset_scheduler::{AssetScheduler, Completion};
pub use fetch::{FetchError, FetchOutcome, Fetcher};
pub use handler::{ProtocolHandler, ReceiverSettings};
pub use job_stack::{ImageJob, JobKind, JobResult, JobStack, Next};
pub use preload::PreloadScheduler;
pub use runtime::{
    new_connection_table, Connection, ConnectionTable, ReceiverEvent, ReceiverHandle,
    ReceiverRuntime, RuntimeStopped,
};
pub use session::SessionRegistry;
pub use status::{ReceiverStatus, SchedulerStatus, SenderStatus};
pub use stream_quality::{StreamError, StreamQualityController, StreamSettings};
pub use surface::{
    DisplaySurface, FetchTicket, Host, Lane, LayoutRect, LoadedImage, PlaybackEvent,
    PlaybackSurface, Screen, TaskRunner, TimerKind, TimerTicket, Transport, Viewport,
};
