//! Image fetching seam.

use futures::future::BoxFuture;

use crate::surface::LoadedImage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("server answered {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("image larger than {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("undecodable image: {0}")]
    Decode(String),
}

pub type FetchOutcome = Result<LoadedImage, FetchError>;

/// Fetches one image. Implementations must be cheap to call concurrently; the
/// runtime spawns each call on its own task and may abort it at any point.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> BoxFuture<'static, FetchOutcome>;
}
