//! HTTP image fetcher.
//!
//! Downloads with a size cap and reads the image header for its natural
//! dimensions. Pixels are never decoded.

use std::io::Cursor;

use anyhow::Context;
use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::FutureExt;

use fastphotos_core::config::FetchConfig;
use fastphotos_services::{FetchError, FetchOutcome, Fetcher, LoadedImage};

pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            max_bytes: config.max_image_bytes,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, FetchOutcome> {
        get_image(self.client.clone(), url.to_string(), self.max_bytes).boxed()
    }
}

async fn get_image(client: reqwest::Client, url: String, max_bytes: u64) -> FetchOutcome {
    let mut response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    if response.content_length().is_some_and(|len| len > max_bytes) {
        return Err(FetchError::TooLarge { limit: max_bytes });
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?
    {
        if (body.len() + chunk.len()) as u64 > max_bytes {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    let bytes: Bytes = body.freeze();
    let (width, height) = decode_dimensions(&bytes)?;
    tracing::debug!(url = %url, width, height, bytes = bytes.len(), "image fetched");
    Ok(LoadedImage {
        url,
        width,
        height,
        bytes,
    })
}

/// Natural size from the image header.
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32), FetchError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FetchError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| FetchError::Decode(e.to_string()))
}
