//! Wire protocol — inbound command frames and outbound response envelopes.
//!
//! Every line on the transport is a JSON [`Frame`]: `{"namespace", "data"}`.
//! The photos namespace carries the four receiver commands; the media
//! namespace carries `LOAD` requests for the playback surface.
//!
//! Responses are always [`ResponseEnvelope`]s on the photos namespace. The
//! `payload` key is omitted entirely when there is nothing to report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace of the photos command channel.
pub const PHOTOS_NAMESPACE: &str = "urn:x-cast:com.speedy-cast.fastphotos";

/// Namespace of the media (playback) channel.
pub const MEDIA_NAMESPACE: &str = "urn:x-cast:com.google.cast.media";

/// Version stamped on every outbound envelope.
pub const PROTOCOL_VERSION: u32 = 1;

/// Well-known message names.
pub mod names {
    pub const NEW_SESSION: &str = "newSession";
    pub const INVALIDATE_SESSION: &str = "invalidateSession";
    pub const NEW_ASSET: &str = "newAsset";
    pub const PRECACHE_ASSETS: &str = "precacheAssets";

    pub const ALL: [&str; 4] = [NEW_SESSION, INVALIDATE_SESSION, NEW_ASSET, PRECACHE_ASSETS];
}

// ── Senders ───────────────────────────────────────────────────────────────────

/// Identifier assigned to a connected sender. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(pub u64);

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sender-{}", self.0)
    }
}

// ── Assets ────────────────────────────────────────────────────────────────────

/// Where an asset lives. Unknown values are kept verbatim so they can be
/// echoed back in the error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetLocation {
    Remote,
    Other(String),
}

impl Default for AssetLocation {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for AssetLocation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "remote" => Self::Remote,
            _ => Self::Other(value),
        }
    }
}

impl From<AssetLocation> for String {
    fn from(value: AssetLocation) -> Self {
        match value {
            AssetLocation::Remote => "remote".to_string(),
            AssetLocation::Other(s) => s,
        }
    }
}

/// Kind of asset. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    Image,
    Video,
    Other(String),
}

impl Default for AssetType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for AssetType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Other(value),
        }
    }
}

impl From<AssetType> for String {
    fn from(value: AssetType) -> Self {
        match value {
            AssetType::Image => "image".to_string(),
            AssetType::Video => "video".to_string(),
            AssetType::Other(s) => s,
        }
    }
}

/// A remote asset as described by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    #[serde(default)]
    pub location: AssetLocation,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    #[serde(default)]
    pub url: String,
}

impl AssetDescriptor {
    pub fn remote_image(url: impl Into<String>) -> Self {
        Self {
            location: AssetLocation::Remote,
            asset_type: AssetType::Image,
            url: url.into(),
        }
    }

    pub fn remote_video(url: impl Into<String>) -> Self {
        Self {
            location: AssetLocation::Remote,
            asset_type: AssetType::Video,
            url: url.into(),
        }
    }
}

// ── Inbound commands ──────────────────────────────────────────────────────────

/// `newAsset` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssetPayload {
    pub asset: AssetDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precache: Option<Vec<AssetDescriptor>>,
}

/// `precacheAssets` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecachePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precache: Option<Vec<AssetDescriptor>>,
}

/// A command on the photos namespace, discriminated by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Command {
    #[serde(rename = "newSession")]
    NewSession {
        #[serde(rename = "sessionToken", default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },
    #[serde(rename = "invalidateSession")]
    InvalidateSession {},
    #[serde(rename = "newAsset")]
    NewAsset { payload: NewAssetPayload },
    #[serde(rename = "precacheAssets")]
    PrecacheAssets {
        #[serde(default)]
        payload: PrecachePayload,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::NewSession { .. } => names::NEW_SESSION,
            Command::InvalidateSession {} => names::INVALIDATE_SESSION,
            Command::NewAsset { .. } => names::NEW_ASSET,
            Command::PrecacheAssets { .. } => names::PRECACHE_ASSETS,
        }
    }
}

/// Media descriptor inside a `LOAD` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(rename = "contentId")]
    pub content_id: String,
    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A video load request. `customData.streams` holds the ranked stream URLs,
/// highest quality first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaLoadRequest {
    pub media: MediaInfo,
    #[serde(rename = "customData", default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
}

impl MediaLoadRequest {
    /// Build a request carrying a ranked stream list.
    pub fn with_streams(content_id: impl Into<String>, streams: &[&str]) -> Self {
        Self {
            media: MediaInfo {
                content_id: content_id.into(),
                content_type: None,
            },
            custom_data: Some(serde_json::json!({ "streams": streams })),
        }
    }
}

/// A command on the media namespace, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaCommand {
    Load(MediaLoadRequest),
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Photos(Command),
    Media(MediaCommand),
}

impl Inbound {
    /// Decode one transport line.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let frame: Frame = serde_json::from_str(line).map_err(ProtocolError::Malformed)?;
        match frame.namespace.as_str() {
            PHOTOS_NAMESPACE => {
                let name = frame
                    .data
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                if !names::ALL.contains(&name.as_str()) {
                    return Err(ProtocolError::UnknownCommand(name));
                }
                serde_json::from_value(frame.data)
                    .map(Inbound::Photos)
                    .map_err(|source| ProtocolError::InvalidCommand { name, source })
            }
            MEDIA_NAMESPACE => serde_json::from_value(frame.data)
                .map(Inbound::Media)
                .map_err(|source| ProtocolError::InvalidCommand {
                    name: "media".to_string(),
                    source,
                }),
            other => Err(ProtocolError::UnknownNamespace(other.to_string())),
        }
    }

    /// Encode as one transport line (no trailing newline).
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let (namespace, data) = match self {
            Inbound::Photos(cmd) => (PHOTOS_NAMESPACE, serde_json::to_value(cmd)),
            Inbound::Media(cmd) => (MEDIA_NAMESPACE, serde_json::to_value(cmd)),
        };
        let data = data.map_err(ProtocolError::Encode)?;
        Frame {
            namespace: namespace.to_string(),
            data,
        }
        .encode()
    }
}

/// Raw transport frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub namespace: String,
    pub data: serde_json::Value,
}

impl Frame {
    /// Wrap a response envelope for the photos namespace.
    pub fn photos(envelope: &ResponseEnvelope) -> Result<Self, ProtocolError> {
        Ok(Self {
            namespace: PHOTOS_NAMESPACE.to_string(),
            data: serde_json::to_value(envelope).map_err(ProtocolError::Encode)?,
        })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

// ── Outbound responses ────────────────────────────────────────────────────────

/// Result strings reported to senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "invalidUrl")]
    InvalidUrl,
    #[serde(rename = "invalidAssetTypeError")]
    InvalidAssetType,
    #[serde(rename = "invalidAssetLocationError")]
    InvalidAssetLocation,
    #[serde(rename = "HTTPRequestError")]
    HttpRequestError,
    #[serde(rename = "HTTPRequestTimeoutError")]
    HttpRequestTimeout,
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Success)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Success => "success",
            ResultCode::InvalidUrl => "invalidUrl",
            ResultCode::InvalidAssetType => "invalidAssetTypeError",
            ResultCode::InvalidAssetLocation => "invalidAssetLocationError",
            ResultCode::HttpRequestError => "HTTPRequestError",
            ResultCode::HttpRequestTimeout => "HTTPRequestTimeoutError",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message-specific response payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Session {
        result: ResultCode,
        #[serde(rename = "windowWidth")]
        window_width: u32,
        #[serde(rename = "windowHeight")]
        window_height: u32,
    },
    Asset {
        result: ResultCode,
        asset: AssetDescriptor,
    },
}

/// Envelope for every response sent to a sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub name: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ResponsePayload>,
}

impl ResponseEnvelope {
    /// Envelope with no payload.
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: PROTOCOL_VERSION,
            payload: None,
        }
    }

    pub fn with_payload(name: &str, payload: ResponsePayload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::bare(name)
        }
    }

    /// `newSession` reply carrying the viewport size.
    pub fn session(window_width: u32, window_height: u32) -> Self {
        Self::with_payload(
            names::NEW_SESSION,
            ResponsePayload::Session {
                result: ResultCode::Success,
                window_width,
                window_height,
            },
        )
    }

    /// `newAsset` reply to the originating sender.
    pub fn asset_result(result: ResultCode, asset: AssetDescriptor) -> Self {
        Self::with_payload(names::NEW_ASSET, ResponsePayload::Asset { result, asset })
    }

    /// `newAsset` notice for non-originating senders.
    pub fn new_asset_notice() -> Self {
        Self::bare(names::NEW_ASSET)
    }

    /// The result code, if the payload carries one.
    pub fn result(&self) -> Option<ResultCode> {
        match &self.payload {
            Some(ResponsePayload::Session { result, .. })
            | Some(ResponsePayload::Asset { result, .. }) => Some(*result),
            None => None,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(serde_json::Error),
    #[error("unknown namespace {0:?}")]
    UnknownNamespace(String),
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("invalid {name} command: {source}")]
    InvalidCommand {
        name: String,
        source: serde_json::Error,
    },
    #[error("failed to encode frame: {0}")]
    Encode(serde_json::Error),
}
