//! fastphotos-core — wire protocol, asset validation, and configuration.
//! All other fastphotos crates depend on this one.

pub mod config;
pub mod protocol;
pub mod validate;

pub use protocol::{
    AssetDescriptor, AssetLocation, AssetType, Command, Inbound, MediaCommand, MediaLoadRequest,
    ResponseEnvelope, ResultCode, SenderId,
};
