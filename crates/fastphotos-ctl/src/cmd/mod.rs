//! CLI command modules.

pub mod cast;
pub mod http;
pub mod status;
