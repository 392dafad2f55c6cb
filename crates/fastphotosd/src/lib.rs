//! fastphotosd — reference transport, fetcher, and surfaces for the receiver.

pub mod headless;
pub mod http_fetch;
pub mod transport;

pub use headless::{HeadlessScreen, ScreenMode};
pub use http_fetch::HttpFetcher;
