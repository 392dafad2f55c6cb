//! Asset validation — the checks applied before any job is enqueued.

use url::Url;

use crate::protocol::{AssetDescriptor, AssetLocation, AssetType, ResultCode};

/// Validate an asset for display or precache.
///
/// Checks run in a fixed order: location, then type, then URL. The first
/// failure decides the result code.
pub fn validate_asset(asset: &AssetDescriptor) -> Result<(), ResultCode> {
    if asset.location != AssetLocation::Remote {
        return Err(ResultCode::InvalidAssetLocation);
    }
    if asset.asset_type != AssetType::Image {
        return Err(ResultCode::InvalidAssetType);
    }
    if !check_valid_url(&asset.url) {
        return Err(ResultCode::InvalidUrl);
    }
    Ok(())
}

/// A URL is accepted when its scheme is http(s) and its host name has at
/// least two dot-separated labels.
pub fn check_valid_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !check_valid_scheme(parsed.scheme()) {
        return false;
    }
    match parsed.host_str() {
        Some(host) => host.split('.').count() >= 2,
        None => false,
    }
}

fn check_valid_scheme(scheme: &str) -> bool {
    matches!(scheme, "http" | "https")
}
