//! Deep-link parsing helpers.
//!
//! A deep link looks like `scheme://host:port?mod=x`. Parsing only checks
//! URL syntax; per-title rules live in the validators.

use crate::error::{JoinlinkError, Result};
use url::Url;

/// Parse a raw deep link. Surrounding quotes from the shell are stripped.
pub fn parse_deep_link(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_matches('"');
    let url = Url::parse(trimmed).map_err(|e| JoinlinkError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(JoinlinkError::InvalidUrl {
            url: raw.to_string(),
            message: "expected scheme://host:port".to_string(),
        });
    }
    Ok(url)
}

/// Synthetic link used for launch-only starts.
pub fn launch_only_link(scheme: &str) -> Result<Url> {
    parse_deep_link(&format!("{}://localhost", scheme))
}

/// Host and port of the server to join.
pub fn server_address(url: &Url) -> Result<(String, u16)> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| JoinlinkError::CommandBuild {
            message: format!("{} has no server host", url),
        })?;
    let port = url.port().ok_or_else(|| JoinlinkError::CommandBuild {
        message: format!("{} has no server port", url),
    })?;
    Ok((host.to_string(), port))
}

/// First value of a query parameter.
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
