//! Per-title deep-link validation.

use crate::error::{JoinlinkError, Result};
use std::net::Ipv4Addr;
use url::Url;

/// Rejects deep links a title cannot act on.
pub trait UrlValidator: Send + Sync {
    fn validate(&self, url: &Url) -> Result<()>;
}

/// Requires an IPv4 host and an explicit port.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ipv4PortValidator;

impl UrlValidator for Ipv4PortValidator {
    fn validate(&self, url: &Url) -> Result<()> {
        let invalid = |message: &str| JoinlinkError::UrlValidation {
            url: url.to_string(),
            message: message.to_string(),
        };

        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        host.parse::<Ipv4Addr>()
            .map_err(|_| invalid("host is not an IPv4 address"))?;

        match url.port() {
            Some(port) if port > 0 => Ok(()),
            Some(_) => Err(invalid("port must be non-zero")),
            None => Err(invalid("missing port")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::parse_deep_link;

    fn validate(raw: &str) -> Result<()> {
        Ipv4PortValidator.validate(&parse_deep_link(raw).unwrap())
    }

    #[test]
    fn test_accepts_ipv4_and_port() {
        assert!(validate("bf2://1.2.3.4:16567").is_ok());
        assert!(validate("bf2://1.2.3.4:16567?mod=xpack").is_ok());
    }

    #[test]
    fn test_rejects_hostname() {
        let err = validate("bf2://not-an-ip:16567").unwrap_err();
        assert!(matches!(err, JoinlinkError::UrlValidation { .. }));
    }

    #[test]
    fn test_rejects_missing_or_zero_port() {
        assert!(validate("bf2://1.2.3.4").is_err());
        assert!(validate("bf2://1.2.3.4:0").is_err());
    }
}
