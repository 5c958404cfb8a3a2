//! Docker remote API versions.

use std::{fmt, str::FromStr};

use crate::errors::*;

/// A Docker remote API version such as `1.41`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

/// The oldest API version the daemon is still expected to accept.
pub const MINIMUM_API_VERSION: ApiVersion = ApiVersion::new(1, 24);

/// The newest API version this client knows how to speak.
pub const LATEST_API_VERSION: ApiVersion = ApiVersion::new(1, 45);

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> ApiVersion {
        ApiVersion { major, minor }
    }

    /// Pick the version to use against a daemon that reports `server`.
    pub fn negotiate(server: Option<ApiVersion>) -> ApiVersion {
        match server {
            Some(server) => server.min(LATEST_API_VERSION),
            None => MINIMUM_API_VERSION,
        }
    }

    /// The URL prefix for requests pinned to this version.
    pub fn path_prefix(&self) -> String {
        format!("/v{}", self)
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<ApiVersion> {
        let invalid = || Error::from(ErrorKind::InvalidApiVersion(s.to_owned()));
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let mut parts = trimmed.splitn(2, '.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        Ok(ApiVersion::new(major, minor))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let v: ApiVersion = "1.41".parse().unwrap();
        assert_eq!(v, ApiVersion::new(1, 41));
        assert_eq!(v.to_string(), "1.41");
        assert_eq!("v1.24".parse::<ApiVersion>().unwrap(), MINIMUM_API_VERSION);
    }

    #[test]
    fn rejects_garbage() {
        for bad in &["", "1", "auto", "1.x", "one.two", "1.2.3"] {
            let err = bad.parse::<ApiVersion>().unwrap_err();
            match err.kind() {
                ErrorKind::InvalidApiVersion(v) => assert_eq!(v, bad),
                other => panic!("unexpected error for {:?}: {}", bad, other),
            }
        }
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(ApiVersion::new(1, 9) < ApiVersion::new(1, 10));
        assert!(ApiVersion::new(2, 0) > LATEST_API_VERSION);
    }

    #[test]
    fn negotiation_caps_at_latest() {
        assert_eq!(ApiVersion::negotiate(Some(ApiVersion::new(1, 43))), ApiVersion::new(1, 43));
        assert_eq!(ApiVersion::negotiate(Some(ApiVersion::new(1, 99))), LATEST_API_VERSION);
        assert_eq!(ApiVersion::negotiate(None), MINIMUM_API_VERSION);
    }

    #[test]
    fn prefix() {
        assert_eq!(ApiVersion::new(1, 41).path_prefix(), "/v1.41");
    }
}
