//! Parsing `DOCKER_HOST` addresses.

use std::{fmt, path::PathBuf};
use url::Url;

use crate::errors::*;

/// The default `DOCKER_HOST` address that we will try to connect to.
#[cfg(unix)]
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// The default `DOCKER_HOST` address that we will try to connect to.
///
/// This should technically be `"npipe:////./pipe/docker_engine"` on
/// Windows, but we don't support Windows pipes.  However, the TCP port
/// is still available.
#[cfg(not(unix))]
pub const DEFAULT_DOCKER_HOST: &str = "tcp://localhost:2375";

/// Where the default Unix socket lives.
const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

const DEFAULT_HTTP_PORT: u16 = 2375;
const DEFAULT_TLS_PORT: u16 = 2376;

/// A parsed Docker daemon address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DockerHost {
    /// A local Unix socket.
    Unix(PathBuf),
    /// A TCP endpoint, optionally wrapped in TLS.
    Tcp { host: String, port: u16, tls: bool },
}

impl DockerHost {
    /// Parse a `DOCKER_HOST`-style address.  `tls_verify` decides whether
    /// a bare `tcp://` address speaks TLS, as it does for the `docker` CLI.
    pub fn parse(addr: &str, tls_verify: bool) -> Result<DockerHost> {
        if let Some(path) = addr.strip_prefix("unix://") {
            let path = if path.is_empty() { DEFAULT_SOCKET_PATH } else { path };
            return Ok(DockerHost::Unix(PathBuf::from(path)));
        }

        let tls = if addr.starts_with("tcp://") {
            tls_verify
        } else if addr.starts_with("https://") {
            true
        } else if addr.starts_with("http://") {
            false
        } else {
            return Err(ErrorKind::UnsupportedScheme(addr.to_owned()).into());
        };

        let url = Url::parse(addr)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ErrorKind::UnsupportedScheme(addr.to_owned()))?
            .to_owned();
        let port = url.port().unwrap_or(if tls {
            DEFAULT_TLS_PORT
        } else {
            DEFAULT_HTTP_PORT
        });
        Ok(DockerHost::Tcp { host, port, tls })
    }

    /// The base URL that hyper should send requests to.  Only meaningful
    /// for TCP hosts; Unix sockets build their URIs via `hyperlocal`.
    pub fn base_url(&self) -> Option<String> {
        match self {
            DockerHost::Unix(_) => None,
            DockerHost::Tcp { host, port, tls } => {
                let scheme = if *tls { "https" } else { "http" };
                Some(format!("{}://{}:{}", scheme, host, port))
            }
        }
    }
}

impl fmt::Display for DockerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DockerHost::Unix(path) => write!(f, "unix://{}", path.display()),
            DockerHost::Tcp { host, port, .. } => write!(f, "tcp://{}:{}", host, port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_socket() {
        assert_eq!(
            DockerHost::parse("unix:///tmp/docker.sock", false).unwrap(),
            DockerHost::Unix(PathBuf::from("/tmp/docker.sock"))
        );
        assert_eq!(
            DockerHost::parse("unix://", false).unwrap(),
            DockerHost::Unix(PathBuf::from("/var/run/docker.sock"))
        );
    }

    #[test]
    fn default_host_parses() {
        assert!(DockerHost::parse(DEFAULT_DOCKER_HOST, false).is_ok());
    }

    #[test]
    fn tcp_follows_tls_verify() {
        let plain = DockerHost::parse("tcp://127.0.0.1:2375", false).unwrap();
        assert_eq!(plain.base_url().unwrap(), "http://127.0.0.1:2375");

        let tls = DockerHost::parse("tcp://docker.example.com:2376", true).unwrap();
        assert_eq!(tls.base_url().unwrap(), "https://docker.example.com:2376");
        assert_eq!(tls.to_string(), "tcp://docker.example.com:2376");
    }

    #[test]
    fn default_ports() {
        assert_eq!(
            DockerHost::parse("tcp://docker.example.com", false).unwrap(),
            DockerHost::Tcp {
                host: "docker.example.com".to_owned(),
                port: 2375,
                tls: false
            }
        );
        assert_eq!(
            DockerHost::parse("tcp://docker.example.com", true).unwrap(),
            DockerHost::Tcp {
                host: "docker.example.com".to_owned(),
                port: 2376,
                tls: true
            }
        );
    }

    #[test]
    fn explicit_http_schemes() {
        let https = DockerHost::parse("https://localhost:9000", false).unwrap();
        assert_eq!(https.base_url().unwrap(), "https://localhost:9000");
        let http = DockerHost::parse("http://localhost:9000", true).unwrap();
        assert_eq!(http.base_url().unwrap(), "http://localhost:9000");
    }

    #[test]
    fn unsupported_schemes() {
        for addr in &["npipe:////./pipe/docker_engine", "ssh://me@box", "/var/run/docker.sock"] {
            match DockerHost::parse(addr, false).unwrap_err().kind() {
                ErrorKind::UnsupportedScheme(h) => assert_eq!(h, addr),
                other => panic!("unexpected error for {}: {}", addr, other),
            }
        }
    }
}
