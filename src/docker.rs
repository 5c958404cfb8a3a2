use hyper::{client::Client, Body, Request, Response, Uri};
use log::{debug, info};
#[cfg(unix)]
use std::path::Path;
use std::{convert::TryFrom, time::Duration};

use crate::api_version::{ApiVersion, MINIMUM_API_VERSION};
use crate::connector::Connector;
use crate::env::DockerEnv;
use crate::errors::*;
use crate::host::{DockerHost, DEFAULT_DOCKER_HOST};
use crate::version::Version;

use serde::de::DeserializeOwned;

/// How long any single request may take, matching the usual Docker client
/// default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Used to build URLs.
enum UrlBuilder {
    Tcp(String),
    #[cfg(unix)]
    Local(String),
}

impl UrlBuilder {
    fn build_url(&self, path: &str) -> Result<Uri> {
        match self {
            Self::Tcp(base) => Ok(Uri::try_from(format!("{}{}", base, path))
                .map_err(|err| format!("cannot parse URL {}{}: {}", base, path, err))?),
            #[cfg(unix)]
            Self::Local(socket) => Ok(Uri::from(hyperlocal::Uri::new(socket, path))),
        }
    }
}

/// The body of a daemon error response.
#[derive(Deserialize)]
struct DaemonMessage {
    message: String,
}

/// Our Docker client.
pub struct Docker {
    client: Client<Connector, Body>,
    url_builder: UrlBuilder,
    api_version: ApiVersion,
    timeout: Duration,
}

impl Docker {
    /// Connect to the Docker daemon using the standard Docker
    /// configuration options.  This includes `DOCKER_HOST`,
    /// `DOCKER_TLS_VERIFY`, `DOCKER_CERT_PATH`, `DOCKER_CONFIG` and
    /// `DOCKER_API_VERSION`, and we try to interpret these as much like the
    /// standard `docker` client as possible.
    pub async fn connect_with_defaults() -> Result<Docker> {
        Docker::connect(&DockerEnv::from_process()).await
    }

    /// Connect using an explicit environment snapshot.
    ///
    /// Unless `DOCKER_API_VERSION` pins a version, this talks to the daemon
    /// to negotiate one, so an unreachable daemon is reported here.
    pub async fn connect(env: &DockerEnv) -> Result<Docker> {
        Docker::connect_with_timeout(env, DEFAULT_TIMEOUT).await
    }

    /// Like `connect`, but with a custom per-request timeout.
    pub async fn connect_with_timeout(env: &DockerEnv, timeout: Duration) -> Result<Docker> {
        let pinned = pinned_api_version(env.api_version.as_deref())?;

        let addr = env
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string());
        let host = DockerHost::parse(&addr, env.tls_verify)?;
        debug!("connecting to Docker at {}", host);

        // Dispatch to the correct connection function.
        let mkerr = || ErrorKind::CouldNotConnect(addr.clone());
        let mut docker = match &host {
            #[cfg(unix)]
            DockerHost::Unix(path) => Docker::connect_with_unix(path),
            #[cfg(not(unix))]
            DockerHost::Unix(_) => Err(ErrorKind::UnsupportedScheme(addr.clone()).into()),
            DockerHost::Tcp { .. } => Docker::connect_with_tcp(&host, env),
        }
        .chain_err(&mkerr)?;
        docker.timeout = timeout;

        docker.api_version = match pinned {
            Some(version) => {
                debug!("using pinned API version {}", version);
                version
            }
            None => match docker.negotiate_api_version().await {
                Ok(version) => version,
                // The daemon answered, so we did connect; report what it said.
                Err(err) if answered(&err) => return Err(err),
                Err(err) => return Err(err).chain_err(&mkerr),
            },
        };
        info!("connected to Docker at {} (API {})", host, docker.api_version);
        Ok(docker)
    }

    #[cfg(unix)]
    fn connect_with_unix(socket: &Path) -> Result<Docker> {
        let client = Client::builder().build(Connector::unix()?);
        Ok(Docker {
            client,
            url_builder: UrlBuilder::Local(socket.to_string_lossy().into_owned()),
            api_version: MINIMUM_API_VERSION,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    fn connect_with_tcp(host: &DockerHost, env: &DockerEnv) -> Result<Docker> {
        let base = host
            .base_url()
            .ok_or_else(|| ErrorKind::UnsupportedScheme(host.to_string()))?;

        #[cfg(feature = "tls")]
        let connector = Connector::tcp(env)?;
        #[cfg(not(feature = "tls"))]
        let connector = {
            let _ = env;
            if base.starts_with("https://") {
                return Err(ErrorKind::UnsupportedScheme(host.to_string()).into());
            }
            Connector::tcp()?
        };

        let client = Client::builder().build(connector);
        Ok(Docker {
            client,
            url_builder: UrlBuilder::Tcp(base),
            api_version: MINIMUM_API_VERSION,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// The API version every request is pinned to.
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Ask the daemon which API version it speaks, and settle on the
    /// newest one we both understand.
    async fn negotiate_api_version(&self) -> Result<ApiVersion> {
        let version: Version = self.decode_url("Version", "/version").await?;
        let server = match version.ApiVersion.trim() {
            "" => None,
            reported => Some(reported.parse::<ApiVersion>()?),
        };
        let negotiated = ApiVersion::negotiate(server);
        debug!(
            "daemon reports API {}, using {}",
            version.ApiVersion, negotiated
        );
        Ok(negotiated)
    }

    fn get_url(&self, path: &str) -> Result<Uri> {
        self.url_builder.build_url(path)
    }

    /// A path under our negotiated API version.
    fn versioned(&self, path: &str) -> String {
        format!("{}{}", self.api_version.path_prefix(), path)
    }

    fn build_empty_get_request(&self, request_url: &Uri) -> Result<Request<Body>> {
        Ok(Request::get(request_url)
            .body(Body::empty())
            .chain_err(|| "error building request")?)
    }

    async fn start_request(&self, request: Request<Body>) -> Result<Response<Body>> {
        let response = self.client.request(request).await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = hyper::body::to_bytes(response.into_body()).await?;
            let message = match serde_json::from_slice::<DaemonMessage>(&body) {
                Ok(msg) => msg.message,
                Err(_) => String::from_utf8_lossy(&body).trim().to_owned(),
            };
            Err(ErrorKind::Daemon(status, message).into())
        }
    }

    async fn execute_request(&self, request: Request<Body>) -> Result<Vec<u8>> {
        let work = async {
            let response = self.start_request(request).await?;
            let body = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, Error>(body.to_vec())
        };
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(ErrorKind::Timeout(self.timeout).into()),
        }
    }

    /// `GET` a URL and decode it.
    async fn decode_url<'a, T>(&'a self, type_name: &'static str, url: &'a str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request_url = self.get_url(url)?;
        let request = self.build_empty_get_request(&request_url)?;
        let body = self.execute_request(request).await?;
        let info = serde_json::from_slice::<T>(&body).chain_err(|| {
            ErrorKind::ParseError(type_name, String::from_utf8_lossy(&body[..]).into_owned())
        })?;
        Ok(info)
    }

    pub async fn ping(&self) -> Result<Vec<u8>> {
        let request_url = self.get_url(&self.versioned("/_ping"))?;
        let request = self.build_empty_get_request(&request_url)?;
        self.execute_request(request).await
    }

    pub async fn version(&self) -> Result<Version> {
        self.decode_url("Version", &self.versioned("/version")).await
    }
}

/// Did this error come from a daemon that we reached and that replied?
fn answered(err: &Error) -> bool {
    match err.kind() {
        ErrorKind::Daemon(..) | ErrorKind::ParseError(..) | ErrorKind::InvalidApiVersion(_) => true,
        _ => false,
    }
}

/// Interpret `DOCKER_API_VERSION`.  Unset, empty and `auto` all mean
/// "negotiate with the daemon".
fn pinned_api_version(value: Option<&str>) -> Result<Option<ApiVersion>> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) if v.eq_ignore_ascii_case("auto") => return Ok(None),
        Some(v) => v,
    };
    let version: ApiVersion = value.parse()?;
    if version < MINIMUM_API_VERSION {
        return Err(ErrorKind::InvalidApiVersion(format!(
            "{} (minimum supported is {})",
            value, MINIMUM_API_VERSION
        ))
        .into());
    }
    Ok(Some(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_and_auto_negotiate() {
        assert_eq!(pinned_api_version(None).unwrap(), None);
        assert_eq!(pinned_api_version(Some("")).unwrap(), None);
        assert_eq!(pinned_api_version(Some("auto")).unwrap(), None);
        assert_eq!(pinned_api_version(Some("AUTO")).unwrap(), None);
    }

    #[test]
    fn explicit_version_is_pinned() {
        assert_eq!(
            pinned_api_version(Some("1.41")).unwrap(),
            Some(ApiVersion::new(1, 41))
        );
    }

    #[test]
    fn too_old_version_is_rejected() {
        let err = pinned_api_version(Some("1.12")).unwrap_err();
        assert!(err.to_string().contains("minimum supported is 1.24"));
    }

    #[test]
    fn only_transport_errors_mean_no_connection() {
        let daemon: Error =
            ErrorKind::Daemon(hyper::StatusCode::BAD_GATEWAY, "bad gateway".to_owned()).into();
        assert!(answered(&daemon));
        let garbled: Error = ErrorKind::ParseError("Version", "<html>".to_owned()).into();
        assert!(answered(&garbled));
        let timeout: Error = ErrorKind::Timeout(DEFAULT_TIMEOUT).into();
        assert!(!answered(&timeout));
        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!answered(&io));
    }

    #[tokio::test]
    async fn unsupported_scheme_is_reported() {
        let env = DockerEnv {
            host: Some("ssh://me@docker.example.com".to_owned()),
            ..DockerEnv::default()
        };
        match Docker::connect(&env).await {
            Err(err) => match err.kind() {
                ErrorKind::UnsupportedScheme(_) => {}
                other => panic!("unexpected error: {}", other),
            },
            Ok(_) => panic!("connected over ssh?"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pinned_version_skips_the_daemon() {
        let env = DockerEnv {
            host: Some("unix:///nonexistent/docker.sock".to_owned()),
            api_version: Some("1.41".to_owned()),
            ..DockerEnv::default()
        };
        let docker = Docker::connect(&env).await.unwrap();
        assert_eq!(docker.api_version(), ApiVersion::new(1, 41));
        assert!(docker.version().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_socket_cannot_connect() {
        let env = DockerEnv {
            host: Some("unix:///nonexistent/docker.sock".to_owned()),
            ..DockerEnv::default()
        };
        match Docker::connect(&env).await {
            Err(err) => match err.kind() {
                ErrorKind::CouldNotConnect(host) => {
                    assert_eq!(host, "unix:///nonexistent/docker.sock")
                }
                other => panic!("unexpected error: {}", other),
            },
            Ok(_) => panic!("connected to a missing socket"),
        }
    }
}
