//! A `hyper` connection wrapper.

use futures::{FutureExt, TryFutureExt};
use hyper::{
    client::{
        connect::{Connected, Connection},
        HttpConnector,
    },
    service::Service,
    Uri,
};
#[cfg(feature = "tls")]
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
#[cfg(unix)]
use hyperlocal::UnixConnector;
#[cfg(feature = "tls")]
use log::{debug, warn};
#[cfg(feature = "tls")]
use rustls::{Certificate, ClientConfig, OwnedTrustAnchor, PrivateKey, RootCertStore};
#[cfg(feature = "tls")]
use std::{
    fs,
    path::{Path, PathBuf},
};
use std::{
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[cfg(feature = "tls")]
use crate::env::DockerEnv;
#[cfg(feature = "tls")]
use crate::errors::{ErrorKind, ResultExt};
use crate::errors::Error;

/// A more flexible `Result` type than `error-chain` generates.
type Result<T, E = Error> = std::result::Result<T, E>;

/// A wrapper for generic errors.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The connector we use for TCP, with or without TLS support compiled in.
#[cfg(feature = "tls")]
type TcpConnector = HttpsConnector<HttpConnector>;
#[cfg(not(feature = "tls"))]
type TcpConnector = HttpConnector;

/// The stream produced by `TcpConnector`.
type TcpStream = <TcpConnector as Service<Uri>>::Response;

/// The underlying stream type for `UnixConnector`, which isn't exported.
#[cfg(unix)]
type UnixStream = <UnixConnector as Service<Uri>>::Response;

/// A connector to either a TCP endpoint or a local Unix socket.
#[derive(Clone)]
pub(crate) enum Connector {
    /// Connect via HTTP, or HTTPS when TLS support is compiled in.
    Tcp(TcpConnector),

    /// Connect via a local Unix stream.
    #[cfg(unix)]
    Local(UnixConnector),
}

impl Connector {
    /// Configure a TCP connector that speaks both `http://` and `https://`.
    #[cfg(feature = "tls")]
    pub(crate) fn tcp(env: &DockerEnv) -> Result<Connector> {
        let config = tls_config(env)?;
        let https = HttpsConnectorBuilder::new()
            .with_tls_config(config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector());
        Ok(Connector::Tcp(https))
    }

    /// Configure a plain HTTP connector.
    #[cfg(not(feature = "tls"))]
    pub(crate) fn tcp() -> Result<Connector> {
        Ok(Connector::Tcp(http_connector()))
    }

    /// Configure a Unix socket connector.
    #[cfg(unix)]
    pub(crate) fn unix() -> Result<Connector> {
        Ok(Connector::Local(UnixConnector))
    }
}

fn http_connector() -> HttpConnector {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http
}

pub(crate) enum Stream {
    /// A TCP stream, possibly wrapped in TLS.
    Tcp(TcpStream),

    /// A local Unix stream.
    #[cfg(unix)]
    Local(UnixStream),
}

impl Connection for Stream {
    fn connected(&self) -> Connected {
        match self {
            Stream::Tcp(tcp) => tcp.connected(),
            #[cfg(unix)]
            Stream::Local(local) => local.connected(),
        }
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(tcp) => Pin::new(tcp).poll_read(cx, buf),
            #[cfg(unix)]
            Stream::Local(local) => Pin::new(local).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        match self.get_mut() {
            Stream::Tcp(tcp) => Pin::new(tcp).poll_write(cx, buf),
            #[cfg(unix)]
            Stream::Local(local) => Pin::new(local).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Stream::Tcp(tcp) => Pin::new(tcp).poll_flush(cx),
            #[cfg(unix)]
            Stream::Local(local) => Pin::new(local).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Stream::Tcp(tcp) => Pin::new(tcp).poll_shutdown(cx),
            #[cfg(unix)]
            Stream::Local(local) => Pin::new(local).poll_shutdown(cx),
        }
    }
}

impl Service<Uri> for Connector {
    type Response = Stream;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self {
            Connector::Tcp(tcp) => tcp.poll_ready(cx).map_err(BoxError::from),
            #[cfg(unix)]
            Connector::Local(local) => local.poll_ready(cx).map_err(BoxError::from),
        }
    }

    fn call(&mut self, req: Uri) -> Self::Future {
        match self {
            Connector::Tcp(tcp) => tcp
                .call(req)
                .map_ok(Stream::Tcp)
                .map_err(BoxError::from)
                .boxed(),
            #[cfg(unix)]
            Connector::Local(local) => local
                .call(req)
                .map_ok(Stream::Local)
                .map_err(BoxError::from)
                .boxed(),
        }
    }
}

/// Build our TLS configuration the same way the official CLI tools do:
/// system and webpki roots always, plus the Docker CA and client
/// certificate when `DOCKER_TLS_VERIFY` is set.
#[cfg(feature = "tls")]
fn tls_config(env: &DockerEnv) -> Result<ClientConfig> {
    let mut roots = RootCertStore::empty();

    // Look up any certs managed by the operating system.
    match rustls_native_certs::load_native_certs() {
        Ok(native) => {
            let native: Vec<Vec<u8>> = native.into_iter().map(|cert| cert.0).collect();
            let (_added, ignored) = roots.add_parsable_certificates(&native);
            if ignored > 0 {
                debug!("ignored {} unparsable native certificates", ignored);
            }
        }
        Err(err) => warn!("cannot access native certificate store: {}", err),
    }

    // Add any webpki certs, too, in case the OS is useless.
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));

    let builder = ClientConfig::builder().with_safe_defaults();
    if !env.tls_verify {
        return Ok(builder.with_root_certificates(roots).with_no_client_auth());
    }

    // Install our Docker CA.
    let dir = cert_dir(env)?;
    let ca_path = dir.join("ca.pem");
    for cert in certs(&ca_path)? {
        roots
            .add(&cert)
            .map_err(|err| format!("bad certificate in {}: {}", ca_path.display(), err))?;
    }
    let builder = builder.with_root_certificates(roots);

    // Present a client certificate if we have one.
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    if cert_path.exists() && key_path.exists() {
        let chain = certs(&cert_path)?;
        let key = single_key(&key_path)?;
        Ok(builder.with_client_auth_cert(chain, key)?)
    } else {
        debug!("no client certificate in {}", dir.display());
        Ok(builder.with_no_client_auth())
    }
}

/// The directory in which to look for our Docker certificate files.
#[cfg(feature = "tls")]
fn cert_dir(env: &DockerEnv) -> Result<PathBuf> {
    if let Some(path) = &env.cert_path {
        Ok(path.to_owned())
    } else {
        let home = dirs::home_dir().ok_or(ErrorKind::NoCertPath)?;
        Ok(home.join(".docker"))
    }
}

/// Fetch any certificates stored at `path`.
#[cfg(feature = "tls")]
fn certs(path: &Path) -> Result<Vec<Certificate>> {
    let mut rdr = open_buffered(path)?;
    let certs = rustls_pemfile::certs(&mut rdr)
        .chain_err(|| format!("cannot read {}", path.display()))?;
    Ok(certs.into_iter().map(Certificate).collect())
}

/// Fetch the one private key stored at `path`.
#[cfg(feature = "tls")]
fn single_key(path: &Path) -> Result<PrivateKey> {
    // Look for pkcs8 keys.
    let mut rdr = open_buffered(path)?;
    let mut keys = rustls_pemfile::pkcs8_private_keys(&mut rdr)
        .chain_err(|| format!("cannot read {}", path.display()))?;

    // Re-open and look for RSA keys.
    rdr = open_buffered(path)?;
    keys.extend(
        rustls_pemfile::rsa_private_keys(&mut rdr)
            .chain_err(|| format!("cannot read {}", path.display()))?,
    );

    if keys.len() == 1 {
        Ok(PrivateKey(keys.remove(0)))
    } else {
        Err(format!(
            "expected 1 private key in {}, found {}",
            path.display(),
            keys.len()
        )
        .into())
    }
}

/// Open a path and return a buffered reader.
#[cfg(feature = "tls")]
fn open_buffered(path: &Path) -> Result<io::BufReader<fs::File>> {
    let f = fs::File::open(path).chain_err(|| format!("cannot open {}", path.display()))?;
    Ok(io::BufReader::new(f))
}
