//! The standard Docker client environment variables.

use std::{env, path::PathBuf};

/// A snapshot of the environment variables the `docker` CLI consults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DockerEnv {
    /// `DOCKER_HOST`, if set.
    pub host: Option<String>,
    /// True when `DOCKER_TLS_VERIFY` is set to anything but the empty string.
    pub tls_verify: bool,
    /// `DOCKER_CERT_PATH`, falling back to `DOCKER_CONFIG`.
    pub cert_path: Option<PathBuf>,
    /// `DOCKER_API_VERSION`, exactly as given.
    pub api_version: Option<String>,
}

impl DockerEnv {
    /// Read the current process environment.
    pub fn from_process() -> DockerEnv {
        DockerEnv::from_lookup(lossy_var)
    }

    /// Build a `DockerEnv` from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> DockerEnv
    where
        F: Fn(&str) -> Option<String>,
    {
        let tls_verify = lookup("DOCKER_TLS_VERIFY")
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        let cert_path = lookup("DOCKER_CERT_PATH")
            .or_else(|| lookup("DOCKER_CONFIG"))
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        DockerEnv {
            host: lookup("DOCKER_HOST").filter(|h| !h.is_empty()),
            tls_verify,
            cert_path,
            api_version: lookup("DOCKER_API_VERSION"),
        }
    }

    /// How `DOCKER_API_VERSION` is shown to the user.
    pub fn api_version_display(&self) -> &str {
        self.api_version.as_deref().unwrap_or("None")
    }
}

/// Read a variable, keeping it even when it isn't valid UTF-8.
fn lossy_var(key: &str) -> Option<String> {
    env::var_os(key).map(|v| v.to_string_lossy().into_owned())
}
