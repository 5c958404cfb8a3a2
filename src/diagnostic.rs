//! The one-shot connectivity report.
//!
//! Writes, in order:
//!
//! ```text
//! DOCKER_API_VERSION env: <value or None>
//! Client API version: <negotiated version>
//! <the daemon's /version record as one line of JSON>
//! Success!
//! ```
//!
//! Any failure after the first line replaces the rest with a single
//! `Error: ...` line.  Failures are reported, never returned.

use log::warn;
use std::io::{self, Write};
use std::time::Duration;

use crate::docker::{Docker, DEFAULT_TIMEOUT};
use crate::env::DockerEnv;
use crate::errors::*;
use crate::version::Version;

/// How a diagnostic run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// We talked to the daemon and got its version record.
    Success(Version),
    /// Something went wrong; this is the message we printed.
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Run the diagnostic against the daemon described by `env`, writing the
/// report to `out`.  Only errors writing to `out` are returned.
pub async fn run<W: Write>(env: &DockerEnv, out: &mut W) -> io::Result<Outcome> {
    run_with_timeout(env, DEFAULT_TIMEOUT, out).await
}

/// Like `run`, but with a custom per-request timeout.
pub async fn run_with_timeout<W: Write>(
    env: &DockerEnv,
    timeout: Duration,
    out: &mut W,
) -> io::Result<Outcome> {
    writeln!(out, "DOCKER_API_VERSION env: {}", env.api_version_display())?;

    let outcome = match query(env, timeout, out).await {
        Ok(version) => {
            writeln!(out, "Success!")?;
            Outcome::Success(version)
        }
        Err(err) => {
            let message = err.one_line();
            warn!("Docker diagnostic failed: {}", message);
            writeln!(out, "Error: {}", message)?;
            Outcome::Failure(message)
        }
    };
    out.flush()?;
    Ok(outcome)
}

/// Connect, print what we learn, and hand back the version record.
async fn query<W: Write>(env: &DockerEnv, timeout: Duration, out: &mut W) -> Result<Version> {
    let docker = Docker::connect_with_timeout(env, timeout).await?;
    writeln!(out, "Client API version: {}", docker.api_version())?;

    let version = docker.version().await?;
    let record = serde_json::to_string(&version)
        .chain_err(|| "cannot serialize Docker version record")?;
    writeln!(out, "{}", record)?;
    Ok(version)
}
