//! Docker daemon connectivity diagnostic.
//!
//! A deliberately small Docker client: enough to find the daemon the way
//! the `docker` CLI does, agree on an API version, and ask for the
//! daemon's version record.
// Increase the compiler's recursion limit for the `error_chain` crate.
#![recursion_limit = "1024"]

// import external libraries
#[macro_use]
extern crate error_chain;

#[macro_use]
extern crate serde_derive;

// declare modules
pub mod api_version;
mod connector;
pub mod diagnostic;
mod docker;
pub mod env;
pub mod errors;
pub mod host;
pub mod version;

// publicly re-export
pub use crate::api_version::ApiVersion;
pub use crate::diagnostic::{run, Outcome};
pub use crate::docker::{Docker, DEFAULT_TIMEOUT};
pub use crate::env::DockerEnv;
