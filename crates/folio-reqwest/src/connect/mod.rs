//! Reqwest client module.
//!
//! This module provides the transport and the client used for every call to
//! the import API.

mod client;
mod config;
mod transport;

pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ReqwestConfig};
pub use transport::ApiTransport;
