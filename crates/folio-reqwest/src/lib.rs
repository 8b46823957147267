#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod auth;
mod connect;
mod error;
mod service;

pub use crate::auth::{ClientCredentials, REFRESH_MARGIN, StaticToken, TokenProvider};
pub use crate::connect::{
    ApiTransport, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ReqwestClient, ReqwestConfig,
    TRACING_TARGET,
};
pub use crate::error::{Error, Result};

/// Tracing target for token acquisition.
pub use crate::auth::TRACING_TARGET as TRACING_TARGET_AUTH;
