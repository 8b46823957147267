#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod health;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{DatabaseStatus, ServiceHealth, ServiceStatus};
