//! CredHub client with self-renewing transports: mutual-TLS instance certificates or OAuth 2.0
//! client-credentials bearer tokens, selected once at construction and renewed on demand.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod json;
pub mod model;
pub mod obs;
pub mod transport;
#[cfg(test)]
pub mod _preludet {
	//! Convenience re-exports and helpers for unit tests.

	pub use crate::_prelude::*;

	// std
	use std::path::PathBuf;

	/// Directory holding the PEM fixtures shared with integration tests.
	pub fn fixture(name: &str) -> PathBuf {
		PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
	}

	/// Reads a PEM fixture into memory.
	pub fn fixture_bytes(name: &str) -> Vec<u8> {
		std::fs::read(fixture(name)).expect("Failed to read PEM fixture.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Request, Response};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use client::CredHubClient;
pub use config::{CertificatePaths, ClientOptions};
pub use error::{Error, Result};
pub use reqwest;
pub use transport::{AuthStrategy, AuthenticatedTransport};
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
