//! HTTP client construction and the instrumented handle used for token exchanges.
//!
//! Both transports build their [`ReqwestClient`]s through [`HttpSettings`] so timeout and
//! TLS-verification choices stay consistent between discovery, token, and API calls. Token
//! requests go through [`InstrumentedHandle`], which implements [`AsyncHttpClient`] for the
//! `oauth2` crate and records the response status in a [`ResponseMetadataSlot`] so rejected
//! grants can be reported with the status the authorization server used.

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::{Identity, redirect::Policy};
// self
use crate::{_prelude::*, error::ConfigError};

/// Options applied to every [`ReqwestClient`] a transport builds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpSettings {
	/// Per-request timeout.
	pub timeout: Option<StdDuration>,
	/// Accept invalid certificates and host names.
	pub insecure: bool,
}
impl HttpSettings {
	/// Sets the per-request timeout.
	pub fn with_timeout(mut self, timeout: Option<StdDuration>) -> Self {
		self.timeout = timeout;

		self
	}

	/// Toggles TLS verification.
	pub fn with_insecure(mut self, insecure: bool) -> Self {
		self.insecure = insecure;

		self
	}

	/// Builds a client for API calls.
	pub fn build(&self) -> Result<ReqwestClient, ConfigError> {
		self.builder().build().map_err(ConfigError::from)
	}

	/// Builds a client presenting `identity` during TLS handshakes.
	pub fn build_with_identity(&self, identity: Identity) -> Result<ReqwestClient, ReqwestError> {
		self.builder().identity(identity).build()
	}

	/// Builds a client for token endpoints; redirects are never followed.
	pub fn build_token_client(&self) -> Result<ReqwestHttpClient, ConfigError> {
		let client = self.builder().redirect(Policy::none()).build().map_err(ConfigError::from)?;

		Ok(ReqwestHttpClient::with_client(client))
	}

	fn builder(&self) -> reqwest::ClientBuilder {
		let mut builder = ReqwestClient::builder();

		if let Some(timeout) = self.timeout {
			builder = builder.timeout(timeout);
		}
		if self.insecure {
			builder = builder.danger_accept_invalid_certs(true).danger_accept_invalid_hostnames(true);
		}

		builder
	}
}

/// Captures metadata from the most recent token endpoint response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] used for token endpoint calls.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a handle that records outcomes in `slot`.
	pub fn with_metadata(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle { client: self.0.clone(), slot }
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}

/// [`AsyncHttpClient`] adapter that captures response metadata.
#[derive(Clone, Debug)]
pub struct InstrumentedHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.client.clone();
		let slot = self.slot.clone();

		Box::pin(async move {
			slot.take();

			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
