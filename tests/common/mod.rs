//! Shared helpers for integration tests.

#![allow(dead_code)]

// std
use std::{
	path::PathBuf,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use httpmock::prelude::*;
// self
use credhub_client::{
	CertificatePaths,
	error::CredentialLoadError,
	transport::certificate::{CertificateMaterial, CertificateSource, FileCertificateSource},
};

pub const CLIENT_ID: &str = "credhub_client";
pub const CLIENT_SECRET: &str = "credhub_secret";

/// Path of a PEM fixture.
pub fn fixture(name: &str) -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

/// Certificate paths of the valid fixture pair.
pub fn fixture_paths() -> CertificatePaths {
	CertificatePaths::new(fixture("instance.crt"), fixture("instance.key"))
}

/// Token endpoint body in the shape the authorization server returns.
pub fn token_body(token: &str, expires_in: u64) -> String {
	format!("{{\"access_token\":\"{token}\",\"token_type\":\"bearer\",\"expires_in\":{expires_in}}}")
}

/// Mocks `GET /info` advertising `server` itself as the authorization server.
pub async fn mock_info(server: &MockServer) -> httpmock::Mock<'_> {
	let body = format!(
		"{{\"auth-server\":{{\"url\":\"{}\"}},\"app\":{{\"name\":\"CredHub\"}}}}",
		server.base_url()
	);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/info");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Mocks `POST /oauth/token` issuing `token` for the test client.
pub async fn mock_token<'a>(
	server: &'a MockServer,
	token: &str,
	expires_in: u64,
) -> httpmock::Mock<'a> {
	let body = token_body(token, expires_in);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.body_includes("grant_type=client_credentials")
				.body_includes("token_format=jwt");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// File source wrapper counting successful and failed loads.
#[derive(Clone)]
pub struct CountingSource {
	inner: FileCertificateSource,
	loads: Arc<AtomicUsize>,
}
impl CountingSource {
	pub fn new(paths: CertificatePaths) -> Self {
		Self { inner: FileCertificateSource::new(paths), loads: Arc::new(AtomicUsize::new(0)) }
	}

	pub fn loads(&self) -> usize {
		self.loads.load(Ordering::SeqCst)
	}
}
impl CertificateSource for CountingSource {
	fn load(&self) -> Result<CertificateMaterial, CredentialLoadError> {
		self.loads.fetch_add(1, Ordering::SeqCst);

		self.inner.load()
	}
}
