//! Client options, base-URL normalization, and environment-sourced certificate paths.

// std
use std::{env, path::PathBuf, time::Duration as StdDuration};
// self
use crate::{_prelude::*, error::CredentialLoadError};

/// Base URL used when none is configured.
pub const DEFAULT_URL: &str = "https://credhub.service.cf.internal:8844";
/// Environment variable naming the instance certificate file.
pub const CERT_PATH_VAR: &str = "CF_INSTANCE_CERT";
/// Environment variable naming the instance private key file.
pub const KEY_PATH_VAR: &str = "CF_INSTANCE_KEY";

/// Which authentication strategy a set of options selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
	/// Mutual TLS with instance certificates.
	Certificate,
	/// OAuth 2.0 client-credentials bearer tokens.
	Token,
}
impl StrategyKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StrategyKind::Certificate => "certificate",
			StrategyKind::Token => "token",
		}
	}
}
impl Display for StrategyKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Locations of the PEM-encoded certificate and private key used for mutual TLS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePaths {
	/// Certificate (chain) file, leaf first.
	pub certificate: PathBuf,
	/// Private key file.
	pub key: PathBuf,
}
impl CertificatePaths {
	/// Creates a path pair.
	pub fn new(certificate: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
		Self { certificate: certificate.into(), key: key.into() }
	}

	/// Reads the pair from `CF_INSTANCE_CERT` and `CF_INSTANCE_KEY`.
	pub fn from_env() -> Result<Self, CredentialLoadError> {
		Self::from_vars(CERT_PATH_VAR, KEY_PATH_VAR)
	}

	/// Reads the pair from the named environment variables.
	pub fn from_vars(
		certificate_var: &'static str,
		key_var: &'static str,
	) -> Result<Self, CredentialLoadError> {
		Ok(Self::new(env_path(certificate_var)?, env_path(key_var)?))
	}
}

/// Top-level client configuration.
///
/// Supplying both `client` and `secret` selects bearer-token authentication against the
/// authorization server advertised by the service; anything else selects mutual TLS.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
	/// Service base URL; [`DEFAULT_URL`] when unset or blank.
	pub url: Option<String>,
	/// OAuth client identifier.
	pub client: Option<String>,
	/// OAuth client secret.
	pub secret: Option<String>,
	/// Skips TLS verification for the token strategy (discovery, token, and API calls).
	pub ignore_ssl: bool,
	/// Certificate paths for mutual TLS; read from the environment when unset.
	pub certificate: Option<CertificatePaths>,
	/// Per-request timeout applied by the underlying HTTP clients.
	pub timeout: Option<StdDuration>,
}
impl ClientOptions {
	/// Sets the service base URL.
	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());

		self
	}

	/// Sets the OAuth client credentials, selecting the token strategy.
	pub fn with_client_credentials(
		mut self,
		client: impl Into<String>,
		secret: impl Into<String>,
	) -> Self {
		self.client = Some(client.into());
		self.secret = Some(secret.into());

		self
	}

	/// Toggles TLS verification for the token strategy.
	pub fn with_ignore_ssl(mut self, ignore: bool) -> Self {
		self.ignore_ssl = ignore;

		self
	}

	/// Sets explicit certificate paths for mutual TLS.
	pub fn with_certificate(mut self, paths: CertificatePaths) -> Self {
		self.certificate = Some(paths);

		self
	}

	/// Sets the per-request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Returns the normalized base URL (default applied, one trailing slash removed).
	pub fn base_url(&self) -> String {
		normalize_base_url(self.url.as_deref())
	}

	/// Returns the strategy these options select.
	pub fn strategy_kind(&self) -> StrategyKind {
		match self.client_credentials() {
			Some(_) => StrategyKind::Token,
			None => StrategyKind::Certificate,
		}
	}

	/// Returns the client id/secret pair when both are present and non-empty.
	pub fn client_credentials(&self) -> Option<(&str, &str)> {
		let client = self.client.as_deref().filter(|value| !value.is_empty())?;
		let secret = self.secret.as_deref().filter(|value| !value.is_empty())?;

		Some((client, secret))
	}
}
impl Debug for ClientOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientOptions")
			.field("url", &self.url)
			.field("client", &self.client)
			.field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
			.field("ignore_ssl", &self.ignore_ssl)
			.field("certificate", &self.certificate)
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Applies the default URL and strips a single trailing slash.
pub fn normalize_base_url(url: Option<&str>) -> String {
	match url.map(str::trim).filter(|value| !value.is_empty()) {
		None => DEFAULT_URL.to_owned(),
		Some(value) => value.strip_suffix('/').unwrap_or(value).to_owned(),
	}
}

fn env_path(variable: &'static str) -> Result<PathBuf, CredentialLoadError> {
	env::var_os(variable)
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
		.ok_or(CredentialLoadError::MissingEnvironment { variable })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_defaults_and_strips_trailing_slash() {
		assert_eq!(ClientOptions::default().base_url(), DEFAULT_URL);
		assert_eq!(ClientOptions::default().with_url("  ").base_url(), DEFAULT_URL);
		assert_eq!(
			ClientOptions::default().with_url("https://credhub.local:8844/").base_url(),
			"https://credhub.local:8844",
		);
		assert_eq!(
			ClientOptions::default().with_url("https://credhub.local/api").base_url(),
			"https://credhub.local/api",
		);
	}

	#[test]
	fn strategy_requires_both_client_and_secret() {
		assert_eq!(ClientOptions::default().strategy_kind(), StrategyKind::Certificate);

		let partial = ClientOptions { client: Some("client".into()), ..Default::default() };

		assert_eq!(partial.strategy_kind(), StrategyKind::Certificate);

		let blank = ClientOptions::default().with_client_credentials("client", "");

		assert_eq!(blank.strategy_kind(), StrategyKind::Certificate);

		let full = ClientOptions::default().with_client_credentials("client", "secret");

		assert_eq!(full.strategy_kind(), StrategyKind::Token);
		assert_eq!(full.client_credentials(), Some(("client", "secret")));
	}

	#[test]
	fn unset_path_variables_are_reported_by_name() {
		let err = CertificatePaths::from_vars(
			"CREDHUB_CLIENT_UNSET_CERT_PATH",
			"CREDHUB_CLIENT_UNSET_KEY_PATH",
		)
		.expect_err("Unset variables should not resolve.");

		assert!(matches!(
			err,
			CredentialLoadError::MissingEnvironment { variable: "CREDHUB_CLIENT_UNSET_CERT_PATH" }
		));
	}

	#[test]
	fn options_debug_redacts_secret() {
		let options = ClientOptions::default().with_client_credentials("client", "hunter2");
		let rendered = format!("{options:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn options_deserialize_with_defaults() {
		let options: ClientOptions =
			serde_json::from_str("{\"url\":\"https://credhub.local/\",\"ignore_ssl\":true}")
				.expect("Options should deserialize from a partial document.");

		assert_eq!(options.base_url(), "https://credhub.local");
		assert!(options.ignore_ssl);
		assert_eq!(options.strategy_kind(), StrategyKind::Certificate);
	}
}
