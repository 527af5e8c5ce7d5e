//! Authenticated transports and the strategy selected for a client.
//!
//! A transport owns whatever credential it presents (a TLS client identity or a bearer token),
//! checks it against the clock before every request, and renews it in place when needed. Callers
//! only see [`AuthenticatedTransport::execute`].

mod cell;

pub mod certificate;
pub mod token;

pub use certificate::{
	CertificateSource, CertificateTransport, EnvCertificateSource, FileCertificateSource,
};
pub use token::{TokenSettings, TokenTransport};

// self
use crate::{
	_prelude::*,
	config::{ClientOptions, StrategyKind},
	obs::RenewalMetrics,
};

/// Boxed future returned by [`AuthenticatedTransport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + 'a + Send>>;

/// Dispatches requests with a valid credential attached.
///
/// Implementations renew their credential before sending when it is missing or about to expire.
/// Renewal failures abort the request and leave the previously installed credential untouched.
pub trait AuthenticatedTransport
where
	Self: Send + Sync,
{
	/// Sends `request` and returns the raw response; non-2xx statuses are not errors here.
	fn execute(&self, request: Request) -> TransportFuture<'_>;
}
impl<T> AuthenticatedTransport for Arc<T>
where
	T: ?Sized + AuthenticatedTransport,
{
	fn execute(&self, request: Request) -> TransportFuture<'_> {
		(**self).execute(request)
	}
}

/// The transport variant picked from [`ClientOptions`].
#[derive(Debug)]
pub enum AuthStrategy {
	/// Mutual TLS with the instance certificate.
	Certificate(CertificateTransport),
	/// OAuth 2.0 client-credentials bearer tokens.
	Token(TokenTransport),
}
impl AuthStrategy {
	/// Selects and constructs the strategy.
	///
	/// Client credentials win when both the client id and the secret are non-empty; the token
	/// strategy then performs discovery and the first token acquisition before returning.
	/// Otherwise the certificate strategy is used and nothing is loaded until the first request.
	pub async fn from_options(options: &ClientOptions) -> Result<Self> {
		match options.strategy_kind() {
			StrategyKind::Token => {
				let settings = TokenSettings::from_options(options)?;

				Ok(Self::Token(TokenTransport::connect(settings).await?))
			},
			StrategyKind::Certificate =>
				Ok(Self::Certificate(CertificateTransport::from_options(options))),
		}
	}

	/// Which strategy is active.
	pub fn kind(&self) -> StrategyKind {
		match self {
			Self::Certificate(_) => StrategyKind::Certificate,
			Self::Token(_) => StrategyKind::Token,
		}
	}

	/// Renewal counters of the active strategy.
	pub fn metrics(&self) -> &RenewalMetrics {
		match self {
			Self::Certificate(transport) => transport.metrics(),
			Self::Token(transport) => transport.metrics(),
		}
	}
}
impl From<CertificateTransport> for AuthStrategy {
	fn from(transport: CertificateTransport) -> Self {
		Self::Certificate(transport)
	}
}
impl From<TokenTransport> for AuthStrategy {
	fn from(transport: TokenTransport) -> Self {
		Self::Token(transport)
	}
}
impl AuthenticatedTransport for AuthStrategy {
	fn execute(&self, request: Request) -> TransportFuture<'_> {
		match self {
			Self::Certificate(transport) => transport.execute(request),
			Self::Token(transport) => transport.execute(request),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::fixture, config::CertificatePaths};

	#[tokio::test]
	async fn certificate_strategy_is_selected_without_client_credentials() {
		let options = ClientOptions::default()
			.with_client_credentials("client", "")
			.with_certificate(CertificatePaths::new(fixture("instance.crt"), fixture("instance.key")));
		let strategy =
			AuthStrategy::from_options(&options).await.expect("Certificate strategy should build.");

		assert_eq!(strategy.kind(), StrategyKind::Certificate);
		assert_eq!(strategy.metrics().attempts(), 0);
	}

	#[tokio::test]
	async fn certificate_strategy_defers_environment_lookup_to_first_request() {
		let strategy = AuthStrategy::from_options(&ClientOptions::default())
			.await
			.expect("Certificate strategy should build without any paths.");

		assert_eq!(strategy.kind(), StrategyKind::Certificate);
		assert_eq!(strategy.metrics().attempts(), 0);
	}

	#[tokio::test]
	async fn token_strategy_fails_fast_when_discovery_is_unreachable() {
		let options = ClientOptions::default()
			.with_url("http://127.0.0.1:9")
			.with_client_credentials("client", "secret");
		let err = AuthStrategy::from_options(&options)
			.await
			.expect_err("Discovery against a closed port should fail.");

		assert!(matches!(err, Error::Discovery(_)));
	}
}
