//! OAuth 2.0 client-credentials transport bootstrapped from the service info endpoint.
//!
//! [`TokenTransport::connect`] fetches `GET {base}/info` without credentials to learn the
//! authorization server, configures a client-credentials grant against it, and acquires the
//! first token before returning, so a transport that exists is always able to authenticate at
//! least once. Every request then checks the token against the clock (with the token's own
//! ten-second expiry delta and no extra margin) and re-acquires it through the same grant when
//! it is no longer valid. Concurrent callers share a single re-acquisition.

pub mod bearer;
pub mod grant;

pub use bearer::*;
pub use grant::*;

// crates.io
use reqwest::{
	Method,
	header::{ACCEPT, AUTHORIZATION, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::{ClientOptions, StrategyKind},
	error::{AuthConfigError, AuthenticationError, ConfigError, DiscoveryError, TransportError},
	http::HttpSettings,
	model::ServiceInfo,
	obs::{RenewalMetrics, RenewalOutcome, RenewalSpan},
	transport::{AuthenticatedTransport, TransportFuture, cell::CredentialCell},
};

const KIND: StrategyKind = StrategyKind::Token;

/// Path of the unauthenticated service info endpoint.
pub const INFO_PATH: &str = "info";

/// Inputs required to bootstrap a [`TokenTransport`].
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSettings {
	/// Normalized service base URL (no trailing slash).
	pub base_url: String,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// HTTP options shared by discovery, token, and API calls.
	pub http: HttpSettings,
}
impl TokenSettings {
	/// Creates settings with default HTTP options.
	pub fn new(
		base_url: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			base_url: base_url.into(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			http: HttpSettings::default(),
		}
	}

	/// Derives settings from client options; fails when either credential is missing.
	pub fn from_options(options: &ClientOptions) -> Result<Self, AuthConfigError> {
		let client = options.client.as_deref().unwrap_or_default();
		let secret = options.secret.as_deref().unwrap_or_default();

		if client.is_empty() {
			return Err(AuthConfigError::MissingClientId);
		}
		if secret.is_empty() {
			return Err(AuthConfigError::MissingClientSecret);
		}

		Ok(Self::new(options.base_url(), client, secret).with_http(
			HttpSettings::default().with_timeout(options.timeout).with_insecure(options.ignore_ssl),
		))
	}

	/// Replaces the HTTP options.
	pub fn with_http(mut self, http: HttpSettings) -> Self {
		self.http = http;

		self
	}

	/// URL of the service info endpoint.
	pub fn info_url(&self) -> String {
		format!("{}/{INFO_PATH}", self.base_url.trim_end_matches('/'))
	}
}
impl Debug for TokenSettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSettings")
			.field("base_url", &self.base_url)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("http", &self.http)
			.finish()
	}
}

/// [`AuthenticatedTransport`] attaching client-credentials bearer tokens.
pub struct TokenTransport {
	client: ReqwestClient,
	grant: ClientCredentialsGrant,
	service_info: ServiceInfo,
	clock: Arc<dyn Clock>,
	credential: CredentialCell<BearerToken>,
	metrics: RenewalMetrics,
}
impl TokenTransport {
	/// Discovers the authorization server and acquires the first token using the system clock.
	pub async fn connect(settings: TokenSettings) -> Result<Self> {
		Self::connect_with_clock(settings, SystemClock).await
	}

	/// Same as [`TokenTransport::connect`] with an explicit clock.
	pub async fn connect_with_clock(
		settings: TokenSettings,
		clock: impl 'static + Clock,
	) -> Result<Self> {
		let client = settings.http.build()?;
		let service_info = discover(&client, &settings.info_url()).await?;
		let grant = ClientCredentialsGrant::new(
			&service_info.auth_server.url,
			&settings.client_id,
			&settings.client_secret,
			settings.http.build_token_client()?,
		)?;
		let transport = Self {
			client,
			grant,
			service_info,
			clock: Arc::new(clock),
			credential: CredentialCell::new(),
			metrics: RenewalMetrics::default(),
		};
		let initial = transport.renew().await?;

		transport.credential.install(initial);

		Ok(transport)
	}

	/// Service info discovered at construction.
	pub fn service_info(&self) -> &ServiceInfo {
		&self.service_info
	}

	/// Token endpoint derived from the discovered authorization server.
	pub fn token_url(&self) -> &Url {
		self.grant.token_url()
	}

	/// Expiry of the held token; `None` when the token is unbounded.
	pub fn token_expires_at(&self) -> Option<OffsetDateTime> {
		self.credential.snapshot().and_then(|token| token.expires_at)
	}

	/// Renewal counters for this instance, including the initial acquisition.
	pub fn metrics(&self) -> &RenewalMetrics {
		&self.metrics
	}

	async fn current_token(&self) -> Result<BearerToken> {
		let now = self.clock.now();

		self.credential.fresh_or_renew(|token| token.is_valid_at(now), || self.renew()).await
	}

	async fn renew(&self) -> Result<BearerToken> {
		let span = RenewalSpan::new(KIND, "acquire_token");

		self.metrics.record(KIND, RenewalOutcome::Attempt);

		let issued_at = self.clock.now();
		let result = span.instrument(self.grant.acquire(issued_at)).await.map_err(Error::from);

		match &result {
			Ok(_) => {
				span.note("installed new bearer token");
				self.metrics.record(KIND, RenewalOutcome::Success);
			},
			Err(_) => self.metrics.record(KIND, RenewalOutcome::Failure),
		}

		result
	}
}
impl AuthenticatedTransport for TokenTransport {
	fn execute(&self, mut request: Request) -> TransportFuture<'_> {
		Box::pin(async move {
			let token = self.current_token().await?;
			let mut value = HeaderValue::from_str(&token.authorization())
				.map_err(|_| AuthenticationError::InvalidHeader)?;

			value.set_sensitive(true);
			request.headers_mut().insert(AUTHORIZATION, value);

			self.client.execute(request).await.map_err(|e| TransportError::from(e).into())
		})
	}
}
impl Debug for TokenTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenTransport")
			.field("grant", &self.grant)
			.field("service_info", &self.service_info)
			.field("token_expires_at", &self.token_expires_at())
			.field("metrics", &self.metrics)
			.finish()
	}
}

async fn discover(client: &ReqwestClient, url: &str) -> Result<ServiceInfo> {
	let parsed = Url::parse(url).map_err(|source| ConfigError::invalid_url(url, source))?;
	let response = client
		.request(Method::GET, parsed)
		.header(ACCEPT, "application/json")
		.send()
		.await
		.map_err(|source| DiscoveryError::Unreachable { url: url.to_owned(), source })?;
	let status = response.status();

	if !status.is_success() {
		return Err(DiscoveryError::Status { url: url.to_owned(), status: status.as_u16() }.into());
	}

	let body = response
		.bytes()
		.await
		.map_err(|source| DiscoveryError::Unreachable { url: url.to_owned(), source })?;
	let mut de = serde_json::Deserializer::from_slice(&body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| DiscoveryError::Parse { url: url.to_owned(), source }.into())
}
