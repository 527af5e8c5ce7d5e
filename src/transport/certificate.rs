//! Mutual-TLS transport that reloads the instance certificate before it expires.
//!
//! The transport keeps one TLS client built around the current key pair. Before every request
//! it checks the leaf certificate's `not_after` against the clock with a one-minute margin; when
//! the certificate is missing or inside that margin it reloads the pair from its
//! [`CertificateSource`], builds a new client, and swaps client and expiry in together. A freshly
//! loaded certificate that is already inside the margin is still used for the current request;
//! the next request will try again.

pub mod source;

pub use source::*;

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::{ClientOptions, StrategyKind},
	error::{CredentialLoadError, TransportError},
	http::HttpSettings,
	obs::{RenewalMetrics, RenewalOutcome, RenewalSpan},
	transport::{AuthenticatedTransport, TransportFuture, cell::CredentialCell},
};

const KIND: StrategyKind = StrategyKind::Certificate;

/// Remaining lifetime at or below which the certificate is reloaded.
pub const EXPIRY_MARGIN: Duration = Duration::minutes(1);

/// Returns `true` when a certificate expiring at `not_after` must be reloaded at `now`.
pub fn needs_renewal(not_after: OffsetDateTime, now: OffsetDateTime) -> bool {
	now + EXPIRY_MARGIN >= not_after
}

#[derive(Clone, Debug)]
struct InstalledCertificate {
	client: ReqwestClient,
	not_after: OffsetDateTime,
}

/// [`AuthenticatedTransport`] presenting a client certificate on every connection.
pub struct CertificateTransport {
	source: Arc<dyn CertificateSource>,
	settings: HttpSettings,
	clock: Arc<dyn Clock>,
	credential: CredentialCell<InstalledCertificate>,
	metrics: RenewalMetrics,
}
impl CertificateTransport {
	/// Creates a transport; nothing is loaded until the first request.
	pub fn new(source: impl 'static + CertificateSource, settings: HttpSettings) -> Self {
		Self {
			source: Arc::new(source),
			settings,
			clock: Arc::new(SystemClock),
			credential: CredentialCell::new(),
			metrics: RenewalMetrics::default(),
		}
	}

	/// Creates a file-backed transport from client options.
	///
	/// Certificate paths come from the options or, failing that, from `CF_INSTANCE_CERT` and
	/// `CF_INSTANCE_KEY` at load time; missing paths surface as [`CredentialLoadError`] on the
	/// first request.
	pub fn from_options(options: &ClientOptions) -> Self {
		let settings = HttpSettings::default().with_timeout(options.timeout);

		match &options.certificate {
			Some(paths) => Self::new(FileCertificateSource::new(paths.clone()), settings),
			None => Self::new(EnvCertificateSource::default(), settings),
		}
	}

	/// Replaces the clock used for expiry checks.
	pub fn with_clock(mut self, clock: impl 'static + Clock) -> Self {
		self.clock = Arc::new(clock);

		self
	}

	/// Expiry of the installed certificate, if one has been loaded.
	pub fn not_after(&self) -> Option<OffsetDateTime> {
		self.credential.snapshot().map(|installed| installed.not_after)
	}

	/// Renewal counters for this instance.
	pub fn metrics(&self) -> &RenewalMetrics {
		&self.metrics
	}

	async fn current_client(&self) -> Result<ReqwestClient> {
		let now = self.clock.now();
		let installed = self
			.credential
			.fresh_or_renew(
				|installed| !needs_renewal(installed.not_after, now),
				|| self.renew(),
			)
			.await?;

		Ok(installed.client)
	}

	async fn renew(&self) -> Result<InstalledCertificate> {
		let span = RenewalSpan::new(KIND, "reload_certificate");

		self.metrics.record(KIND, RenewalOutcome::Attempt);

		let result = span.instrument(async { self.load_and_build() }).await;

		match &result {
			Ok(_) => {
				span.note("installed reloaded certificate");
				self.metrics.record(KIND, RenewalOutcome::Success);
			},
			Err(_) => self.metrics.record(KIND, RenewalOutcome::Failure),
		}

		result
	}

	fn load_and_build(&self) -> Result<InstalledCertificate> {
		let material = self.source.load()?;
		let not_after = material.not_after();
		let client = self
			.settings
			.build_with_identity(material.into_identity())
			.map_err(|source| CredentialLoadError::Identity { source })?;

		Ok(InstalledCertificate { client, not_after })
	}
}
impl AuthenticatedTransport for CertificateTransport {
	fn execute(&self, request: Request) -> TransportFuture<'_> {
		Box::pin(async move {
			let client = self.current_client().await?;

			client.execute(request).await.map_err(|e| TransportError::from(e).into())
		})
	}
}
impl Debug for CertificateTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CertificateTransport")
			.field("settings", &self.settings)
			.field("not_after", &self.not_after())
			.field("metrics", &self.metrics)
			.finish()
	}
}
