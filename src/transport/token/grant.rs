//! OAuth 2.0 client-credentials token source.

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	error::{AuthConfigError, AuthenticationError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	transport::token::BearerToken,
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Path of the token endpoint below the advertised authorization server URL.
pub const TOKEN_PATH: &str = "oauth/token";

/// Issues tokens through the client-credentials grant, requesting JWT-formatted tokens.
pub struct ClientCredentialsGrant {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
	token_url: Url,
}
impl ClientCredentialsGrant {
	/// Configures the grant against `auth_server`.
	pub fn new(
		auth_server: &str,
		client_id: &str,
		client_secret: &str,
		http_client: ReqwestHttpClient,
	) -> Result<Self, AuthConfigError> {
		if client_id.is_empty() {
			return Err(AuthConfigError::MissingClientId);
		}
		if client_secret.is_empty() {
			return Err(AuthConfigError::MissingClientSecret);
		}

		let token_url = token_url(auth_server)?;
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(TokenUrl::from_url(token_url.clone()));

		Ok(Self { oauth_client, http_client, token_url })
	}

	/// Token endpoint the grant posts to.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Requests a new token; `issued_at` anchors the relative `expires_in`.
	pub async fn acquire(
		&self,
		issued_at: OffsetDateTime,
	) -> Result<BearerToken, AuthenticationError> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.add_extra_param("token_format", "jwt")
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;
		let expires_in = match response.expires_in() {
			Some(ttl) => Some(Duration::seconds(
				i64::try_from(ttl.as_secs()).map_err(|_| AuthenticationError::ExpiresInOutOfRange)?,
			)),
			None => None,
		};

		BearerToken::issued(
			response.access_token().secret().to_owned(),
			response.token_type().as_ref(),
			expires_in,
			issued_at,
		)
	}
}
impl Debug for ClientCredentialsGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsGrant")
			.field("token_url", &self.token_url.as_str())
			.field("client_id", self.oauth_client.client_id())
			.finish()
	}
}

fn token_url(auth_server: &str) -> Result<Url, AuthConfigError> {
	let raw = format!("{}/{TOKEN_PATH}", auth_server.trim_end_matches('/'));

	Url::parse(&raw).map_err(|source| AuthConfigError::InvalidAuthServer {
		url: auth_server.to_owned(),
		source,
	})
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> AuthenticationError {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let reason = match response.error_description() {
				Some(description) => format!("{}: {description}", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			AuthenticationError::Rejected { reason, status }
		},
		RequestTokenError::Request(error) => AuthenticationError::unreachable(error),
		RequestTokenError::Parse(source, _body) =>
			AuthenticationError::MalformedResponse { source, status },
		RequestTokenError::Other(message) => AuthenticationError::Rejected { reason: message, status },
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_url_appends_oauth_path_once() {
		let url = token_url("https://uaa.service.cf.internal:8443/").expect("URL should parse.");

		assert_eq!(url.as_str(), "https://uaa.service.cf.internal:8443/oauth/token");
	}

	#[test]
	fn rejects_blank_inputs_and_bad_urls() {
		let http = ReqwestHttpClient::default();

		assert!(matches!(
			ClientCredentialsGrant::new("https://uaa", "", "secret", http.clone()),
			Err(AuthConfigError::MissingClientId)
		));
		assert!(matches!(
			ClientCredentialsGrant::new("https://uaa", "client", "", http.clone()),
			Err(AuthConfigError::MissingClientSecret)
		));
		assert!(matches!(
			ClientCredentialsGrant::new("not a url", "client", "secret", http),
			Err(AuthConfigError::InvalidAuthServer { .. })
		));
	}

	#[test]
	fn debug_hides_secret() {
		let grant = ClientCredentialsGrant::new(
			"https://uaa.example",
			"credhub_client",
			"hunter2",
			ReqwestHttpClient::default(),
		)
		.expect("Grant should build.");
		let rendered = format!("{grant:?}");

		assert!(rendered.contains("credhub_client"));
		assert!(!rendered.contains("hunter2"));
		assert_eq!(grant.token_url().as_str(), "https://uaa.example/oauth/token");
	}
}
