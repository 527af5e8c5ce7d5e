//! Client-wide error types shared by transports, JSON helpers, and the façade.

// std
use std::path::PathBuf;
// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Certificate or key material could not be loaded.
	#[error(transparent)]
	CredentialLoad(#[from] CredentialLoadError),
	/// OAuth client could not be configured from the supplied inputs.
	#[error(transparent)]
	AuthConfig(#[from] AuthConfigError),
	/// Authorization server rejected or never answered a token request.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Service info endpoint could not be used to bootstrap token auth.
	#[error(transparent)]
	Discovery(#[from] DiscoveryError),
	/// Network failure while dispatching a request.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Request payload could not be serialized.
	#[error(transparent)]
	Encode(#[from] EncodeError),
	/// Response body could not be decoded into the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Service answered with a non-success status.
	#[error("Service responded with HTTP {status}: {body}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body, truncated for display.
		body: String,
	},
}
impl Error {
	/// Returns the HTTP status carried by [`Error::Status`], if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
	/// A URL could not be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a URL parsing failure for `url`.
	pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { url: url.into(), source }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while loading mutual-TLS material.
#[derive(Debug, ThisError)]
pub enum CredentialLoadError {
	/// Certificate paths were not supplied and the environment does not define them.
	#[error("Environment variable `{variable}` naming the key pair is not set.")]
	MissingEnvironment {
		/// Variable name.
		variable: &'static str,
	},
	/// A configured file could not be read.
	#[error("Failed to read {}.", .path.display())]
	Read {
		/// File path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// PEM data could not be parsed.
	#[error("Malformed PEM data in the {kind}.")]
	MalformedPem {
		/// Which half of the pair failed (`certificate` or `private key`).
		kind: &'static str,
		/// Underlying PEM failure.
		#[source]
		source: std::io::Error,
	},
	/// The certificate file holds no certificate.
	#[error("No certificate found in the certificate material.")]
	MissingCertificate,
	/// The key file holds no private key.
	#[error("No private key found in the key material.")]
	MissingPrivateKey,
	/// The leaf certificate is not valid DER.
	#[error("Leaf certificate could not be parsed: {reason}.")]
	InvalidCertificate {
		/// Parser message.
		reason: String,
	},
	/// The private key is of an unsupported type or malformed.
	#[error("Private key is unsupported or malformed.")]
	InvalidPrivateKey {
		/// Underlying TLS failure.
		#[source]
		source: rustls::Error,
	},
	/// The private key does not belong to the leaf certificate.
	#[error("Private key does not match the leaf certificate.")]
	KeyMismatch,
	/// The TLS client could not accept the identity.
	#[error("TLS identity could not be installed.")]
	Identity {
		/// Underlying transport failure.
		#[source]
		source: ReqwestError,
	},
}

/// Invalid inputs for the OAuth client-credentials token source.
#[derive(Debug, ThisError)]
pub enum AuthConfigError {
	/// Client identifier was empty.
	#[error("Client identifier must not be empty.")]
	MissingClientId,
	/// Client secret was empty.
	#[error("Client secret must not be empty.")]
	MissingClientSecret,
	/// The discovered authorization server URL is unusable.
	#[error("Authorization server URL `{url}` is invalid.")]
	InvalidAuthServer {
		/// Offending URL.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Token acquisition failures.
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// Authorization server refused the grant.
	#[error("Authorization server rejected the token request: {reason}.")]
	Rejected {
		/// Server- or client-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Authorization server could not be reached.
	#[error("Authorization server is unreachable.")]
	Unreachable {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Token response could not be parsed.
	#[error("Authorization server returned a malformed token response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token response carried an `expires_in` that cannot be represented as an expiry instant.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token cannot be carried in an HTTP header.
	#[error("Issued token contains characters that are not valid in a header.")]
	InvalidHeader,
}
impl AuthenticationError {
	/// Wraps a transport failure raised while contacting the authorization server.
	pub fn unreachable(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unreachable { source: Box::new(src) }
	}
}

/// Service info discovery failures.
#[derive(Debug, ThisError)]
pub enum DiscoveryError {
	/// Info endpoint could not be reached.
	#[error("Info endpoint `{url}` is unreachable.")]
	Unreachable {
		/// Info endpoint URL.
		url: String,
		/// Underlying transport failure.
		#[source]
		source: ReqwestError,
	},
	/// Info endpoint answered with a non-success status.
	#[error("Info endpoint `{url}` responded with HTTP {status}.")]
	Status {
		/// Info endpoint URL.
		url: String,
		/// HTTP status code.
		status: u16,
	},
	/// Info document could not be parsed.
	#[error("Info endpoint `{url}` returned a malformed document.")]
	Parse {
		/// Info endpoint URL.
		url: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Dispatch failures reported by the HTTP client.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Request payload serialization failure.
#[derive(Debug, ThisError)]
#[error("Request payload could not be encoded as JSON.")]
pub struct EncodeError(#[from] pub serde_json::Error);

/// Response body decoding failure.
#[derive(Debug, ThisError)]
#[error("Response body could not be decoded at `{}`.", .source.path())]
pub struct DecodeError {
	/// Structured parsing failure, including the JSON path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
	/// HTTP status code of the decoded response.
	pub status: u16,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_accessor_only_reports_status_errors() {
		let err = Error::Status { status: 404, body: "missing".into() };

		assert_eq!(err.status(), Some(404));
		assert!(err.to_string().contains("HTTP 404"));

		let err: Error = AuthConfigError::MissingClientId.into();

		assert_eq!(err.status(), None);
	}

	#[test]
	fn decode_error_reports_json_path() {
		let mut de = serde_json::Deserializer::from_str("{\"value\":\"x\"}");
		let decoded: Result<std::collections::HashMap<String, u8>, _> =
			serde_path_to_error::deserialize(&mut de);
		let source = decoded.expect_err("String value should not decode as u8.");
		let err = DecodeError { source, status: 200 };

		assert!(err.to_string().contains("value"));
	}

	#[test]
	fn transport_error_keeps_network_source() {
		let err: Error = TransportError::network(std::io::Error::other("connection reset")).into();
		let source = StdError::source(&err).expect("Transport error should expose its source.");

		assert!(source.to_string().contains("connection reset"));
	}
}
