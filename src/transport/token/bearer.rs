//! Bearer token representation and validity rules.

// self
use crate::{_prelude::*, error::AuthenticationError};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access token issued by the authorization server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BearerToken {
	/// Token value.
	pub secret: TokenSecret,
	/// Authorization scheme derived from the token type.
	pub scheme: String,
	/// Expiry instant; `None` for tokens issued without a lifetime.
	pub expires_at: Option<OffsetDateTime>,
}
impl BearerToken {
	/// Tokens are treated as expired this long before their stated expiry to absorb clock skew.
	pub const EXPIRY_DELTA: Duration = Duration::seconds(10);

	/// Builds a token from the pieces of a token endpoint response.
	///
	/// A zero `expires_in` means the server did not bound the token's lifetime. Lifetimes that
	/// push the expiry past the representable range are rejected.
	pub fn issued(
		secret: impl Into<String>,
		token_type: &str,
		expires_in: Option<Duration>,
		issued_at: OffsetDateTime,
	) -> Result<Self, AuthenticationError> {
		let expires_at = match expires_in.filter(|ttl| ttl.is_positive()) {
			Some(ttl) =>
				Some(issued_at.checked_add(ttl).ok_or(AuthenticationError::ExpiresInOutOfRange)?),
			None => None,
		};

		Ok(Self { secret: TokenSecret::new(secret), scheme: auth_scheme(token_type), expires_at })
	}

	/// Returns `true` if the token may still be presented at `now`.
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		if self.secret.expose().is_empty() {
			return false;
		}

		match self.expires_at {
			Some(expires_at) => now + Self::EXPIRY_DELTA <= expires_at,
			None => true,
		}
	}

	/// Renders the `Authorization` header value.
	pub fn authorization(&self) -> String {
		format!("{} {}", self.scheme, self.secret.expose())
	}
}

/// Canonicalizes well-known token types; unknown types are passed through verbatim.
pub fn auth_scheme(token_type: &str) -> String {
	if token_type.eq_ignore_ascii_case("bearer") {
		"Bearer".into()
	} else if token_type.eq_ignore_ascii_case("mac") {
		"MAC".into()
	} else if token_type.eq_ignore_ascii_case("basic") {
		"Basic".into()
	} else if token_type.is_empty() {
		"Bearer".into()
	} else {
		token_type.into()
	}
}
