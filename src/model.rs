//! Wire schema for the CredHub data and info endpoints.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// JSON object payload, used for `json`-typed credentials and metadata.
pub type JsonObject = Map<String, Value>;

/// Document returned by the unauthenticated `/info` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
	/// Authorization server advertised for token authentication.
	#[serde(rename = "auth-server")]
	pub auth_server: AuthServerInfo,
	/// Application block; absent on some deployments.
	#[serde(default)]
	pub app: AppInfo,
}

/// `auth-server` block of [`ServiceInfo`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthServerInfo {
	/// Base URL of the authorization server.
	pub url: String,
}

/// `app` block of [`ServiceInfo`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
	/// Application name reported by the service.
	#[serde(default)]
	pub name: String,
}

/// Result of a path- or name-prefix search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialNames {
	/// Matching credential names.
	#[serde(default)]
	pub credentials: Vec<CredentialName>,
}

/// Single entry of [`CredentialNames`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialName {
	/// Fully qualified credential name.
	pub name: String,
	/// Creation instant of the latest version.
	#[serde(with = "time::serde::rfc3339")]
	pub version_created_at: OffsetDateTime,
}

/// Request body for create-or-update by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredentialRequest<V> {
	/// Credential name.
	pub name: String,
	/// Credential type (`value`, `json`, `password`, ...).
	#[serde(rename = "type")]
	pub kind: String,
	/// Credential value.
	pub value: V,
	/// Optional metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<JsonObject>,
}
impl<V> CredentialRequest<V> {
	/// Creates a request without metadata.
	pub fn new(kind: impl Into<String>, name: impl Into<String>, value: V) -> Self {
		Self { name: name.into(), kind: kind.into(), value, metadata: None }
	}

	/// Attaches metadata to the request.
	pub fn with_metadata(mut self, metadata: JsonObject) -> Self {
		self.metadata = Some(metadata);

		self
	}
}

/// Stored credential version, generic over the value shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credential<T> {
	/// Version identifier.
	pub id: String,
	/// Credential name.
	pub name: String,
	/// Credential type.
	#[serde(rename = "type")]
	pub kind: String,
	/// Creation instant of this version.
	#[serde(with = "time::serde::rfc3339")]
	pub version_created_at: OffsetDateTime,
	/// Credential value.
	pub value: T,
	/// Optional metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<JsonObject>,
}

/// Envelope returned by name lookups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credentials<T> {
	/// Matching versions, newest first.
	#[serde(default = "Vec::new")]
	pub data: Vec<Credential<T>>,
}
impl<T> Credentials<T> {
	/// Takes the first (current) version, if any.
	pub fn into_first(self) -> Option<Credential<T>> {
		self.data.into_iter().next()
	}
}
