//! Typed CredHub operations over an [`AuthenticatedTransport`].

// crates.io
use reqwest::Method;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	config::ClientOptions,
	error::ConfigError,
	json::{self, fetch_json, put_json_and_fetch, send_json},
	model::{Credential, CredentialNames, CredentialRequest, Credentials, JsonObject},
	transport::{AuthStrategy, AuthenticatedTransport},
};

/// Path of the credential data collection below the base URL.
pub const DATA_PATH: &str = "api/v1/data";

/// Credential type used by the JSON helpers.
pub const JSON_TYPE: &str = "json";

/// CredHub client.
///
/// Lookups that find nothing (an empty `data` array or a `404`) yield `Ok(None)`; every other
/// failure is an [`Error`].
pub struct CredHubClient<T = AuthStrategy>
where
	T: ?Sized + AuthenticatedTransport,
{
	base_url: String,
	transport: Arc<T>,
}
impl CredHubClient {
	/// Builds a client from options, selecting and constructing the authentication strategy.
	pub async fn new(options: ClientOptions) -> Result<Self> {
		let transport = AuthStrategy::from_options(&options).await?;

		Ok(Self { base_url: options.base_url(), transport: Arc::new(transport) })
	}
}
impl<T> CredHubClient<T>
where
	T: ?Sized + AuthenticatedTransport,
{
	/// Wraps an existing transport; `base_url` is normalized the same way options are.
	pub fn with_transport(base_url: impl AsRef<str>, transport: Arc<T>) -> Self {
		Self { base_url: crate::config::normalize_base_url(Some(base_url.as_ref())), transport }
	}

	/// Normalized base URL.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Shared transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Lists credentials whose path starts with `path_prefix`.
	pub async fn find_by_path(&self, path_prefix: &str) -> Result<CredentialNames> {
		fetch_json(&*self.transport, self.data_url(&[("path", path_prefix)])?).await
	}

	/// Lists credentials whose name contains `name_prefix`.
	pub async fn find_by_name(&self, name_prefix: &str) -> Result<CredentialNames> {
		fetch_json(&*self.transport, self.data_url(&[("name-like", name_prefix)])?).await
	}

	/// Current version of `name` with an untyped value.
	pub async fn get_by_name(&self, name: &str) -> Result<Option<Credential<Value>>> {
		self.get_credential_by_name(name).await
	}

	/// Current version of the `json` credential `name`.
	pub async fn get_json_credential_by_name(
		&self,
		name: &str,
	) -> Result<Option<Credential<JsonObject>>> {
		self.get_credential_by_name(name).await
	}

	/// Value of the `json` credential `name`.
	pub async fn get_json_by_name(&self, name: &str) -> Result<Option<JsonObject>> {
		Ok(self.get_json_credential_by_name(name).await?.map(|credential| credential.value))
	}

	/// Current version of `name`, decoding the value as `V`.
	pub async fn get_credential_by_name<V>(&self, name: &str) -> Result<Option<Credential<V>>>
	where
		V: DeserializeOwned,
	{
		let url = self.data_url(&[("name", name), ("current", "true")])?;

		absent_on_not_found(fetch_json::<Credentials<V>, _>(&*self.transport, url).await)
			.map(|found| found.and_then(Credentials::into_first))
	}

	/// Credential version `id` with an untyped value.
	pub async fn get_by_id(&self, id: &str) -> Result<Option<Credential<Value>>> {
		self.get_credential_by_id(id).await
	}

	/// `json` credential version `id`.
	pub async fn get_json_credential_by_id(
		&self,
		id: &str,
	) -> Result<Option<Credential<JsonObject>>> {
		self.get_credential_by_id(id).await
	}

	/// Value of the `json` credential version `id`.
	pub async fn get_json_by_id(&self, id: &str) -> Result<Option<JsonObject>> {
		Ok(self.get_json_credential_by_id(id).await?.map(|credential| credential.value))
	}

	/// Credential version `id`, decoding the value as `V`.
	pub async fn get_credential_by_id<V>(&self, id: &str) -> Result<Option<Credential<V>>>
	where
		V: DeserializeOwned,
	{
		absent_on_not_found(fetch_json(&*self.transport, self.id_url(id)?).await)
	}

	/// Creates or replaces `name` with a value of type `kind`.
	pub async fn set_by_name(
		&self,
		kind: &str,
		name: &str,
		value: Value,
	) -> Result<Credential<Value>> {
		self.set_credential_by_name(&CredentialRequest::new(kind, name, value)).await
	}

	/// Creates or replaces the `json` credential `name`.
	pub async fn set_json_by_name(
		&self,
		name: &str,
		value: JsonObject,
	) -> Result<Credential<JsonObject>> {
		self.set_credential_by_name(&CredentialRequest::new(JSON_TYPE, name, value)).await
	}

	/// Sends a prepared request and decodes the stored version as `V`.
	pub async fn set_credential_by_name<P, V>(
		&self,
		request: &CredentialRequest<P>,
	) -> Result<Credential<V>>
	where
		P: Serialize,
		V: DeserializeOwned,
	{
		put_json_and_fetch(&*self.transport, self.data_url(&[])?, request).await
	}

	/// Deletes every version of `name`.
	pub async fn delete_by_name(&self, name: &str) -> Result<()> {
		send_json(&*self.transport, Method::DELETE, self.data_url(&[("name", name)])?).await
	}

	fn data_url(&self, query: &[(&str, &str)]) -> Result<Url> {
		let raw = format!("{}/{DATA_PATH}", self.base_url);
		let mut url = Url::parse(&raw).map_err(|source| ConfigError::invalid_url(&raw, source))?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		Ok(url)
	}

	fn id_url(&self, id: &str) -> Result<Url> {
		let mut url = self.data_url(&[])?;

		url.path_segments_mut()
			.map_err(|_| {
				ConfigError::invalid_url(
					self.base_url.as_str(),
					url::ParseError::RelativeUrlWithCannotBeABaseBase,
				)
			})?
			.push(id);

		Ok(url)
	}
}
impl<T> Clone for CredHubClient<T>
where
	T: ?Sized + AuthenticatedTransport,
{
	fn clone(&self) -> Self {
		Self { base_url: self.base_url.clone(), transport: self.transport.clone() }
	}
}
impl<T> Debug for CredHubClient<T>
where
	T: ?Sized + AuthenticatedTransport + Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredHubClient")
			.field("base_url", &self.base_url)
			.field("transport", &self.transport)
			.finish()
	}
}

fn absent_on_not_found<T>(result: Result<T>) -> Result<Option<T>> {
	match result {
		Ok(value) => Ok(Some(value)),
		Err(e) if json::is_not_found(&e) => Ok(None),
		Err(e) => Err(e),
	}
}
