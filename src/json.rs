//! JSON request helpers layered on an [`AuthenticatedTransport`].
//!
//! Responses are checked for a success status before decoding; failures keep the status and a
//! bounded slice of the body. Decoding goes through `serde_path_to_error` so callers learn which
//! field failed.

// crates.io
use reqwest::{
	Method, StatusCode,
	header::{ACCEPT, CONTENT_TYPE, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	error::{DecodeError, EncodeError, TransportError},
	transport::AuthenticatedTransport,
};

const MAX_ERROR_BODY: usize = 512;

/// Sends `GET url` and decodes the JSON response into `T`.
pub async fn fetch_json<T, A>(transport: &A, url: Url) -> Result<T>
where
	T: DeserializeOwned,
	A: ?Sized + AuthenticatedTransport,
{
	let mut request = Request::new(Method::GET, url);

	request.headers_mut().insert(ACCEPT, application_json());

	decode(transport.execute(request).await?).await
}

/// Serializes `payload`, sends `PUT url`, and decodes the JSON response into `T`.
pub async fn put_json_and_fetch<T, P, A>(transport: &A, url: Url, payload: &P) -> Result<T>
where
	T: DeserializeOwned,
	P: ?Sized + Serialize,
	A: ?Sized + AuthenticatedTransport,
{
	let body = serde_json::to_vec(payload).map_err(EncodeError)?;
	let mut request = Request::new(Method::PUT, url);

	request.headers_mut().insert(ACCEPT, application_json());
	request.headers_mut().insert(CONTENT_TYPE, application_json());
	*request.body_mut() = Some(body.into());

	decode(transport.execute(request).await?).await
}

/// Sends a body-less request and only checks the status; the response body is discarded.
pub async fn send_json<A>(transport: &A, method: Method, url: Url) -> Result<()>
where
	A: ?Sized + AuthenticatedTransport,
{
	let mut request = Request::new(method, url);

	request.headers_mut().insert(ACCEPT, application_json());

	let response = transport.execute(request).await?;

	ensure_success(response).await.map(|_| ())
}

/// Returns `true` for [`Error::Status`] carrying `404 Not Found`.
pub(crate) fn is_not_found(err: &Error) -> bool {
	err.status() == Some(StatusCode::NOT_FOUND.as_u16())
}

fn application_json() -> HeaderValue {
	HeaderValue::from_static("application/json")
}

async fn decode<T>(response: Response) -> Result<T>
where
	T: DeserializeOwned,
{
	let (status, body) = ensure_success(response).await?;
	let mut de = serde_json::Deserializer::from_slice(&body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| DecodeError { source, status: status.as_u16() }.into())
}

async fn ensure_success(response: Response) -> Result<(StatusCode, Vec<u8>)> {
	let status = response.status();
	let body = response.bytes().await.map_err(TransportError::from)?;

	if !status.is_success() {
		return Err(Error::Status { status: status.as_u16(), body: truncate(&body) });
	}

	Ok((status, body.to_vec()))
}

fn truncate(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	match trimmed.char_indices().nth(MAX_ERROR_BODY) {
		Some((cut, _)) => format!("{}…", &trimmed[..cut]),
		None => trimmed.to_owned(),
	}
}
