//! Reads a JSON credential through the token strategy against a mocked CredHub and
//! authorization server.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use credhub_client::{ClientOptions, CredHubClient};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let info_body = format!("{{\"auth-server\":{{\"url\":\"{}\"}}}}", server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/info");
			then.status(200).header("content-type", "application/json").body(info_body);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body_includes("token_format=jwt");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-jwt\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;

	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/data")
				.query_param("name", "/demo/database")
				.query_param("current", "true")
				.header("authorization", "Bearer demo-jwt");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":[{"id":"5a1e","name":"/demo/database","type":"json","version_created_at":"2025-01-01T00:00:00Z","value":{"user":"admin","port":5432}}]}"#,
			);
		})
		.await;
	let options = ClientOptions::default()
		.with_url(server.base_url())
		.with_client_credentials("demo-client", "demo-secret");
	let client = CredHubClient::new(options).await?;
	let value = client.get_json_by_name("/demo/database").await?;

	println!("Credential value: {value:?}.");

	data_mock.assert_async().await;

	Ok(())
}
