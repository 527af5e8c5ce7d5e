mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::{CLIENT_ID, CLIENT_SECRET, mock_info, mock_token};
use credhub_client::{ClientOptions, CredHubClient, model::JsonObject, transport::AuthStrategy};

const STORED: &str = r#"{
	"id": "2993f622-cb1e-4e00-a267-4b23c273bf3d",
	"name": "/svc/config",
	"type": "json",
	"version_created_at": "2025-04-05T06:07:08Z",
	"value": {"mode": "strict", "retries": 3}
}"#;

async fn token_client(server: &MockServer) -> CredHubClient {
	mock_info(server).await;
	mock_token(server, "jwt-facade", 3600).await;

	let options = ClientOptions::default()
		.with_url(server.base_url())
		.with_client_credentials(CLIENT_ID, CLIENT_SECRET);

	CredHubClient::new(options).await.expect("Token client should build.")
}

#[tokio::test]
async fn client_selects_token_strategy_with_credentials() {
	let server = MockServer::start_async().await;
	let client = token_client(&server).await;

	assert!(matches!(client.transport().as_ref(), AuthStrategy::Token(_)));
	assert_eq!(client.transport().metrics().attempts(), 1);
}

#[tokio::test]
async fn json_credentials_round_trip_through_service() {
	let server = MockServer::start_async().await;
	let client = token_client(&server).await;
	let put_mock = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/api/v1/data")
				.header("authorization", "Bearer jwt-facade")
				.header("content-type", "application/json")
				.json_body(json!({
					"name": "/svc/config",
					"type": "json",
					"value": {"mode": "strict", "retries": 3}
				}));
			then.status(200).header("content-type", "application/json").body(STORED);
		})
		.await;
	let get_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/data")
				.query_param("name", "/svc/config")
				.query_param("current", "true");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"data\":[{STORED}]}}"));
		})
		.await;
	let mut value = JsonObject::new();

	value.insert("mode".into(), json!("strict"));
	value.insert("retries".into(), json!(3));

	let stored =
		client.set_json_by_name("/svc/config", value.clone()).await.expect("Set should succeed.");

	assert_eq!(stored.id, "2993f622-cb1e-4e00-a267-4b23c273bf3d");
	assert_eq!(stored.value, value);

	let fetched = client
		.get_json_by_name("/svc/config")
		.await
		.expect("Get should succeed.")
		.expect("Credential should be present.");

	assert_eq!(fetched, value);

	put_mock.assert_async().await;
	get_mock.assert_async().await;
}

#[tokio::test]
async fn missing_credentials_are_absent_not_errors() {
	let server = MockServer::start_async().await;
	let client = token_client(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/data").query_param("name", "/svc/empty");
			then.status(200).header("content-type", "application/json").body("{\"data\":[]}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/data").query_param("name", "/svc/gone");
			then.status(404)
				.header("content-type", "application/json")
				.body("{\"error\":\"The credential does not exist.\"}");
		})
		.await;

	assert!(client.get_by_name("/svc/empty").await.expect("Empty data is absence.").is_none());
	assert!(client.get_by_name("/svc/gone").await.expect("404 is absence.").is_none());
}

#[tokio::test]
async fn find_and_delete_use_query_parameters() {
	let server = MockServer::start_async().await;
	let client = token_client(&server).await;
	let find_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/data").query_param("name-like", "config");
			then.status(200).header("content-type", "application/json").body(
				r#"{"credentials":[{"name":"/svc/config","version_created_at":"2025-04-05T06:07:08Z"}]}"#,
			);
		})
		.await;
	let delete_mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/data").query_param("name", "/svc/config");
			then.status(204);
		})
		.await;
	let names = client.find_by_name("config").await.expect("Search should succeed.");

	assert_eq!(names.credentials[0].name, "/svc/config");

	client.delete_by_name("/svc/config").await.expect("Delete should succeed.");

	find_mock.assert_async().await;
	delete_mock.assert_async().await;
}

#[tokio::test]
async fn failed_delete_reports_status() {
	let server = MockServer::start_async().await;
	let client = token_client(&server).await;

	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/data");
			then.status(403).body("{\"error\":\"forbidden\"}");
		})
		.await;

	let err = client.delete_by_name("/svc/locked").await.expect_err("403 should fail.");

	assert_eq!(err.status(), Some(403));
}
