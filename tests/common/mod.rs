//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
// self
use dyndb::{
	client::Client,
	config::ClientConfig,
	http::ReqwestHttpClient,
	provider::SECURITY_CREDENTIALS_PATH,
	reqwest::{Client as ReqwestClient, redirect::Policy},
};

/// Access key id of the reference signing fixture.
pub const TEST_ACCESS_KEY_ID: &str = "AKIDEXAMPLE";
/// Secret key of the reference signing fixture.
pub const TEST_SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";
/// Role attached to the mock instance.
pub const TEST_ROLE: &str = "web-role";

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by `httpmock`.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Constructs a [`Client`] posting to `endpoint` with the reference static credentials.
pub fn build_static_test_client(endpoint: &str) -> Client<ReqwestHttpClient> {
	let config = ClientConfig::builder()
		.access_key_id(TEST_ACCESS_KEY_ID)
		.secret_access_key(TEST_SECRET_ACCESS_KEY)
		.endpoint(endpoint)
		.build()
		.expect("Static test configuration should build.");

	Client::with_http_client(config, test_reqwest_http_client())
}

/// Constructs a [`Client`] posting to `endpoint` with credentials from `metadata_endpoint`.
pub fn build_metadata_test_client(
	endpoint: &str,
	metadata_endpoint: &str,
) -> Client<ReqwestHttpClient> {
	let config = ClientConfig::builder()
		.endpoint(endpoint)
		.metadata_endpoint(metadata_endpoint)
		.build()
		.expect("Metadata test configuration should build.");

	Client::with_http_client(config, test_reqwest_http_client())
}

/// Role credential payload expiring `lifetime` from now.
pub fn role_credentials_body(lifetime: Duration) -> String {
	let expiration = (OffsetDateTime::now_utc() + lifetime)
		.format(&Rfc3339)
		.expect("Expiration fixture should format.");

	format!(
		r#"{{"Code":"Success","LastUpdated":"2012-02-15T00:00:00Z","Type":"AWS-HMAC","AccessKeyId":"ASIAEXAMPLE","SecretAccessKey":"role-secret","Token":"role-token","Expiration":"{expiration}"}}"#
	)
}

/// Mounts the role listing and role credential endpoints on `server`.
pub async fn mock_metadata<'a>(
	server: &'a MockServer,
	credentials_body: &str,
) -> (httpmock::Mock<'a>, httpmock::Mock<'a>) {
	let role = server
		.mock_async(|when, then| {
			when.method(GET).path(SECURITY_CREDENTIALS_PATH);
			then.status(200).body(TEST_ROLE);
		})
		.await;
	let credentials_path = format!("{SECURITY_CREDENTIALS_PATH}{TEST_ROLE}");
	let credentials = server
		.mock_async(|when, then| {
			when.method(GET).path(credentials_path);
			then.status(200).header("content-type", "application/json").body(credentials_body);
		})
		.await;

	(role, credentials)
}
