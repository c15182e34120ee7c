#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use dyndb::{
	error::{CredentialError, Error, MetadataStage},
	provider::{CredentialProvider, CredentialSource, InstanceMetadata, SECURITY_CREDENTIALS_PATH},
};

fn provider_for(server: &MockServer) -> CredentialProvider<dyndb::http::ReqwestHttpClient> {
	let endpoint = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	CredentialProvider::new(
		CredentialSource::InstanceMetadata(InstanceMetadata::new(&endpoint)),
		Arc::new(common::test_reqwest_http_client()),
	)
}

#[tokio::test]
async fn credentials_expiring_inside_window_are_fetched_every_time() {
	let server = MockServer::start_async().await;
	let (role, credentials) =
		common::mock_metadata(&server, &common::role_credentials_body(Duration::minutes(4))).await;
	let provider = provider_for(&server);

	for _ in 0..2 {
		let resolved = provider.resolve().await.expect("Metadata credentials should resolve.");

		assert_eq!(resolved.access_key_id, "ASIAEXAMPLE");
		assert_eq!(resolved.session_token.as_ref().map(|token| token.expose()), Some("role-token"));
	}

	role.assert_calls_async(2).await;
	credentials.assert_calls_async(2).await;
}

#[tokio::test]
async fn credentials_outside_window_are_reused() {
	let server = MockServer::start_async().await;
	let (role, credentials) =
		common::mock_metadata(&server, &common::role_credentials_body(Duration::minutes(10))).await;
	let provider = provider_for(&server);
	let first = provider.resolve().await.expect("Initial fetch should succeed.");
	let second = provider.resolve().await.expect("Cached credentials should be reused.");

	assert!(Arc::ptr_eq(&first, &second));

	role.assert_calls_async(1).await;
	credentials.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_resolves_trigger_one_fetch() {
	let server = MockServer::start_async().await;
	let (role, credentials) =
		common::mock_metadata(&server, &common::role_credentials_body(Duration::hours(6))).await;
	let provider = provider_for(&server);
	let (a, b, c, d) =
		tokio::join!(provider.resolve(), provider.resolve(), provider.resolve(), provider.resolve());

	for resolved in [a, b, c, d] {
		assert_eq!(resolved.expect("Coalesced resolve should succeed.").access_key_id, "ASIAEXAMPLE");
	}

	role.assert_calls_async(1).await;
	credentials.assert_calls_async(1).await;

	let metrics = provider.metrics();

	assert_eq!(metrics.fetches(), 1);
	assert_eq!(metrics.attempts(), 4);
	assert_eq!(metrics.successes(), 4);
}

#[tokio::test]
async fn missing_secret_key_is_a_credential_error() {
	let server = MockServer::start_async().await;
	let (_role, _credentials) = common::mock_metadata(
		&server,
		r#"{"Code":"Success","AccessKeyId":"ASIAEXAMPLE","Token":"role-token","Expiration":"2030-01-01T00:00:00Z"}"#,
	)
	.await;
	let provider = provider_for(&server);
	let err = provider.resolve().await.expect_err("Incomplete payload should be rejected.");

	assert!(matches!(
		err,
		Error::Credential(CredentialError::Incomplete { ref role, missing: "secret access key" })
			if role == common::TEST_ROLE
	));
	assert!(provider.current().is_none());
}

#[tokio::test]
async fn empty_role_listing_is_a_credential_error() {
	let server = MockServer::start_async().await;
	let role = server
		.mock_async(|when, then| {
			when.method(GET).path(SECURITY_CREDENTIALS_PATH);
			then.status(200).body("  \n");
		})
		.await;
	let provider = provider_for(&server);
	let err = provider.resolve().await.expect_err("Empty role listing should be rejected.");

	assert!(matches!(err, Error::Credential(CredentialError::NoRole)));

	role.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_role_reports_code() {
	let server = MockServer::start_async().await;
	let (_role, _credentials) = common::mock_metadata(
		&server,
		r#"{"Code":"AssumeRoleUnauthorizedAccess","Message":"EC2 cannot assume the role."}"#,
	)
	.await;
	let provider = provider_for(&server);
	let err = provider.resolve().await.expect_err("Rejected role should fail.");

	assert!(matches!(
		err,
		Error::Credential(CredentialError::Rejected { ref code, .. })
			if code == "AssumeRoleUnauthorizedAccess"
	));
}

#[tokio::test]
async fn metadata_status_names_stage() {
	let server = MockServer::start_async().await;
	let _role = server
		.mock_async(|when, then| {
			when.method(GET).path(SECURITY_CREDENTIALS_PATH);
			then.status(404).body("Not Found");
		})
		.await;
	let provider = provider_for(&server);
	let err = provider.resolve().await.expect_err("Missing metadata should fail.");

	assert_eq!(err.status(), Some(404));
	assert!(matches!(
		err,
		Error::Credential(CredentialError::MetadataStatus { stage: MetadataStage::RoleLookup, .. })
	));
}
