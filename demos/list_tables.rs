//! Demonstrates a signed `ListTables` call whose credentials come from a (mocked) instance
//! metadata service, then reuses the cached role credentials for a second call.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
// self
use dyndb::{
	client::Client,
	config::ClientConfig,
	http::ReqwestHttpClient,
	provider::SECURITY_CREDENTIALS_PATH,
	reqwest::Client as ReqwestClient,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListTablesOutput {
	table_names: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _role = server
		.mock_async(|when, then| {
			when.method(GET).path(SECURITY_CREDENTIALS_PATH);
			then.status(200).body("demo-role");
		})
		.await;
	let _credentials = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("{SECURITY_CREDENTIALS_PATH}demo-role"));
			then.status(200).body(
				"{\"Code\":\"Success\",\"AccessKeyId\":\"ASIADEMO\",\"SecretAccessKey\":\"demo-secret\",\"Token\":\"demo-token\",\"Expiration\":\"2999-01-01T00:00:00Z\"}",
			);
		})
		.await;
	let service = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/")
				.header("x-amz-target", "DynamoDB_20111205.ListTables")
				.header("x-amz-security-token", "demo-token");
			then.status(200).body("{\"TableNames\":[\"users\",\"orders\"]}");
		})
		.await;
	let config = ClientConfig::builder()
		.region("us-west-2")
		.endpoint(server.base_url())
		.metadata_endpoint(server.base_url())
		.build()?;
	let client = <Client<ReqwestHttpClient>>::with_http_client(
		config,
		ReqwestHttpClient::with_client(ReqwestClient::builder().build()?),
	);
	let first = client.call_as::<ListTablesOutput>("ListTables", ()).await?;
	let second = client.call("ListTables", ()).await?;

	println!("Tables: {}.", first.table_names.join(", "));
	println!("Raw response: {}.", second.raw);
	println!("Metadata fetches: {}.", client.refresh_metrics().fetches());

	service.assert_calls_async(2).await;

	Ok(())
}
