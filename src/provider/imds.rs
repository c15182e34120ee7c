//! Instance metadata credential lookup (role name, then role credentials).

// std
use std::error::Error as StdError;
// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	error::{CredentialError, MetadataStage},
	http::{HttpExchange, RpcHttpClient},
};

/// Link-local address of the instance metadata service.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254";
/// Path listing the role attached to the instance; suffixed with the role name for credentials.
pub const SECURITY_CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";

/// Client for the two-step instance metadata protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceMetadata {
	base: String,
}
impl InstanceMetadata {
	/// Targets a custom metadata endpoint (scheme, host, optional port).
	pub fn new(endpoint: &Url) -> Self {
		Self { base: endpoint.as_str().trim_end_matches('/').to_owned() }
	}

	/// Base URL requests are issued against.
	pub fn endpoint(&self) -> &str {
		&self.base
	}

	/// Fetches the attached role, then that role's credentials.
	pub async fn fetch<C>(&self, http_client: &C) -> Result<Credentials, CredentialError>
	where
		C: ?Sized + RpcHttpClient,
	{
		let listing = format!("{}{SECURITY_CREDENTIALS_PATH}", self.base);
		let role = self.get(http_client, MetadataStage::RoleLookup, &listing).await?;
		let role = role.body.trim();

		// Only the first listed role is used.
		let role = role.lines().next().map(str::trim).unwrap_or_default();

		if role.is_empty() {
			return Err(CredentialError::NoRole);
		}

		let url = format!("{listing}{role}");
		let exchange = self.get(http_client, MetadataStage::CredentialFetch, &url).await?;

		parse_role_credentials(role, &exchange.body)
	}

	async fn get<C>(
		&self,
		http_client: &C,
		stage: MetadataStage,
		url: &str,
	) -> Result<HttpExchange, CredentialError>
	where
		C: ?Sized + RpcHttpClient,
	{
		let request = http::Request::builder()
			.method(http::Method::GET)
			.uri(url)
			.body(Vec::new())
			.map_err(|e| CredentialError::MetadataUnreachable { stage, message: describe(&e) })?;
		let exchange = http_client
			.send(request)
			.await
			.map_err(|e| CredentialError::MetadataUnreachable { stage, message: describe(&e) })?;

		if exchange.status != 200 {
			return Err(CredentialError::MetadataStatus { stage, status: exchange.status });
		}

		Ok(exchange)
	}
}
impl Default for InstanceMetadata {
	fn default() -> Self {
		Self { base: DEFAULT_METADATA_ENDPOINT.to_owned() }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct RoleCredentials {
	code: Option<String>,
	message: Option<String>,
	access_key_id: Option<String>,
	secret_access_key: Option<String>,
	token: Option<String>,
	expiration: Option<String>,
}

// Flattens the source chain; transport errors keep the useful detail in their sources.
fn describe(error: &dyn StdError) -> String {
	let mut message = error.to_string();
	let mut source = error.source();

	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());

		source = cause.source();
	}

	message
}

fn parse_role_credentials(role: &str, body: &str) -> Result<Credentials, CredentialError> {
	let payload = serde_json::from_str::<RoleCredentials>(body)
		.map_err(|e| CredentialError::Malformed { role: role.to_owned(), message: e.to_string() })?;

	if let Some(code) = payload.code.as_deref().filter(|code| *code != "Success") {
		return Err(CredentialError::Rejected {
			role: role.to_owned(),
			code: code.to_owned(),
			message: payload.message.unwrap_or_default(),
		});
	}

	let access_key_id = payload
		.access_key_id
		.filter(|value| !value.is_empty())
		.ok_or_else(|| CredentialError::Incomplete { role: role.to_owned(), missing: "access key id" })?;
	let secret_access_key =
		payload.secret_access_key.filter(|value| !value.is_empty()).ok_or_else(|| {
			CredentialError::Incomplete { role: role.to_owned(), missing: "secret access key" }
		})?;
	let mut credentials = Credentials::new(access_key_id, secret_access_key);

	if let Some(token) = payload.token.filter(|value| !value.is_empty()) {
		credentials = credentials.with_session_token(token);
	}
	if let Some(expiration) = payload.expiration {
		let instant = OffsetDateTime::parse(&expiration, &Rfc3339)
			.map_err(|_| CredentialError::InvalidExpiration { value: expiration.clone() })?;

		credentials = credentials.with_expiration(instant);
	}

	Ok(credentials)
}
