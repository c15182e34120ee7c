//! Client configuration: builder, validation, and environment fallback.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, Secret},
	error::ConfigError,
	provider::{CredentialSource, InstanceMetadata},
	service::ServiceDescriptor,
};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variable holding the access key id.
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding the session token.
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
/// Environment variable holding the region.
pub const ENV_REGION: &str = "AWS_REGION";
/// Fallback environment variable holding the region.
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
/// Environment variable overriding the instance metadata endpoint.
pub const ENV_METADATA_ENDPOINT: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Access key id; static credentials require it together with the secret key.
	pub access_key_id: Option<String>,
	/// Secret access key.
	pub secret_access_key: Option<Secret>,
	/// Session token attached to static credentials.
	pub session_token: Option<Secret>,
	/// Signing region.
	pub region: String,
	/// Endpoint replacing the regional host (local emulators, proxies).
	pub endpoint: Option<Url>,
	/// Instance metadata endpoint replacing the link-local default.
	pub metadata_endpoint: Option<Url>,
	/// Target service.
	pub service: ServiceDescriptor,
	/// Memoize derived signing keys across calls.
	pub cache_signing_keys: bool,
}
impl ClientConfig {
	/// Starts a builder with defaults (region `us-east-1`, default service, no credentials).
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Builds a configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		ClientConfigBuilder::from_env().build()
	}

	/// Credential source implied by this configuration.
	///
	/// Both keys present selects static credentials; anything else falls back to instance
	/// metadata.
	pub fn credential_source(&self) -> CredentialSource {
		match (&self.access_key_id, &self.secret_access_key) {
			(Some(access_key_id), Some(secret)) if !access_key_id.is_empty() && !secret.is_empty() => {
				let mut credentials = Credentials::new(access_key_id.clone(), secret.clone());

				if let Some(token) = self.session_token.clone() {
					credentials = credentials.with_session_token(token);
				}

				CredentialSource::Static(credentials)
			},
			_ => CredentialSource::InstanceMetadata(
				self.metadata_endpoint.as_ref().map(InstanceMetadata::new).unwrap_or_default(),
			),
		}
	}

	/// Host, with port when non-default, that calls are addressed to.
	pub fn host(&self) -> String {
		match &self.endpoint {
			Some(endpoint) => host_of(endpoint),
			None => self.service.host(&self.region),
		}
	}

	/// Full URL calls are posted to.
	pub fn request_url(&self) -> String {
		match &self.endpoint {
			Some(endpoint) => endpoint.as_str().to_owned(),
			None => format!("https://{}/", self.service.host(&self.region)),
		}
	}

	/// Request path covered by the signature.
	pub fn request_path(&self) -> &str {
		self.endpoint.as_ref().map(Url::path).unwrap_or("/")
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct ClientConfigBuilder {
	access_key_id: Option<String>,
	secret_access_key: Option<Secret>,
	session_token: Option<Secret>,
	region: Option<String>,
	endpoint: Option<String>,
	metadata_endpoint: Option<String>,
	service: Option<ServiceDescriptor>,
	cache_signing_keys: bool,
}
impl ClientConfigBuilder {
	/// Seeds a builder from the process environment; explicit setters still override it.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Seeds a builder from an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		// Blank variables count as unset.
		let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

		Self {
			access_key_id: var(ENV_ACCESS_KEY_ID),
			secret_access_key: var(ENV_SECRET_ACCESS_KEY).map(Secret::new),
			session_token: var(ENV_SESSION_TOKEN).map(Secret::new),
			region: var(ENV_REGION).or_else(|| var(ENV_DEFAULT_REGION)),
			metadata_endpoint: var(ENV_METADATA_ENDPOINT),
			..Default::default()
		}
	}

	/// Sets the access key id.
	pub fn access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
		self.access_key_id = Some(access_key_id.into());

		self
	}

	/// Sets the secret access key.
	pub fn secret_access_key(mut self, secret: impl Into<Secret>) -> Self {
		self.secret_access_key = Some(secret.into());

		self
	}

	/// Sets the session token sent with static credentials.
	pub fn session_token(mut self, token: impl Into<Secret>) -> Self {
		self.session_token = Some(token.into());

		self
	}

	/// Sets the signing region.
	pub fn region(mut self, region: impl Into<String>) -> Self {
		self.region = Some(region.into());

		self
	}

	/// Posts calls to `endpoint` instead of the regional host.
	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());

		self
	}

	/// Fetches role credentials from `endpoint` instead of the link-local default.
	pub fn metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.metadata_endpoint = Some(endpoint.into());

		self
	}

	/// Overrides the target service.
	pub fn service(mut self, service: ServiceDescriptor) -> Self {
		self.service = Some(service);

		self
	}

	/// Enables the derived signing key cache.
	pub fn cache_signing_keys(mut self, enabled: bool) -> Self {
		self.cache_signing_keys = enabled;

		self
	}

	/// Validates the collected values.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_owned());
		let region = region.trim().to_owned();

		if region.is_empty() {
			return Err(ConfigError::EmptyRegion);
		}

		Ok(ClientConfig {
			access_key_id: self.access_key_id,
			secret_access_key: self.secret_access_key,
			session_token: self.session_token,
			region,
			endpoint: self.endpoint.as_deref().map(parse_endpoint).transpose()?,
			metadata_endpoint: self.metadata_endpoint.as_deref().map(parse_endpoint).transpose()?,
			service: self.service.unwrap_or_default(),
			cache_signing_keys: self.cache_signing_keys,
		})
	}
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
	let invalid = || ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned() };
	let url = Url::parse(endpoint).map_err(|_| invalid())?;

	if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
		return Err(invalid());
	}

	Ok(url)
}

fn host_of(url: &Url) -> String {
	let host = url.host_str().unwrap_or_default();

	match url.port() {
		Some(port) => format!("{host}:{port}"),
		None => host.to_owned(),
	}
}
