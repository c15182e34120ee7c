//! Service descriptor: naming, API version, and wire content type of the RPC endpoint.

// self
use crate::_prelude::*;

/// Identifies the JSON-RPC service a client talks to.
///
/// The defaults describe the document database JSON 1.0 protocol; other services speaking the
/// same envelope differ only in these fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceDescriptor {
	/// Service name as used in the target header (e.g. `DynamoDB`).
	pub name: String,
	/// API version stamp appended to the name in the target header.
	pub api_version: String,
	/// Domain suffix the regional host is built on.
	pub domain: String,
	/// `Content-Type` of request bodies.
	pub content_type: String,
}
impl ServiceDescriptor {
	/// Default service name.
	pub const DEFAULT_NAME: &str = "DynamoDB";
	/// Default API version.
	pub const DEFAULT_API_VERSION: &str = "20111205";
	/// Default domain suffix.
	pub const DEFAULT_DOMAIN: &str = "amazonaws.com";
	/// JSON 1.0 protocol content type.
	pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";

	/// Creates a descriptor for `name` at `api_version` with the default domain and content type.
	pub fn new(name: impl Into<String>, api_version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			api_version: api_version.into(),
			domain: Self::DEFAULT_DOMAIN.into(),
			content_type: Self::JSON_CONTENT_TYPE.into(),
		}
	}

	/// Overrides the domain suffix.
	pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = domain.into();

		self
	}

	/// Overrides the request content type.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = content_type.into();

		self
	}

	/// Lower-cased name used in the credential scope and host.
	pub fn signing_name(&self) -> String {
		self.name.to_lowercase()
	}

	/// Regional host, e.g. `dynamodb.us-east-1.amazonaws.com`.
	pub fn host(&self, region: &str) -> String {
		format!("{}.{region}.{}", self.signing_name(), self.domain)
	}

	/// Target header value for `operation`, e.g. `DynamoDB_20111205.ListTables`.
	pub fn target(&self, operation: &str) -> String {
		format!("{}_{}.{operation}", self.name, self.api_version)
	}
}
impl Default for ServiceDescriptor {
	fn default() -> Self {
		Self::new(Self::DEFAULT_NAME, Self::DEFAULT_API_VERSION)
	}
}
