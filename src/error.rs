//! Client-level error types shared across the credential, signing, and transport layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Every failure of a call, including credential refresh failures, is delivered through this type
/// exactly once.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential resolution failed (metadata service or incomplete payload).
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Transport failure (DNS, TCP, TLS, truncated body).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Service returned a non-success status with a JSON error payload.
	#[error("Service rejected the request with HTTP {status}: {payload}.")]
	Service {
		/// HTTP status code.
		status: u16,
		/// Parsed JSON error payload.
		payload: serde_json::Value,
		/// Raw response text.
		raw: String,
	},
	/// Service returned a non-success status without a parsable payload.
	#[error("Service responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response text.
		raw: String,
	},
	/// Successful response carried malformed JSON; the raw text is preserved.
	#[error("Service returned malformed JSON.")]
	ResponseParse {
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
		/// Raw response text.
		raw: String,
	},
	/// Response payload did not match the requested type.
	#[error("Response payload could not be decoded.")]
	Decode {
		/// Path-aware decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status attached to the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Service { status, .. } | Self::Status { status, .. } => Some(*status),
			Self::Credential(err) => err.status(),
			_ => None,
		}
	}

	/// Returns the raw response text, when the service answered at all.
	pub fn raw_body(&self) -> Option<&str> {
		match self {
			Self::Service { raw, .. } | Self::Status { raw, .. } | Self::ResponseParse { raw, .. } =>
				Some(raw),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// A header value contains bytes that are not allowed on the wire.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeaderValue {
		/// Header name.
		name: String,
		/// Underlying conversion failure.
		#[source]
		source: http::header::InvalidHeaderValue,
	},
	/// Endpoint URL cannot be parsed or has no host.
	#[error("Endpoint `{endpoint}` is invalid.")]
	InvalidEndpoint {
		/// Offending endpoint text.
		endpoint: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[source] serde_json::Error),
	/// Credentials lack an access key id or secret key.
	#[error("Credentials are missing the {missing}.")]
	MissingCredentials {
		/// Missing component label.
		missing: &'static str,
	},
	/// Region must not be empty.
	#[error("Region must not be empty.")]
	EmptyRegion,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Stage of the instance metadata protocol that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetadataStage {
	/// Listing the role attached to the instance.
	RoleLookup,
	/// Fetching the credentials issued for the role.
	CredentialFetch,
}
impl MetadataStage {
	/// Returns a stable label suitable for messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			MetadataStage::RoleLookup => "role lookup",
			MetadataStage::CredentialFetch => "credential fetch",
		}
	}
}
impl Display for MetadataStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Credential resolution failures.
///
/// Values are cheap to clone so a single coalesced refresh can hand the same outcome to every
/// waiting caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialError {
	/// Metadata endpoint could not be reached.
	#[error("Instance metadata {stage} failed: {message}.")]
	MetadataUnreachable {
		/// Protocol stage.
		stage: MetadataStage,
		/// Transport failure summary.
		message: String,
	},
	/// Metadata endpoint answered with a non-success status.
	#[error("Instance metadata {stage} returned HTTP {status}.")]
	MetadataStatus {
		/// Protocol stage.
		stage: MetadataStage,
		/// HTTP status code.
		status: u16,
	},
	/// No role is attached to the instance.
	#[error("Instance metadata did not report an attached role.")]
	NoRole,
	/// Credential payload is not valid JSON.
	#[error("Instance metadata credentials for role `{role}` are malformed: {message}.")]
	Malformed {
		/// Role name.
		role: String,
		/// Parser message.
		message: String,
	},
	/// Metadata service refused to issue credentials.
	#[error("Instance metadata rejected role `{role}` with code {code}: {message}.")]
	Rejected {
		/// Role name.
		role: String,
		/// Code reported by the service.
		code: String,
		/// Message reported by the service.
		message: String,
	},
	/// Credential payload lacks a required key.
	#[error("Instance metadata credentials for role `{role}` are missing the {missing}.")]
	Incomplete {
		/// Role name.
		role: String,
		/// Missing component label.
		missing: &'static str,
	},
	/// Expiration instant cannot be parsed.
	#[error("Instance metadata credentials carry an invalid expiration `{value}`.")]
	InvalidExpiration {
		/// Raw expiration text.
		value: String,
	},
}
impl CredentialError {
	/// Returns the metadata HTTP status, when the failure carried one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::MetadataStatus { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Connection closed before the response body completed.
	#[error("Connection closed after {received} response bytes.")]
	Closed {
		/// Bytes received before the close.
		received: usize,
	},
	/// Exchange finished without any terminal event.
	#[error("Exchange ended without a terminal event.")]
	Incomplete,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
