//! AWS Signature V4 signing for JSON-RPC envelopes.
//!
//! [`sign`] is a pure function of its inputs: credentials, the request parts, the captured
//! timestamp, region, and service. The query string is never signed. [`RequestSigner`] binds the
//! region/service pair and can memoize the derived signing key through a [`SigningKeyCache`]
//! without changing the produced headers.

pub mod canonical;
pub mod key;

pub use canonical::*;
pub use key::*;

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue,
	header::{AUTHORIZATION, HOST},
};
use time::UtcOffset;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, Secret},
	error::ConfigError,
};

/// Algorithm identifier leading the string to sign and the `Authorization` header.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
/// Header carrying the session token of role credentials.
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";
/// Header carrying the request timestamp.
pub const DATE_HEADER: &str = "x-amz-date";

/// Formats an instant as `YYYYMMDDTHHMMSSZ` in UTC.
pub fn format_basic_iso8601(instant: OffsetDateTime) -> String {
	let utc = instant.to_offset(UtcOffset::UTC);

	format!(
		"{:04}{:02}{:02}T{:02}{:02}{:02}Z",
		utc.year(),
		u8::from(utc.month()),
		utc.day(),
		utc.hour(),
		utc.minute(),
		utc.second()
	)
}

/// Borrowed view of the request parts covered by the signature.
#[derive(Clone, Copy, Debug)]
pub struct SigningRequest<'a> {
	/// HTTP method.
	pub method: &'a str,
	/// Host (with port when non-default) added as the `host` header.
	pub host: &'a str,
	/// Unencoded request path.
	pub path: &'a str,
	/// Caller-supplied headers; names are matched case-insensitively.
	pub headers: &'a [(String, String)],
	/// Exact body bytes sent on the wire.
	pub body: &'a [u8],
}

/// Headers produced by signing plus the intermediate artifacts for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
	/// Full `Authorization` header value.
	pub authorization: String,
	/// Session token header value, when the credentials carry one.
	pub security_token: Option<Secret>,
	/// Basic ISO-8601 timestamp used in the string to sign.
	pub timestamp: String,
	/// `date/region/service/aws4_request`.
	pub credential_scope: String,
	/// Sorted, lower-cased header names joined with `;`.
	pub signed_header_names: String,
	/// Canonical request string that was hashed.
	pub canonical_request: String,
	/// String to sign.
	pub string_to_sign: String,
	/// Lower-case hex signature.
	pub signature: String,
}
impl SignedHeaders {
	/// Writes the `Authorization` (and session token) headers into `headers`.
	///
	/// Both values are marked sensitive so HTTP stacks keep them out of debug output.
	pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), ConfigError> {
		if let Some(token) = &self.security_token {
			headers.insert(
				HeaderName::from_static(SECURITY_TOKEN_HEADER),
				sensitive_value(SECURITY_TOKEN_HEADER, token.expose())?,
			);
		}

		headers.insert(AUTHORIZATION, sensitive_value("authorization", &self.authorization)?);

		Ok(())
	}
}

/// Signs `request` with `credentials` at `timestamp`, deriving the signing key from scratch.
pub fn sign(
	credentials: &Credentials,
	request: &SigningRequest<'_>,
	timestamp: OffsetDateTime,
	region: &str,
	service: &str,
) -> Result<SignedHeaders, ConfigError> {
	sign_with(credentials, request, timestamp, region, service, None)
}

/// Region/service-bound signer with an optional derived-key cache.
#[derive(Clone, Debug)]
pub struct RequestSigner {
	region: String,
	service: String,
	key_cache: Option<Arc<SigningKeyCache>>,
}
impl RequestSigner {
	/// Creates a signer for the provided region and service.
	pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
		Self { region: region.into(), service: service.into(), key_cache: None }
	}

	/// Memoizes derived signing keys in `cache`.
	pub fn with_key_cache(mut self, cache: Arc<SigningKeyCache>) -> Self {
		self.key_cache = Some(cache);

		self
	}

	/// Region bound to this signer.
	pub fn region(&self) -> &str {
		&self.region
	}

	/// Service bound to this signer.
	pub fn service(&self) -> &str {
		&self.service
	}

	/// Signs `request` at `timestamp`.
	pub fn sign(
		&self,
		credentials: &Credentials,
		request: &SigningRequest<'_>,
		timestamp: OffsetDateTime,
	) -> Result<SignedHeaders, ConfigError> {
		sign_with(
			credentials,
			request,
			timestamp,
			&self.region,
			&self.service,
			self.key_cache.as_deref(),
		)
	}
}

fn sign_with(
	credentials: &Credentials,
	request: &SigningRequest<'_>,
	timestamp: OffsetDateTime,
	region: &str,
	service: &str,
	key_cache: Option<&SigningKeyCache>,
) -> Result<SignedHeaders, ConfigError> {
	credentials.ensure_complete()?;

	let timestamp = format_basic_iso8601(timestamp);
	let mut headers = request
		.headers
		.iter()
		.map(|(name, value)| (name.as_str(), value.as_str()))
		.collect::<Vec<_>>();

	if let Some(token) = &credentials.session_token {
		headers.push((SECURITY_TOKEN_HEADER, token.expose()));
	}
	if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case(HOST.as_str())) {
		headers.push((HOST.as_str(), request.host));
	}

	let canonical = CanonicalRequest::new(request.method, request.path, headers, request.body);
	let canonical_request = canonical.to_string();
	let signed_header_names = canonical.signed_header_names();
	let date_stamp = &timestamp[..8];
	let service = service.to_lowercase();
	let credential_scope = format!("{date_stamp}/{region}/{service}/{SCOPE_SUFFIX}");
	let string_to_sign = format!(
		"{ALGORITHM}\n{timestamp}\n{credential_scope}\n{}",
		hex_sha256(canonical_request.as_bytes())
	);
	let secret = credentials.secret_access_key.expose();
	let signature = match key_cache {
		Some(cache) => {
			let key = cache.get_or_derive(secret, date_stamp, region, &service);

			hex_hmac_sha256(&key, string_to_sign.as_bytes())
		},
		None => {
			let key = derive_signing_key(secret, date_stamp, region, &service);

			hex_hmac_sha256(&key, string_to_sign.as_bytes())
		},
	};
	let authorization = format!(
		"{ALGORITHM} Credential={}/{credential_scope},SignedHeaders={signed_header_names},Signature={signature}",
		credentials.access_key_id
	);

	Ok(SignedHeaders {
		authorization,
		security_token: credentials.session_token.clone(),
		timestamp,
		credential_scope,
		signed_header_names,
		canonical_request,
		string_to_sign,
		signature,
	})
}

fn sensitive_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::from_str(value)
		.map_err(|source| ConfigError::InvalidHeaderValue { name: name.to_owned(), source })?;

	value.set_sensitive(true);

	Ok(value)
}
