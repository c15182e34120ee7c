//! Immutable credential values and the refresh decision.

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Credentials must be refreshed once fewer than this many minutes remain before expiry.
pub const REFRESH_WINDOW: Duration = Duration::minutes(5);

/// Access key pair used to sign requests, optionally scoped to a session.
///
/// Values are never mutated in place; a refresh replaces the whole value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// Access key identifier, sent in clear inside the `Authorization` header.
	pub access_key_id: String,
	/// Secret access key; only ever used as HMAC key material.
	pub secret_access_key: Secret,
	/// Session token issued alongside role credentials.
	pub session_token: Option<Secret>,
	/// Expiry instant; `None` for static credentials.
	pub expiration: Option<OffsetDateTime>,
}
impl Credentials {
	/// Creates static credentials from an access key pair.
	pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<Secret>) -> Self {
		Self {
			access_key_id: access_key_id.into(),
			secret_access_key: secret_access_key.into(),
			session_token: None,
			expiration: None,
		}
	}

	/// Attaches a session token.
	pub fn with_session_token(mut self, token: impl Into<Secret>) -> Self {
		self.session_token = Some(token.into());

		self
	}

	/// Attaches an expiry instant.
	pub fn with_expiration(mut self, expiration: OffsetDateTime) -> Self {
		self.expiration = Some(expiration);

		self
	}

	/// Returns `true` when both the access key id and the secret key are present.
	pub fn is_complete(&self) -> bool {
		!self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
	}

	/// Rejects credentials that cannot be used for signing.
	pub fn ensure_complete(&self) -> Result<(), ConfigError> {
		if self.access_key_id.is_empty() {
			return Err(ConfigError::MissingCredentials { missing: "access key id" });
		}
		if self.secret_access_key.is_empty() {
			return Err(ConfigError::MissingCredentials { missing: "secret access key" });
		}

		Ok(())
	}

	/// Returns `true` for credentials without an expiry signal.
	pub fn is_static(&self) -> bool {
		self.expiration.is_none()
	}

	/// Remaining lifetime at `now`, if the credentials expire at all.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Option<Duration> {
		self.expiration.map(|expiration| expiration - now)
	}
}

/// Decides whether `current` must be replaced before signing at `now`.
///
/// Absent or incomplete credentials always need a refresh. Static credentials never do. Expiring
/// credentials need one once less than [`REFRESH_WINDOW`] remains.
pub fn needs_refresh(current: Option<&Credentials>, now: OffsetDateTime) -> bool {
	let Some(credentials) = current else {
		return true;
	};

	if !credentials.is_complete() {
		return true;
	}

	match credentials.remaining_at(now) {
		Some(remaining) => remaining < REFRESH_WINDOW,
		None => false,
	}
}
