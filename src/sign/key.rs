//! Hash helpers and the derived signing key chain.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Prefix prepended to the secret key before the first HMAC round.
pub const KEY_PREFIX: &str = "AWS4";
/// Literal request-type suffix closing every credential scope.
pub const SCOPE_SUFFIX: &str = "aws4_request";

type HmacSha256 = Hmac<Sha256>;

/// Lower-case hex SHA-256 digest.
pub fn hex_sha256(content: &[u8]) -> String {
	hex::encode(Sha256::digest(content))
}

/// Binary HMAC-SHA256.
pub fn hmac_sha256(key: &[u8], content: &[u8]) -> Vec<u8> {
	let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length.");

	mac.update(content);

	mac.finalize().into_bytes().to_vec()
}

/// Lower-case hex HMAC-SHA256.
pub fn hex_hmac_sha256(key: &[u8], content: &[u8]) -> String {
	hex::encode(hmac_sha256(key, content))
}

/// Derives the per-day signing key: `AWS4<secret>` → date → region → service → `aws4_request`.
pub fn derive_signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
	let secret = format!("{KEY_PREFIX}{secret}");
	let sign_date = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes());
	let sign_region = hmac_sha256(&sign_date, region.as_bytes());
	let sign_service = hmac_sha256(&sign_region, service.to_lowercase().as_bytes());

	hmac_sha256(&sign_service, SCOPE_SUFFIX.as_bytes())
}

#[derive(Clone)]
struct CachedKey {
	date_stamp: String,
	region: String,
	service: String,
	secret_fingerprint: [u8; 32],
	key: Arc<[u8]>,
}

/// Memoizes the most recent derived signing key.
///
/// Entries are keyed by date stamp, region, service, and a SHA-256 fingerprint of the secret, so a
/// rotated secret never reuses a stale key.
#[derive(Default)]
pub struct SigningKeyCache {
	slot: Mutex<Option<CachedKey>>,
	derivations: AtomicU64,
}
impl SigningKeyCache {
	/// Returns the cached key or derives and stores a new one.
	pub fn get_or_derive(
		&self,
		secret: &str,
		date_stamp: &str,
		region: &str,
		service: &str,
	) -> Arc<[u8]> {
		let fingerprint: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
		let mut slot = self.slot.lock();

		if let Some(cached) = slot.as_ref().filter(|cached| {
			cached.date_stamp == date_stamp
				&& cached.region == region
				&& cached.service == service
				&& cached.secret_fingerprint == fingerprint
		}) {
			return cached.key.clone();
		}

		let key: Arc<[u8]> = derive_signing_key(secret, date_stamp, region, service).into();

		self.derivations.fetch_add(1, Ordering::Relaxed);
		*slot = Some(CachedKey {
			date_stamp: date_stamp.to_owned(),
			region: region.to_owned(),
			service: service.to_owned(),
			secret_fingerprint: fingerprint,
			key: key.clone(),
		});

		key
	}

	/// Number of key derivations performed (cache misses).
	pub fn derivations(&self) -> u64 {
		self.derivations.load(Ordering::Relaxed)
	}
}
impl Debug for SigningKeyCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningKeyCache").field("derivations", &self.derivations()).finish()
	}
}
