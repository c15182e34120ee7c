//! Credential sourcing and refresh.
//!
//! [`CredentialProvider`] owns the credentials used to sign calls. A static source hands out the
//! configured key pair forever; an instance metadata source fetches short-lived role credentials
//! and refreshes them once fewer than five minutes of validity remain. Concurrent resolves that
//! observe stale credentials coalesce behind one async guard, so a burst of calls performs a
//! single metadata fetch and every waiter receives that fetch's outcome, failures included.

pub mod imds;

mod metrics;

pub use imds::*;
pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{self, Credentials},
	error::CredentialError,
	http::RpcHttpClient,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Where credentials come from.
#[derive(Clone, Debug)]
pub enum CredentialSource {
	/// Fixed key pair supplied at configuration time.
	Static(Credentials),
	/// Role credentials fetched from the instance metadata service.
	InstanceMetadata(InstanceMetadata),
}
impl CredentialSource {
	/// Returns `true` for sources that never refresh.
	pub fn is_static(&self) -> bool {
		matches!(self, Self::Static(_))
	}
}

#[derive(Default)]
struct RefreshState {
	last: Option<Result<Arc<Credentials>, CredentialError>>,
}

/// Owns the current credentials and refreshes them on demand.
pub struct CredentialProvider<C>
where
	C: ?Sized + RpcHttpClient,
{
	source: CredentialSource,
	http_client: Arc<C>,
	current: RwLock<Option<Arc<Credentials>>>,
	refresh: AsyncMutex<RefreshState>,
	// Bumped under the refresh guard every time a fetch settles.
	generation: AtomicU64,
	metrics: Arc<RefreshMetrics>,
}
impl<C> CredentialProvider<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Creates a provider for `source`, using `http_client` for metadata lookups.
	pub fn new(source: CredentialSource, http_client: Arc<C>) -> Self {
		let current = match &source {
			CredentialSource::Static(credentials) => Some(Arc::new(credentials.clone())),
			CredentialSource::InstanceMetadata(_) => None,
		};

		Self {
			source,
			http_client,
			current: RwLock::new(current),
			refresh: AsyncMutex::new(RefreshState::default()),
			generation: AtomicU64::new(0),
			metrics: Default::default(),
		}
	}

	/// Source this provider resolves from.
	pub fn source(&self) -> &CredentialSource {
		&self.source
	}

	/// Refresh counters.
	pub fn metrics(&self) -> Arc<RefreshMetrics> {
		self.metrics.clone()
	}

	/// Currently cached credentials, without triggering a refresh.
	pub fn current(&self) -> Option<Arc<Credentials>> {
		self.current.read().clone()
	}

	/// Returns `true` when a resolve at `now` would have to refresh.
	pub fn needs_refresh_at(&self, now: OffsetDateTime) -> bool {
		auth::needs_refresh(self.current.read().as_deref(), now)
	}

	/// Drops cached dynamic credentials so the next resolve fetches new ones.
	///
	/// Static providers keep their credentials.
	pub fn invalidate(&self) {
		if !self.source.is_static() {
			*self.current.write() = None;
		}
	}

	/// Returns credentials valid for signing now, refreshing them if needed.
	pub async fn resolve(&self) -> Result<Arc<Credentials>> {
		self.resolve_at(OffsetDateTime::now_utc()).await
	}

	/// Same as [`resolve`](Self::resolve) with an explicit clock reading.
	pub async fn resolve_at(&self, now: OffsetDateTime) -> Result<Arc<Credentials>> {
		let metadata = match &self.source {
			CredentialSource::Static(credentials) => {
				credentials.ensure_complete()?;

				return Ok(self.current().unwrap_or_else(|| Arc::new(credentials.clone())));
			},
			CredentialSource::InstanceMetadata(metadata) => metadata,
		};
		let observed = self.generation.load(Ordering::Acquire);

		if let Some(current) = self.fresh_at(now) {
			return Ok(current);
		}

		const KIND: OpKind = OpKind::CredentialRefresh;

		let span = OpSpan::new(KIND, "resolve");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.record_attempt();

		let outcome = span.instrument(self.refresh_once(metadata, observed)).await;

		match &outcome {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_op_outcome(KIND, OpOutcome::Success);
			},
			Err(_) => {
				self.metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		outcome.map_err(Error::from)
	}

	fn fresh_at(&self, now: OffsetDateTime) -> Option<Arc<Credentials>> {
		let current = self.current.read();

		if auth::needs_refresh(current.as_deref(), now) { None } else { current.clone() }
	}

	async fn refresh_once(
		&self,
		metadata: &InstanceMetadata,
		observed: u64,
	) -> Result<Arc<Credentials>, CredentialError> {
		let mut state = self.refresh.lock().await;

		// A fetch settled while this caller waited; share its outcome.
		match &state.last {
			Some(outcome) if self.generation.load(Ordering::Acquire) != observed =>
				return outcome.clone(),
			_ => {},
		}

		self.metrics.record_fetch();

		let outcome = metadata.fetch(self.http_client.as_ref()).await.map(Arc::new);

		if let Ok(credentials) = &outcome {
			*self.current.write() = Some(credentials.clone());
		}

		state.last = Some(outcome.clone());
		self.generation.fetch_add(1, Ordering::Release);

		outcome
	}
}
impl<C> Debug for CredentialProvider<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialProvider")
			.field("source", &self.source)
			.field("current", &self.current.read())
			.field("generation", &self.generation.load(Ordering::Relaxed))
			.field("metrics", &self.metrics)
			.finish()
	}
}
