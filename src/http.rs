//! Transport primitives for signed RPC calls and metadata lookups.
//!
//! The module exposes [`RpcHttpClient`] as the client's only dependency on an HTTP stack,
//! alongside [`HttpExchange`] (status plus accumulated body text) and the once-only
//! [`CompletionGate`] that every implementation funnels terminal events through. Status codes are
//! reported as data here; the facade decides what a non-success status means.

mod gate;

pub use gate::*;

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Request type accepted by [`RpcHttpClient`] implementations.
pub type HttpRequest = http::Request<Vec<u8>>;

/// Boxed future returned by [`RpcHttpClient::send`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpExchange, TransportError>> + 'a + Send>>;

/// Outcome of one completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpExchange {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as UTF-8 (lossy).
	pub body: String,
}
impl HttpExchange {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports able to perform one request per call.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared between the credential
/// provider and the client facade behind an [`Arc`]. Each call opens its own request, accumulates
/// the streamed body, and resolves exactly once: either with the exchange or with the first
/// transport failure observed. Non-success statuses are not errors at this layer.
pub trait RpcHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and accumulates the response body.
	fn send(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The signed endpoint answers directly, so clients built through [`ReqwestHttpClient::new`]
/// never follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirects disabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RpcHttpClient for ReqwestHttpClient {
	fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let mut response = client.execute(request).await?;
			let mut accumulator = ResponseAccumulator::new(response.status().as_u16());

			loop {
				match response.chunk().await {
					Ok(Some(chunk)) => accumulator.data(&chunk),
					Ok(None) => {
						accumulator.end();

						break;
					},
					Err(e) => {
						accumulator.error(TransportError::from(e));

						break;
					},
				}
			}

			accumulator.finish()
		})
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;

	#[tokio::test]
	async fn reqwest_client_accumulates_body_and_reports_status() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/").body("{}");
				then.status(400).body("{\"__type\":\"ValidationException\"}");
			})
			.await;
		let client = ReqwestHttpClient::new().expect("Default reqwest client should build.");
		let request = http::Request::builder()
			.method("POST")
			.uri(format!("{}/", server.base_url()))
			.body(b"{}".to_vec())
			.expect("Request fixture should build.");
		let exchange = client.send(request).await.expect("Exchange should complete.");

		mock.assert_async().await;

		assert_eq!(exchange.status, 400);
		assert!(!exchange.is_success());
		assert_eq!(exchange.body, "{\"__type\":\"ValidationException\"}");
	}

	#[tokio::test]
	async fn unreachable_host_is_a_transport_error() {
		let client = ReqwestHttpClient::new().expect("Default reqwest client should build.");
		let request = http::Request::builder()
			.method("GET")
			.uri("http://127.0.0.1:9/")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let err = client.send(request).await.expect_err("Port 9 should refuse connections.");

		assert!(matches!(err, TransportError::Network { .. }));
	}
}
