//! Client facade: resolve credentials, sign, dispatch, interpret.
//!
//! [`Client::call`] runs one operation end to end. Credentials are resolved strictly before the
//! envelope is signed; the signed request goes through the configured [`RpcHttpClient`]; the
//! exchange is mapped onto [`RpcResponse`] or an [`Error`]. Each call yields exactly one outcome
//! and nothing is retried.

pub mod body;

pub use body::*;

// crates.io
use http::{
	HeaderName, HeaderValue, Method,
	header::{CONTENT_TYPE, HOST},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::ClientConfig,
	error::ConfigError,
	http::{HttpRequest, RpcHttpClient},
	obs::{self, OpKind, OpOutcome, OpSpan},
	provider::{CredentialProvider, RefreshMetrics},
	sign::{self, RequestSigner, SigningKeyCache, SigningRequest},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Header naming the operation.
pub const TARGET_HEADER: &str = "x-amz-target";

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestRpcClient = Client<ReqwestHttpClient>;

/// Issues signed JSON-RPC calls against one service endpoint.
pub struct Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	config: Arc<ClientConfig>,
	http_client: Arc<C>,
	credentials: Arc<CredentialProvider<C>>,
	signer: RequestSigner,
}
impl<C> Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	/// Creates a client that sends calls and metadata lookups through `http_client`.
	pub fn with_http_client(config: ClientConfig, http_client: impl Into<Arc<C>>) -> Self {
		let http_client = http_client.into();
		let credentials =
			Arc::new(CredentialProvider::new(config.credential_source(), http_client.clone()));
		let mut signer = RequestSigner::new(config.region.clone(), config.service.signing_name());

		if config.cache_signing_keys {
			signer = signer.with_key_cache(Arc::new(SigningKeyCache::default()));
		}

		Self { config: Arc::new(config), http_client, credentials, signer }
	}

	/// Configuration this client was built from.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Credential provider backing this client.
	pub fn credentials(&self) -> &CredentialProvider<C> {
		&self.credentials
	}

	/// Credential refresh counters.
	pub fn refresh_metrics(&self) -> Arc<RefreshMetrics> {
		self.credentials.metrics()
	}

	/// Invokes `operation` with `body` and returns the parsed response.
	pub async fn call(&self, operation: &str, body: impl Into<RequestBody>) -> Result<RpcResponse> {
		const KIND: OpKind = OpKind::Call;

		let span = OpSpan::new(KIND, "call");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(operation, body.into())).await;

		obs::record_op_outcome(
			KIND,
			if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure },
		);

		result
	}

	/// Invokes `operation` and decodes the success payload into `T`.
	pub async fn call_as<T>(&self, operation: &str, body: impl Into<RequestBody>) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.call(operation, body).await?.decode()
	}

	async fn dispatch(&self, operation: &str, body: RequestBody) -> Result<RpcResponse> {
		let body = body.into_bytes();
		let credentials = self.credentials.resolve().await?;
		let request =
			self.signed_request(operation, &credentials, body, OffsetDateTime::now_utc())?;
		let exchange = self.http_client.send(request).await?;

		body::interpret(exchange.status, exchange.body)
	}

	/// Builds the signed envelope for `operation` at `timestamp`.
	pub fn signed_request(
		&self,
		operation: &str,
		credentials: &Credentials,
		body: Vec<u8>,
		timestamp: OffsetDateTime,
	) -> Result<HttpRequest, ConfigError> {
		let host = self.config.host();
		let headers = vec![
			(CONTENT_TYPE.as_str().to_owned(), self.config.service.content_type.clone()),
			(sign::DATE_HEADER.to_owned(), sign::format_basic_iso8601(timestamp)),
			(TARGET_HEADER.to_owned(), self.config.service.target(operation)),
		];
		let signed = self.signer.sign(
			credentials,
			&SigningRequest {
				method: Method::POST.as_str(),
				host: &host,
				path: self.config.request_path(),
				headers: &headers,
				body: &body,
			},
			timestamp,
		)?;
		let mut request = http::Request::builder()
			.method(Method::POST)
			.uri(self.config.request_url())
			.body(body)?;
		let map = request.headers_mut();

		map.insert(HOST, header_value(HOST.as_str(), &host)?);

		for (name, value) in &headers {
			let header = HeaderName::try_from(name.as_str()).map_err(http::Error::from)?;

			map.insert(header, header_value(name, value)?);
		}

		signed.apply(map)?;

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client backed by a fresh reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Ok(Self::with_http_client(config, ReqwestHttpClient::new()?))
	}
}
impl<C> Clone for Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			http_client: self.http_client.clone(),
			credentials: self.credentials.clone(),
			signer: self.signer.clone(),
		}
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + RpcHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("region", &self.config.region)
			.field("host", &self.config.host())
			.field("service", &self.config.service.name)
			.field("credentials", &self.credentials)
			.finish()
	}
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
	HeaderValue::from_str(value)
		.map_err(|source| ConfigError::InvalidHeaderValue { name: name.to_owned(), source })
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use http::header::AUTHORIZATION;
	use serde_json::json;
	use time::macros;
	// self
	use super::*;
	use crate::{
		error::TransportError,
		http::{HttpExchange, HttpFuture},
	};

	#[derive(Default)]
	struct Recorder {
		requests: Mutex<Vec<HttpRequest>>,
		calls: AtomicUsize,
	}
	impl RpcHttpClient for Recorder {
		fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
			Box::pin(async move {
				let call = self.calls.fetch_add(1, Ordering::SeqCst);

				self.requests.lock().push(request);

				match call {
					0 => Ok(HttpExchange { status: 200, body: "{\"TableNames\":[]}".into() }),
					_ => Err(TransportError::Closed { received: 3 }),
				}
			})
		}
	}

	fn static_config() -> ClientConfig {
		ClientConfig::builder()
			.access_key_id("AKIDEXAMPLE")
			.secret_access_key("wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY")
			.build()
			.expect("Static config should build.")
	}

	#[test]
	fn signed_request_matches_reference_signature() {
		let client = Client::<Recorder>::with_http_client(static_config(), Recorder::default());
		let credentials =
			Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY");
		let request = client
			.signed_request(
				"ListTables",
				&credentials,
				b"{}".to_vec(),
				macros::datetime!(2012-02-15 00:00 UTC),
			)
			.expect("Envelope should build.");
		let headers = request.headers();

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri(), "https://dynamodb.us-east-1.amazonaws.com/");
		assert_eq!(headers[HOST], "dynamodb.us-east-1.amazonaws.com");
		assert_eq!(headers[CONTENT_TYPE], "application/x-amz-json-1.0");
		assert_eq!(headers[sign::DATE_HEADER], "20120215T000000Z");
		assert_eq!(headers[TARGET_HEADER], "DynamoDB_20111205.ListTables");
		assert_eq!(
			headers[AUTHORIZATION],
			"AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20120215/us-east-1/dynamodb/aws4_request,SignedHeaders=content-type;host;x-amz-date;x-amz-target,Signature=29bd84d05c51a21a40d03ff6a73927c811d93459e9b79f77a99f095a87c07840"
		);
		assert!(headers.get(sign::SECURITY_TOKEN_HEADER).is_none());
	}

	#[tokio::test]
	async fn call_delivers_response_then_transport_error() {
		let recorder = Arc::new(Recorder::default());
		let client = Client::<Recorder>::with_http_client(static_config(), recorder.clone());
		let response = client.call("ListTables", ()).await.expect("First call should succeed.");

		assert_eq!(response.body, json!({"TableNames": []}));

		let err = client
			.call("ListTables", json!({"Limit": 1}))
			.await
			.expect_err("Second call should surface the transport failure.");

		assert!(matches!(err, Error::Transport(TransportError::Closed { received: 3 })));

		let requests = recorder.requests.lock();

		assert_eq!(requests.len(), 2);
		assert_eq!(requests[0].body(), b"{}");
		assert_eq!(requests[1].body(), b"{\"Limit\":1}");
	}

	#[tokio::test]
	async fn metadata_failure_stops_the_call() {
		let config = ClientConfig::builder()
			.metadata_endpoint("http://127.0.0.1:1338")
			.build()
			.expect("Metadata config should build.");
		let recorder = Arc::new(Recorder::default());
		let client = Client::<Recorder>::with_http_client(config, recorder.clone());

		// The role lookup answer is not a usable role name, so no signed call goes out.
		let err = client.call("ListTables", ()).await.expect_err("Bogus metadata should fail.");

		assert!(matches!(err, Error::Credential(_)));
		assert!(recorder.requests.lock().iter().all(|request| request.method() == Method::GET));
	}
}
