//! Request and response bodies of the JSON-RPC envelope.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{_prelude::*, error::ConfigError};

/// Body sent with a call.
///
/// Absent and empty bodies are sent as `{}`; JSON values are encoded; text is forwarded as-is.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
	/// No body; sent as `{}`.
	#[default]
	Empty,
	/// JSON document.
	Json(Value),
	/// Pre-encoded JSON text.
	Text(String),
}
impl RequestBody {
	/// Serializes `value` into a JSON body.
	pub fn json<T>(value: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		serde_json::to_value(value).map(Self::Json).map_err(ConfigError::BodySerialize)
	}

	/// Exact bytes put on the wire (and hashed into the signature).
	pub fn into_bytes(self) -> Vec<u8> {
		match self {
			Self::Empty | Self::Json(Value::Null) => b"{}".to_vec(),
			Self::Json(value) => value.to_string().into_bytes(),
			Self::Text(text) if text.is_empty() => b"{}".to_vec(),
			Self::Text(text) => text.into_bytes(),
		}
	}
}
impl From<()> for RequestBody {
	fn from(_: ()) -> Self {
		Self::Empty
	}
}
impl From<Value> for RequestBody {
	fn from(value: Value) -> Self {
		Self::Json(value)
	}
}
impl From<Option<Value>> for RequestBody {
	fn from(value: Option<Value>) -> Self {
		value.map(Self::Json).unwrap_or_default()
	}
}
impl From<String> for RequestBody {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl From<&str> for RequestBody {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

/// Successful call outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcResponse {
	/// HTTP status code (2xx).
	pub status: u16,
	/// Parsed payload; [`Value::Null`] when the service sent no body.
	pub body: Value,
	/// Raw response text.
	pub raw: String,
}
impl RpcResponse {
	/// Decodes the payload into `T`, reporting the path of the first mismatch.
	pub fn decode<T>(self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		serde_path_to_error::deserialize(self.body).map_err(|source| Error::Decode { source })
	}
}

/// Maps a completed exchange onto the call outcome.
///
/// A non-success status always wins over a parse failure; its error carries the parsed payload
/// when the body is JSON.
pub(crate) fn interpret(status: u16, raw: String) -> Result<RpcResponse> {
	if !(200..300).contains(&status) {
		return Err(match serde_json::from_str::<Value>(&raw) {
			Ok(payload) => Error::Service { status, payload, raw },
			Err(_) => Error::Status { status, raw },
		});
	}
	if raw.trim().is_empty() {
		return Ok(RpcResponse { status, body: Value::Null, raw });
	}

	match serde_json::from_str(&raw) {
		Ok(body) => Ok(RpcResponse { status, body, raw }),
		Err(source) => Err(Error::ResponseParse { source, raw }),
	}
}
