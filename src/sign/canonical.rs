//! Canonical request construction.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{_prelude::*, sign::key};

/// Characters left untouched when encoding the request path (the `encodeURI` reserved set).
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b';')
	.remove(b',')
	.remove(b'/')
	.remove(b'?')
	.remove(b':')
	.remove(b'@')
	.remove(b'&')
	.remove(b'=')
	.remove(b'+')
	.remove(b'$')
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')')
	.remove(b'#');

/// Percent-encodes a request path.
pub fn encode_path(path: &str) -> String {
	utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}

/// Normalized request representation hashed into the string to sign.
///
/// Header names are lower-cased and kept sorted; values are trimmed. Names that collide after
/// lower-casing are merged with `,` in input order. The query string is always empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalRequest {
	/// Upper-case HTTP method.
	pub method: String,
	/// Encoded request path.
	pub path: String,
	/// Lower-cased header names mapped to trimmed values.
	pub headers: BTreeMap<String, String>,
	/// Hex SHA-256 of the request body.
	pub payload_hash: String,
}
impl CanonicalRequest {
	/// Builds the canonical form of a request.
	pub fn new<I, K, V>(method: &str, path: &str, headers: I, body: &[u8]) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut canonical = BTreeMap::<String, String>::new();

		for (name, value) in headers {
			let value = value.as_ref().trim();

			canonical
				.entry(name.as_ref().to_ascii_lowercase())
				.and_modify(|existing| {
					existing.push(',');
					existing.push_str(value);
				})
				.or_insert_with(|| value.to_owned());
		}

		Self {
			method: method.to_ascii_uppercase(),
			path: encode_path(path),
			headers: canonical,
			payload_hash: key::hex_sha256(body),
		}
	}

	/// Sorted, lower-cased header names joined with `;`.
	pub fn signed_header_names(&self) -> String {
		self.headers.keys().map(String::as_str).collect::<Vec<_>>().join(";")
	}

	/// `name:value\n` lines in sorted order.
	pub fn canonical_headers(&self) -> String {
		let mut block = String::with_capacity(self.headers.len() * 48);

		for (name, value) in &self.headers {
			block.push_str(name);
			block.push(':');
			block.push_str(value);
			block.push('\n');
		}

		block
	}

	/// Lower-case hex SHA-256 of the canonical string.
	pub fn hash(&self) -> String {
		key::hex_sha256(self.to_string().as_bytes())
	}
}
impl Display for CanonicalRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"{}\n{}\n\n{}\n{}\n{}",
			self.method,
			self.path,
			self.canonical_headers(),
			self.signed_header_names(),
			self.payload_hash
		)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn canonical_string_layout() {
		let request = CanonicalRequest::new(
			"post",
			"/",
			[
				("x-amz-target", "DynamoDB_20111205.ListTables"),
				("Host", "dynamodb.us-east-1.amazonaws.com"),
				("X-Amz-Date", " 20120215T000000Z "),
			],
			b"{}",
		);

		assert_eq!(
			request.to_string(),
			"POST\n/\n\nhost:dynamodb.us-east-1.amazonaws.com\nx-amz-date:20120215T000000Z\nx-amz-target:DynamoDB_20111205.ListTables\n\nhost;x-amz-date;x-amz-target\n44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
		);
	}

	#[test]
	fn header_case_and_order_do_not_matter() {
		let a = CanonicalRequest::new(
			"POST",
			"/",
			[("Content-Type", "application/x-amz-json-1.0"), ("x-amz-date", "20120215T000000Z")],
			b"{}",
		);
		let b = CanonicalRequest::new(
			"POST",
			"/",
			[("X-AMZ-DATE", "20120215T000000Z"), ("content-type", "application/x-amz-json-1.0")],
			b"{}",
		);

		assert_eq!(a, b);
		assert_eq!(a.hash(), b.hash());
	}

	#[test]
	fn colliding_names_are_merged() {
		let request =
			CanonicalRequest::new("GET", "/", [("X-Custom", "a"), ("x-custom", " b ")], b"");

		assert_eq!(request.canonical_headers(), "x-custom:a,b\n");
	}

	#[test]
	fn path_encoding_keeps_reserved_characters() {
		assert_eq!(encode_path("/"), "/");
		assert_eq!(encode_path("/a b/c;d,e"), "/a%20b/c;d,e");
		assert_eq!(encode_path("/%7e/ü"), "/%257e/%C3%BC");
	}
}
