//! Incoming request and body decoding

use bytes::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{HeaderMap, Method, Uri, Version};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::collections::HashMap;
use std::net::SocketAddr;

use super::error::{HttpError, Result};

/// HTTP request representation
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub path_params: HashMap<String, String>,
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			path_params: HashMap::new(),
			remote_addr: None,
		}
	}

	/// Start building a request; used mostly by tests
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// URL-decoded query pairs in the order they appear
	///
	/// `+` decodes to a space. A key or value that does not decode to UTF-8
	/// is an [`HttpError::InvalidQuery`].
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/api/issues/demo?issue_title=Chai+Test&open=true")
	///     .build();
	///
	/// assert_eq!(
	///     request.query_pairs().unwrap(),
	///     vec![
	///         ("issue_title".to_string(), "Chai Test".to_string()),
	///         ("open".to_string(), "true".to_string()),
	///     ]
	/// );
	/// ```
	pub fn query_pairs(&self) -> Result<Vec<(String, String)>> {
		let Some(query) = self.uri.query() else {
			return Ok(Vec::new());
		};

		query
			.split('&')
			.filter(|pair| !pair.is_empty())
			.map(|pair| {
				let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
				Ok((decode_query_component(key)?, decode_query_component(value)?))
			})
			.collect()
	}

	/// Set a path parameter (used by the router for `{name}` segments)
	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	pub fn path_param(&self, key: &str) -> Option<&str> {
		self.path_params.get(key).map(String::as_str)
	}

	/// Whether the client declared a JSON body
	fn is_json(&self) -> bool {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(|value| value.trim_start().to_ascii_lowercase().starts_with("application/json"))
			.unwrap_or(false)
	}

	/// Decode the body as JSON or as a URL-encoded form
	///
	/// JSON is used when the content type says so, or when no content type
	/// is given and the body looks like an object. An empty body decodes as
	/// an empty form.
	pub fn form<T: DeserializeOwned>(&self) -> Result<T> {
		let trimmed = self.body.trim_ascii();
		if trimmed.is_empty() {
			return serde_json::from_value(serde_json::Value::Object(Default::default()))
				.map_err(|e| HttpError::InvalidBody(e.to_string()));
		}

		let looks_like_json = !self.headers.contains_key(CONTENT_TYPE) && trimmed.starts_with(b"{");
		if self.is_json() || looks_like_json {
			return serde_json::from_slice(trimmed).map_err(|e| HttpError::InvalidBody(e.to_string()));
		}

		let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&self.body)
			.map_err(|e| HttpError::InvalidBody(e.to_string()))?;
		let fields = pairs
			.into_iter()
			.map(|(key, value)| (key, serde_json::Value::String(value)))
			.collect();
		serde_json::from_value(serde_json::Value::Object(fields))
			.map_err(|e| HttpError::InvalidBody(e.to_string()))
	}
}

/// Percent-decode one query key or value, with `+` as a space
fn decode_query_component(raw: &str) -> Result<String> {
	let spaced = raw.replace('+', " ");
	percent_decode_str(&spaced)
		.decode_utf8()
		.map(Cow::into_owned)
		.map_err(|e| HttpError::InvalidQuery(format!("{}: {}", raw, e)))
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	/// Set the URI; an unparseable URI leaves the previous one in place
	pub fn uri(mut self, uri: &str) -> Self {
		if let Ok(uri) = uri.parse() {
			self.uri = uri;
		}
		self
	}

	pub fn header(mut self, name: hyper::header::HeaderName, value: &str) -> Self {
		if let Ok(value) = value.parse() {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn build(self) -> Request {
		Request::new(
			self.method,
			self.uri,
			Version::HTTP_11,
			self.headers,
			self.body,
		)
	}
}
