use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use tracing::error;

use super::error::{HttpError, Result};

/// HTTP response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create an empty response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn not_found() -> Self {
		Self::error(StatusCode::NOT_FOUND, "not found")
	}

	pub fn method_not_allowed() -> Self {
		Self::error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
	}

	pub fn internal_server_error() -> Self {
		Self::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
	}

	/// A `{ "error": message }` JSON response
	pub fn error(status: StatusCode, message: &str) -> Self {
		let body = format!("{{\"error\":{}}}", serde_json::Value::from(message));
		Self::new(status)
			.with_body(body)
			.with_typed_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
	}

	/// A `200 OK` JSON response, degrading to `500` if `data` cannot be encoded
	pub fn json<T: Serialize>(data: &T) -> Self {
		Self::ok().with_json(data).unwrap_or_else(|err| {
			error!(%err, "failed to encode response body");
			Self::internal_server_error()
		})
	}

	pub fn with_status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a header, ignoring names or values that are not valid HTTP
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);
		self
	}

	/// Set the body to `data` as JSON with the matching content type
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({ "status": "ok" })).unwrap();
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "application/json"
	/// );
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| HttpError::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}
}
