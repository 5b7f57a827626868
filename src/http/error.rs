//! Transport-level errors
//!
//! Business failures never surface here; they are ordinary `200` bodies.
//! An [`HttpError`] means the request could not be read or the response
//! could not be written.

use hyper::StatusCode;
use thiserror::Error;

use super::response::Response;

/// Result type for HTTP handlers
pub type Result<T> = std::result::Result<T, HttpError>;

#[derive(Debug, Error)]
pub enum HttpError {
	/// The body was neither valid JSON nor a URL-encoded form of the expected shape
	#[error("invalid request body: {0}")]
	InvalidBody(String),

	/// The query string did not decode to UTF-8
	#[error("invalid query: {0}")]
	InvalidQuery(String),

	/// A response value could not be encoded
	#[error("serialization error: {0}")]
	Serialization(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl HttpError {
	pub fn status(&self) -> StatusCode {
		match self {
			HttpError::InvalidBody(_) | HttpError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
			HttpError::Serialization(_) | HttpError::Internal(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	/// Message sent to the client; the detail stays in the logs
	pub fn public_message(&self) -> &'static str {
		match self {
			HttpError::InvalidBody(_) => "invalid request body",
			HttpError::InvalidQuery(_) => "invalid query",
			HttpError::Serialization(_) | HttpError::Internal(_) => "internal server error",
		}
	}
}

impl From<serde_json::Error> for HttpError {
	fn from(err: serde_json::Error) -> Self {
		HttpError::Serialization(err.to_string())
	}
}

impl From<HttpError> for Response {
	fn from(err: HttpError) -> Self {
		Response::error(err.status(), err.public_message())
	}
}
