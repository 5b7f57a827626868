//! Document store error types
//!
//! This module provides a unified error type for every document backend.

use thiserror::Error;

/// Result type for document store operations
pub type Result<T> = std::result::Result<T, NoSQLError>;

/// Unified error type for document store operations
#[derive(Debug, Error)]
pub enum NoSQLError {
	/// Connection error
	#[error("Connection error: {0}")]
	ConnectionError(String),

	/// Query/operation execution error
	#[error("Execution error: {0}")]
	ExecutionError(String),

	/// Document/data not found
	#[error("Not found: {0}")]
	NotFound(String),

	/// Serialization/deserialization error
	#[error("Serialization error: {0}")]
	SerializationError(String),

	/// Invalid operation or argument for the current backend
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),

	/// A unique index rejected the write
	#[error("Duplicate key: {0}")]
	DuplicateKey(String),

	/// Configuration error
	#[error("Configuration error: {0}")]
	ConfigError(String),
}

impl From<serde_json::Error> for NoSQLError {
	fn from(err: serde_json::Error) -> Self {
		NoSQLError::SerializationError(err.to_string())
	}
}

impl From<bson::ser::Error> for NoSQLError {
	fn from(err: bson::ser::Error) -> Self {
		NoSQLError::SerializationError(err.to_string())
	}
}

impl From<bson::de::Error> for NoSQLError {
	fn from(err: bson::de::Error) -> Self {
		NoSQLError::SerializationError(err.to_string())
	}
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for NoSQLError {
	fn from(err: mongodb::error::Error) -> Self {
		use mongodb::error::{ErrorKind, WriteFailure};

		match *err.kind {
			ErrorKind::InvalidArgument { .. } => NoSQLError::InvalidOperation(err.to_string()),
			ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } => {
				NoSQLError::ConnectionError(err.to_string())
			}
			ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
				NoSQLError::SerializationError(err.to_string())
			}
			ErrorKind::Write(WriteFailure::WriteError(ref write_error))
				if write_error.code == 11000 =>
			{
				NoSQLError::DuplicateKey(err.to_string())
			}
			ErrorKind::Command(ref command_error) if command_error.code == 11000 => {
				NoSQLError::DuplicateKey(err.to_string())
			}
			_ => NoSQLError::ExecutionError(err.to_string()),
		}
	}
}

impl NoSQLError {
	/// Whether the error came from the caller's input rather than the store itself.
	pub fn is_client_error(&self) -> bool {
		matches!(
			self,
			NoSQLError::NotFound(_)
				| NoSQLError::SerializationError(_)
				| NoSQLError::InvalidOperation(_)
				| NoSQLError::DuplicateKey(_)
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(NoSQLError::NotFound("x".into()), true)]
	#[case(NoSQLError::InvalidOperation("x".into()), true)]
	#[case(NoSQLError::DuplicateKey("x".into()), true)]
	#[case(NoSQLError::ConnectionError("x".into()), false)]
	#[case(NoSQLError::ExecutionError("x".into()), false)]
	fn test_client_error_classification(#[case] err: NoSQLError, #[case] expected: bool) {
		assert_eq!(err.is_client_error(), expected);
	}

	#[test]
	fn test_display_prefixes() {
		let err = NoSQLError::DuplicateKey("projects.name".to_string());
		assert_eq!(err.to_string(), "Duplicate key: projects.name");
	}
}
