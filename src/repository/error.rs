//! Repository boundary errors

use thiserror::Error;

use crate::nosql::NoSQLError;

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// What went wrong at the repository boundary.
///
/// The `Display` form is safe to show to clients; the wrapped detail is for
/// logs only.
#[derive(Debug, Error)]
pub enum RepositoryError {
	/// The addressed record does not exist.
	#[error("{0} not found")]
	NotFound(String),

	/// The request could not be expressed as a valid store operation.
	#[error("validation failed")]
	ValidationFailed(String),

	/// The store failed or could not be reached.
	#[error("store unavailable")]
	StoreUnavailable(String),
}

impl RepositoryError {
	/// Underlying detail, for logging.
	pub fn detail(&self) -> &str {
		match self {
			RepositoryError::NotFound(detail)
			| RepositoryError::ValidationFailed(detail)
			| RepositoryError::StoreUnavailable(detail) => detail,
		}
	}
}

impl From<NoSQLError> for RepositoryError {
	fn from(err: NoSQLError) -> Self {
		match err {
			NoSQLError::NotFound(what) => RepositoryError::NotFound(what),
			other if other.is_client_error() => RepositoryError::ValidationFailed(other.to_string()),
			other => RepositoryError::StoreUnavailable(other.to_string()),
		}
	}
}
