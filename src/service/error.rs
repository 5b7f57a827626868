//! Issue service errors and their wire form

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::RepositoryError;

/// Every way an issue request can fail.
///
/// The `Display` text is the `error` string clients receive.
#[derive(Debug, Error)]
pub enum IssueError {
	#[error("required field(s) missing")]
	RequiredFieldsMissing,

	#[error("missing _id")]
	MissingId,

	#[error("no update field(s) sent")]
	NoUpdateFields { id: String },

	#[error("could not update")]
	CouldNotUpdate { id: String },

	#[error("could not delete")]
	CouldNotDelete { id: String },

	#[error("project not found")]
	ProjectNotFound { project: String },

	#[error(transparent)]
	Repository(#[from] RepositoryError),
}

impl IssueError {
	/// The `{ error, _id? }` body returned to the client
	pub fn body(&self) -> ErrorBody {
		let mut body = ErrorBody::new(self.to_string());
		match self {
			IssueError::NoUpdateFields { id }
			| IssueError::CouldNotUpdate { id }
			| IssueError::CouldNotDelete { id } => body.id = Some(id.clone()),
			IssueError::ProjectNotFound { project } => body.project = Some(project.clone()),
			IssueError::RequiredFieldsMissing
			| IssueError::MissingId
			| IssueError::Repository(_) => {}
		}
		body
	}
}

/// JSON error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	pub error: String,

	#[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub project: Option<String>,
}

impl ErrorBody {
	/// A body carrying only the message
	pub fn new(error: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			id: None,
			project: None,
		}
	}
}
