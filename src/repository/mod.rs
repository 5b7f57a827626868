//! Entity repositories
//!
//! Repositories own the translation between typed models and BSON, and
//! between backend errors and [`RepositoryError`]. Nothing driver-specific
//! crosses this boundary.

pub mod error;
pub mod issues;
pub mod projects;

pub use error::{RepositoryError, RepositoryResult};
pub use issues::IssueRepository;
pub use projects::ProjectRepository;

use bson::oid::ObjectId;

/// Parse a client-supplied hex id
pub fn parse_object_id(id: &str) -> RepositoryResult<ObjectId> {
	ObjectId::parse_str(id)
		.map_err(|_| RepositoryError::ValidationFailed(format!("malformed id {:?}", id)))
}
