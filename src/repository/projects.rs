//! Project repository

use bson::doc;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::debug;

use super::error::{RepositoryError, RepositoryResult};
use crate::models::Project;
use crate::nosql::{Document, DocumentBackend, FindOneAndUpdateOptions, NoSQLError};

/// Access to the `projects` collection
#[derive(Clone)]
pub struct ProjectRepository {
	backend: Arc<dyn DocumentBackend>,
}

impl ProjectRepository {
	/// Create a repository over a shared backend handle
	pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
		Self { backend }
	}

	/// Create the collection's indexes (unique project name)
	pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
		for index in Project::indexes() {
			self.backend
				.create_index(Project::COLLECTION_NAME, index)
				.await?;
		}
		Ok(())
	}

	/// Look a project up by exact name
	pub async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Project>> {
		let found = self
			.backend
			.find_one(Project::COLLECTION_NAME, doc! { "name": name })
			.await?;
		Ok(found.map(Project::from_bson).transpose()?)
	}

	/// Return the project called `name`, creating it if it does not exist
	///
	/// The lookup and the insert are one atomic upsert. If a concurrent
	/// upsert wins the race, the unique index rejects ours and the winner's
	/// project is returned.
	pub async fn get_or_create_by_name(&self, name: &str) -> RepositoryResult<Project> {
		let result = self
			.backend
			.find_one_and_update(
				Project::COLLECTION_NAME,
				doc! { "name": name },
				doc! { "$setOnInsert": { "issues": [] } },
				FindOneAndUpdateOptions::upsert(),
			)
			.await;

		let document = match result {
			Ok(document) => document,
			Err(NoSQLError::DuplicateKey(detail)) => {
				debug!(project = name, %detail, "lost project upsert race, re-reading");
				return self
					.find_by_name(name)
					.await?
					.ok_or_else(|| RepositoryError::NotFound(format!("project {}", name)));
			}
			Err(err) => return Err(err.into()),
		};

		let project = document
			.map(Project::from_bson)
			.transpose()?
			.ok_or_else(|| RepositoryError::NotFound(format!("project {}", name)))?;
		debug!(project = name, issues = project.issues.len(), "resolved project");
		Ok(project)
	}

	/// Append an issue reference to a project's list
	pub async fn push_issue(&self, project_id: ObjectId, issue_id: ObjectId) -> RepositoryResult<()> {
		let result = self
			.backend
			.update_one(
				Project::COLLECTION_NAME,
				doc! { "_id": project_id },
				doc! { "$push": { "issues": issue_id } },
			)
			.await?;
		if result.matched_count == 0 {
			return Err(RepositoryError::NotFound(format!("project {}", project_id)));
		}
		Ok(())
	}

	/// Remove an issue reference from a project's list
	///
	/// Returns whether the project was found.
	pub async fn pull_issue(&self, project_id: ObjectId, issue_id: ObjectId) -> RepositoryResult<bool> {
		let result = self
			.backend
			.update_one(
				Project::COLLECTION_NAME,
				doc! { "_id": project_id },
				doc! { "$pull": { "issues": issue_id } },
			)
			.await?;
		Ok(result.matched_count > 0)
	}
}
