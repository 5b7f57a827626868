//! Issue repository

use bson::oid::ObjectId;
use bson::{Document as BsonDocument, doc};
use std::collections::HashMap;
use std::sync::Arc;

use super::error::{RepositoryError, RepositoryResult};
use crate::models::Issue;
use crate::nosql::{Document, DocumentBackend};

/// Access to the `issues` collection
#[derive(Clone)]
pub struct IssueRepository {
	backend: Arc<dyn DocumentBackend>,
}

impl IssueRepository {
	/// Create a repository over a shared backend handle
	pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
		Self { backend }
	}

	/// Persist a new issue and return it with its assigned id
	pub async fn insert(&self, mut issue: Issue) -> RepositoryResult<Issue> {
		let id = self
			.backend
			.insert_one(Issue::COLLECTION_NAME, issue.to_bson()?)
			.await?;
		let id = ObjectId::parse_str(&id).map_err(|_| {
			RepositoryError::StoreUnavailable(format!("store returned a non-ObjectId key {}", id))
		})?;
		issue.set_id(id);
		Ok(issue)
	}

	/// Look a single issue up by id
	pub async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Issue>> {
		let found = self
			.backend
			.find_one(Issue::COLLECTION_NAME, doc! { "_id": id })
			.await?;
		Ok(found.map(Issue::from_bson).transpose()?)
	}

	/// Load the issues behind a project's reference list
	///
	/// The result follows the order of `ids`. References whose issue no
	/// longer exists are skipped.
	pub async fn find_many_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Issue>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let documents = self
			.backend
			.find_many(Issue::COLLECTION_NAME, doc! { "_id": { "$in": ids.to_vec() } })
			.await?;

		let mut by_id = HashMap::with_capacity(documents.len());
		for document in documents {
			let issue = Issue::from_bson(document)?;
			if let Some(id) = issue.id {
				by_id.insert(id, issue);
			}
		}

		Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
	}

	/// Apply a `$set` to one issue
	///
	/// Returns whether the issue exists.
	pub async fn apply_update(&self, id: ObjectId, set: BsonDocument) -> RepositoryResult<bool> {
		let result = self
			.backend
			.update_one(Issue::COLLECTION_NAME, doc! { "_id": id }, doc! { "$set": set })
			.await?;
		Ok(result.matched_count > 0)
	}

	/// Delete one issue
	///
	/// Returns whether an issue was removed.
	pub async fn delete(&self, id: ObjectId) -> RepositoryResult<bool> {
		let deleted = self
			.backend
			.delete_one(Issue::COLLECTION_NAME, doc! { "_id": id })
			.await?;
		Ok(deleted > 0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::nosql::backends::InMemoryBackend;
	use chrono::Utc;
	use rstest::*;

	#[fixture]
	fn repository() -> IssueRepository {
		IssueRepository::new(Arc::new(InMemoryBackend::new()))
	}

	fn issue(title: &str) -> Issue {
		Issue::new(title, "text", "User A", Utc::now())
	}

	#[rstest]
	#[tokio::test]
	async fn test_insert_assigns_id(repository: IssueRepository) {
		let saved = repository.insert(issue("first")).await.unwrap();
		let id = saved.id.unwrap();

		let found = repository.find_by_id(id).await.unwrap().unwrap();
		assert_eq!(found, saved);
	}

	#[rstest]
	#[tokio::test]
	async fn test_find_many_follows_reference_order(repository: IssueRepository) {
		let a = repository.insert(issue("a")).await.unwrap().id.unwrap();
		let b = repository.insert(issue("b")).await.unwrap().id.unwrap();
		let dangling = ObjectId::new();

		let found = repository.find_many_by_ids(&[b, dangling, a]).await.unwrap();
		let titles: Vec<_> = found.iter().map(|i| i.issue_title.as_str()).collect();
		assert_eq!(titles, vec!["b", "a"]);

		assert!(repository.find_many_by_ids(&[]).await.unwrap().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_apply_update(repository: IssueRepository) {
		let id = repository.insert(issue("a")).await.unwrap().id.unwrap();

		assert!(
			repository
				.apply_update(id, doc! { "status_text": "In progress" })
				.await
				.unwrap()
		);
		let found = repository.find_by_id(id).await.unwrap().unwrap();
		assert_eq!(found.status_text, "In progress");

		assert!(
			!repository
				.apply_update(ObjectId::new(), doc! { "status_text": "x" })
				.await
				.unwrap()
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_twice(repository: IssueRepository) {
		let id = repository.insert(issue("a")).await.unwrap().id.unwrap();

		assert!(repository.delete(id).await.unwrap());
		assert!(!repository.delete(id).await.unwrap());
		assert!(repository.find_by_id(id).await.unwrap().is_none());
	}
}
