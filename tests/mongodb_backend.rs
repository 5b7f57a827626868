//! Issue service against a real MongoDB
//!
//! Ignored by default. Run with a reachable server:
//!
//! ```text
//! ISSUE_TRACKER_TEST_MONGODB_URI=mongodb://localhost:27017 cargo test --test mongodb_backend -- --ignored
//! ```
//!
//! Every test works in its own throwaway database, dropped at the end.

use bson::oid::ObjectId;
use rstest::*;
use std::sync::Arc;

use issue_tracker::nosql::backends::MongoDBBackend;
use issue_tracker::nosql::{DocumentBackend, NoSQLBackend, NoSQLBackendType};
use issue_tracker::service::{
	FieldValue, IssueDeletion, IssueError, IssueFilter, IssueService, IssueServiceOptions,
	IssueUpdate, NewIssue,
};

const URI_VAR: &str = "ISSUE_TRACKER_TEST_MONGODB_URI";

#[fixture]
async fn backend() -> MongoDBBackend {
	let uri = std::env::var(URI_VAR).unwrap_or_else(|_| panic!("{} must be set", URI_VAR));
	MongoDBBackend::builder()
		.url(uri)
		.database(format!("issue_tracker_test_{}", ObjectId::new().to_hex()))
		.max_pool_size(4)
		.build()
		.await
		.expect("Failed to connect to MongoDB")
}

fn text(value: &str) -> Option<FieldValue> {
	Some(FieldValue::from(value))
}

fn new_issue(title: &str) -> NewIssue {
	NewIssue {
		issue_title: text(title),
		issue_text: text("Testing against MongoDB"),
		created_by: text("Integration Test"),
		..NewIssue::default()
	}
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB (set ISSUE_TRACKER_TEST_MONGODB_URI)"]
async fn test_health_check(#[future] backend: MongoDBBackend) {
	let backend = backend.await;

	assert_eq!(backend.backend_type(), NoSQLBackendType::MongoDB);
	backend.health_check().await.unwrap();
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB (set ISSUE_TRACKER_TEST_MONGODB_URI)"]
async fn test_issue_lifecycle(#[future] backend: MongoDBBackend) {
	let backend = backend.await;
	let service = IssueService::new(Arc::new(backend.clone()), IssueServiceOptions::default());
	service.ensure_indexes().await.unwrap();

	let created = service.create("mongo", &new_issue("Chai Test")).await.unwrap();
	service.create("mongo", &new_issue("Other")).await.unwrap();

	let filtered = service
		.list("mongo", &IssueFilter::from_pairs([("issue_title", "chai")]))
		.await
		.unwrap();
	assert_eq!(filtered.len(), 1);
	assert_eq!(filtered[0].id, created.id);

	let update = IssueUpdate {
		id: text(&created.id),
		status_text: text("Verified"),
		open: Some(FieldValue::Flag(false)),
		..IssueUpdate::default()
	};
	let ack = service.update("mongo", &update).await.unwrap();
	assert_eq!(ack.result, "successfully updated");

	let closed = service
		.list("mongo", &IssueFilter::from_pairs([("open", "false")]))
		.await
		.unwrap();
	assert_eq!(closed.len(), 1);
	assert_eq!(closed[0].status_text, "Verified");

	let deletion = IssueDeletion {
		id: text(&created.id),
	};
	service.delete("mongo", &deletion).await.unwrap();
	let err = service.delete("mongo", &deletion).await.unwrap_err();
	assert!(matches!(err, IssueError::CouldNotDelete { .. }));

	let remaining = service.list("mongo", &IssueFilter::default()).await.unwrap();
	assert_eq!(remaining.len(), 1);

	backend.drop_database().await.unwrap();
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB (set ISSUE_TRACKER_TEST_MONGODB_URI)"]
async fn test_concurrent_first_writes_create_one_project(#[future] backend: MongoDBBackend) {
	let backend = backend.await;
	let shared: Arc<dyn DocumentBackend> = Arc::new(backend.clone());
	let service = IssueService::new(shared.clone(), IssueServiceOptions::default());
	service.ensure_indexes().await.unwrap();

	let handles: Vec<_> = (0..8)
		.map(|n| {
			let service = service.clone();
			tokio::spawn(async move { service.create("race", &new_issue(&format!("issue {}", n))).await })
		})
		.collect();
	for handle in handles {
		handle.await.unwrap().unwrap();
	}

	let projects = shared
		.find_many("projects", bson::doc! { "name": "race" })
		.await
		.unwrap();
	assert_eq!(projects.len(), 1);

	let listed = service.list("race", &IssueFilter::default()).await.unwrap();
	assert_eq!(listed.len(), 8);

	backend.drop_database().await.unwrap();
}
