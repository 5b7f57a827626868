//! Backend traits
//!
//! `NoSQLBackend` is implemented by every backend; `DocumentBackend` adds the
//! collection-level CRUD surface used by the repositories.

use async_trait::async_trait;

use super::error::Result;
use super::types::{Document, FindOneAndUpdateOptions, IndexModel, NoSQLBackendType, UpdateResult};

/// Common behaviour of all backends
#[async_trait]
pub trait NoSQLBackend: Send + Sync {
	/// Which kind of backend this is
	fn backend_type(&self) -> NoSQLBackendType;

	/// Verify that the backend can serve requests
	async fn health_check(&self) -> Result<()>;
}

/// Trait for document-oriented databases
///
/// Filters and updates use the MongoDB query language expressed as BSON
/// documents, so the same repository code runs against any implementation.
///
/// # Example
///
/// ```rust,ignore
/// use bson::doc;
///
/// let project = db.find_one("projects", doc! { "name": "apitest" }).await?;
/// ```
#[async_trait]
pub trait DocumentBackend: NoSQLBackend {
	/// Finds a single document matching the filter
	///
	/// Returns `Some(Document)` if a matching document is found, `None` otherwise.
	async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>>;

	/// Finds every document matching the filter, in store order
	async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>>;

	/// Inserts a single document into the collection
	///
	/// Returns the hex id of the inserted document.
	async fn insert_one(&self, collection: &str, document: Document) -> Result<String>;

	/// Updates a single document matching the filter
	///
	/// ```rust,ignore
	/// let result = db.update_one(
	///     "issues",
	///     doc! { "_id": id },
	///     doc! { "$set": { "open": false } }
	/// ).await?;
	/// ```
	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> Result<UpdateResult>;

	/// Atomically updates one document and returns it as it is after the update
	///
	/// With `options.upsert` set, a document built from the filter's equality
	/// fields and the update is inserted when nothing matches.
	async fn find_one_and_update(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: FindOneAndUpdateOptions,
	) -> Result<Option<Document>>;

	/// Deletes a single document matching the filter
	///
	/// Returns the number of documents deleted (0 or 1).
	async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64>;

	/// Creates an index if it does not already exist
	async fn create_index(&self, collection: &str, index: IndexModel) -> Result<()>;
}
