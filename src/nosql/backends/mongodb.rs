//! MongoDB connection and backend implementation
//!
//! This module provides the MongoDB database backend that implements
//! the `DocumentBackend` and `NoSQLBackend` traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use issue_tracker::nosql::backends::mongodb::MongoDBBackend;
//! use issue_tracker::nosql::traits::DocumentBackend;
//! use bson::doc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MongoDBBackend::builder()
//!     .url("mongodb://localhost:27017")
//!     .database("issues")
//!     .build()
//!     .await?;
//!
//! let id = backend.insert_one("projects", doc! { "name": "apitest", "issues": [] }).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bson::Document;
use ::mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use ::mongodb::{Client, Database};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::bson_id_to_string;
use crate::nosql::error::{NoSQLError, Result};
use crate::nosql::traits::{DocumentBackend, NoSQLBackend};
use crate::nosql::types::{FindOneAndUpdateOptions, IndexModel, NoSQLBackendType, UpdateResult};

/// MongoDB backend implementation
///
/// Clones share one driver client and therefore one connection pool.
///
/// ```rust,no_run
/// use issue_tracker::nosql::backends::mongodb::MongoDBBackend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MongoDBBackend::builder()
///     .url("mongodb://localhost:27017")
///     .database("issues")
///     .max_pool_size(100)
///     .min_pool_size(10)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MongoDBBackend {
	client: Arc<Client>,
	database_name: String,
}

/// Builder for configuring MongoDB connections
pub struct MongoDBBackendBuilder {
	url: String,
	database: String,
	max_pool_size: Option<u32>,
	min_pool_size: Option<u32>,
	max_idle_time_secs: Option<u64>,
}

impl Default for MongoDBBackendBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl MongoDBBackendBuilder {
	/// Create a new builder with default settings
	pub fn new() -> Self {
		Self {
			url: "mongodb://localhost:27017".to_string(),
			database: "issue_tracker".to_string(),
			max_pool_size: None,
			min_pool_size: None,
			max_idle_time_secs: None,
		}
	}

	/// Set the MongoDB connection URL
	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	/// Set the database name
	pub fn database(mut self, database: impl Into<String>) -> Self {
		self.database = database.into();
		self
	}

	/// Set the maximum connection pool size
	pub fn max_pool_size(mut self, size: u32) -> Self {
		self.max_pool_size = Some(size);
		self
	}

	/// Set the minimum connection pool size
	pub fn min_pool_size(mut self, size: u32) -> Self {
		self.min_pool_size = Some(size);
		self
	}

	/// Set the maximum idle time for connections in seconds
	pub fn max_idle_time_secs(mut self, secs: u64) -> Self {
		self.max_idle_time_secs = Some(secs);
		self
	}

	/// Build the MongoDB backend
	///
	/// The driver connects lazily; call [`NoSQLBackend::health_check`] to
	/// verify the server is reachable.
	pub async fn build(self) -> Result<MongoDBBackend> {
		let mut options = ClientOptions::parse(&self.url)
			.await
			.map_err(|e| NoSQLError::ConnectionError(e.to_string()))?;

		if let Some(max_size) = self.max_pool_size {
			options.max_pool_size = Some(max_size);
		}

		if let Some(min_size) = self.min_pool_size {
			options.min_pool_size = Some(min_size);
		}

		if let Some(idle_time) = self.max_idle_time_secs {
			options.max_idle_time = Some(Duration::from_secs(idle_time));
		}

		let client = Client::with_options(options)
			.map_err(|e| NoSQLError::ConnectionError(e.to_string()))?;

		Ok(MongoDBBackend {
			client: Arc::new(client),
			database_name: self.database,
		})
	}
}

impl MongoDBBackend {
	/// Create a builder for configuring the MongoDB connection
	pub fn builder() -> MongoDBBackendBuilder {
		MongoDBBackendBuilder::new()
	}

	/// Get the MongoDB database instance
	pub fn database(&self) -> Database {
		self.client.database(&self.database_name)
	}

	/// Drop the whole database. Used to reset state between test runs.
	pub async fn drop_database(&self) -> Result<()> {
		self.database().drop().await.map_err(NoSQLError::from)
	}
}

#[async_trait]
impl NoSQLBackend for MongoDBBackend {
	fn backend_type(&self) -> NoSQLBackendType {
		NoSQLBackendType::MongoDB
	}

	async fn health_check(&self) -> Result<()> {
		self.database()
			.run_command(bson::doc! { "ping": 1 })
			.await
			.map_err(|e| NoSQLError::ConnectionError(format!("Health check failed: {}", e)))?;
		Ok(())
	}
}

#[async_trait]
impl DocumentBackend for MongoDBBackend {
	async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
		debug!(collection, ?filter, "find_one");
		let coll = self.database().collection::<Document>(collection);

		Ok(coll.find_one(filter).await?)
	}

	async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
		use futures::stream::TryStreamExt;

		debug!(collection, ?filter, "find_many");
		let coll = self.database().collection::<Document>(collection);

		let cursor = coll.find(filter).await?;
		Ok(cursor.try_collect().await?)
	}

	async fn insert_one(&self, collection: &str, document: Document) -> Result<String> {
		debug!(collection, "insert_one");
		let coll = self.database().collection::<Document>(collection);

		let result = coll.insert_one(document).await?;
		Ok(bson_id_to_string(result.inserted_id))
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> Result<UpdateResult> {
		debug!(collection, ?filter, ?update, "update_one");
		let coll = self.database().collection::<Document>(collection);

		let result = coll.update_one(filter, update).await?;

		Ok(UpdateResult::new(
			result.matched_count,
			result.modified_count,
			result.upserted_id.map(bson_id_to_string),
		))
	}

	async fn find_one_and_update(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: FindOneAndUpdateOptions,
	) -> Result<Option<Document>> {
		debug!(collection, ?filter, ?update, upsert = options.upsert, "find_one_and_update");
		let coll = self.database().collection::<Document>(collection);

		let mut mongo_options = ::mongodb::options::FindOneAndUpdateOptions::default();
		mongo_options.upsert = Some(options.upsert);
		mongo_options.return_document = Some(ReturnDocument::After);

		Ok(coll
			.find_one_and_update(filter, update)
			.with_options(mongo_options)
			.await?)
	}

	async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64> {
		debug!(collection, ?filter, "delete_one");
		let coll = self.database().collection::<Document>(collection);

		let result = coll.delete_one(filter).await?;
		Ok(result.deleted_count)
	}

	async fn create_index(&self, collection: &str, index: IndexModel) -> Result<()> {
		debug!(collection, keys = ?index.keys, unique = index.unique, "create_index");
		let coll = self.database().collection::<Document>(collection);

		let mut index_options = IndexOptions::default();
		index_options.unique = Some(index.unique);

		let model = ::mongodb::IndexModel::builder()
			.keys(index.keys)
			.options(index_options)
			.build();

		coll.create_index(model).await?;
		Ok(())
	}
}
