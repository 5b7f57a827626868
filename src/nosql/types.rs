//! Shared value types for document backends

use std::fmt;

pub use bson::Document;

/// Kind of document backend in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSQLBackendType {
	/// MongoDB server (standalone, replica set, or sharded cluster)
	MongoDB,
	/// Process-local in-memory store
	InMemory,
}

impl fmt::Display for NoSQLBackendType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NoSQLBackendType::MongoDB => write!(f, "mongodb"),
			NoSQLBackendType::InMemory => write!(f, "memory"),
		}
	}
}

/// Outcome of an update operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateResult {
	/// Number of documents matched by the filter
	pub matched_count: u64,
	/// Number of documents actually changed
	pub modified_count: u64,
	/// Hex id of the document inserted by an upsert, if any
	pub upserted_id: Option<String>,
}

impl UpdateResult {
	/// Create a new update result
	pub fn new(matched_count: u64, modified_count: u64, upserted_id: Option<String>) -> Self {
		Self {
			matched_count,
			modified_count,
			upserted_id,
		}
	}
}

/// Index definition applied to a collection
///
/// Keys follow the MongoDB convention: `doc! { "name": 1 }`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexModel {
	/// Indexed fields and their sort direction
	pub keys: Document,
	/// Whether the index rejects duplicate key values
	pub unique: bool,
}

impl IndexModel {
	/// Create a new index model builder.
	pub fn builder() -> IndexModelBuilder {
		IndexModelBuilder::default()
	}

	/// Names of the indexed fields, in key order.
	pub fn field_names(&self) -> Vec<String> {
		self.keys.keys().cloned().collect()
	}
}

/// Builder for [`IndexModel`]
#[derive(Debug, Default)]
pub struct IndexModelBuilder {
	keys: Document,
	unique: bool,
}

impl IndexModelBuilder {
	/// Set the indexed keys
	pub fn keys(mut self, keys: Document) -> Self {
		self.keys = keys;
		self
	}

	/// Mark the index as unique
	pub fn unique(mut self, unique: bool) -> Self {
		self.unique = unique;
		self
	}

	/// Build the index model.
	pub fn build(self) -> IndexModel {
		IndexModel {
			keys: self.keys,
			unique: self.unique,
		}
	}
}

/// Options for `find_one_and_update`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOneAndUpdateOptions {
	/// Insert a new document when nothing matches the filter
	pub upsert: bool,
}

impl FindOneAndUpdateOptions {
	/// Options with upsert enabled
	pub fn upsert() -> Self {
		Self { upsert: true }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;

	#[test]
	fn test_index_builder() {
		let index = IndexModel::builder()
			.keys(doc! { "name": 1 })
			.unique(true)
			.build();

		assert!(index.unique);
		assert_eq!(index.field_names(), vec!["name".to_string()]);
	}

	#[test]
	fn test_backend_type_display() {
		assert_eq!(NoSQLBackendType::MongoDB.to_string(), "mongodb");
		assert_eq!(NoSQLBackendType::InMemory.to_string(), "memory");
	}
}
