//! In-memory document backend
//!
//! A process-local store that understands the subset of the MongoDB query
//! language the repositories use:
//!
//! - filters: field equality and `{ "$in": [...] }`
//! - updates: `$set`, `$setOnInsert`, `$push`, `$pull`
//! - upserts through `find_one_and_update`
//! - unique indexes
//!
//! Every operation runs under one write lock, so `find_one_and_update` is
//! atomic with respect to concurrent callers, like its server counterpart.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::bson_id_to_string;
use crate::nosql::error::{NoSQLError, Result};
use crate::nosql::traits::{DocumentBackend, NoSQLBackend};
use crate::nosql::types::{FindOneAndUpdateOptions, IndexModel, NoSQLBackendType, UpdateResult};

#[derive(Default)]
struct Collection {
	documents: Vec<Document>,
	unique_indexes: Vec<Vec<String>>,
}

impl Collection {
	fn position(&self, filter: &Document) -> Result<Option<usize>> {
		for (index, document) in self.documents.iter().enumerate() {
			if matches_filter(document, filter)? {
				return Ok(Some(index));
			}
		}
		Ok(None)
	}

	/// Reject `candidate` if it collides with another document on a unique index.
	fn check_unique(&self, candidate: &Document, skip: Option<usize>) -> Result<()> {
		for fields in &self.unique_indexes {
			let key: Vec<Option<&Bson>> = fields.iter().map(|f| candidate.get(f)).collect();
			let collision = self.documents.iter().enumerate().any(|(index, other)| {
				Some(index) != skip && fields.iter().map(|f| other.get(f)).eq(key.iter().copied())
			});
			if collision {
				return Err(NoSQLError::DuplicateKey(format!(
					"duplicate value for unique index on {}",
					fields.join(", ")
				)));
			}
		}
		Ok(())
	}
}

/// Thread-safe in-memory implementation of [`DocumentBackend`]
///
/// Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
	collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryBackend {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of documents currently held in `collection`
	pub fn count(&self, collection: &str) -> usize {
		self.collections
			.read()
			.get(collection)
			.map_or(0, |c| c.documents.len())
	}
}

fn matches_filter(document: &Document, filter: &Document) -> Result<bool> {
	for (key, expected) in filter {
		let actual = document.get(key);
		let matched = match expected {
			Bson::Document(condition) if is_operator_document(condition) => {
				matches_condition(actual, condition)?
			}
			_ => actual == Some(expected),
		};
		if !matched {
			return Ok(false);
		}
	}
	Ok(true)
}

fn is_operator_document(document: &Document) -> bool {
	document.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn matches_condition(actual: Option<&Bson>, condition: &Document) -> Result<bool> {
	for (operator, operand) in condition {
		let matched = match (operator.as_str(), operand) {
			("$in", Bson::Array(candidates)) => {
				actual.is_some_and(|value| candidates.contains(value))
			}
			_ => {
				return Err(NoSQLError::InvalidOperation(format!(
					"unsupported filter operator {}",
					operator
				)));
			}
		};
		if !matched {
			return Ok(false);
		}
	}
	Ok(true)
}

fn apply_update(document: &mut Document, update: &Document, inserting: bool) -> Result<()> {
	for (operator, fields) in update {
		let Bson::Document(fields) = fields else {
			return Err(NoSQLError::InvalidOperation(format!(
				"{} expects a document",
				operator
			)));
		};
		match operator.as_str() {
			"$set" => {
				for (key, value) in fields {
					document.insert(key.clone(), value.clone());
				}
			}
			"$setOnInsert" => {
				if inserting {
					for (key, value) in fields {
						document.insert(key.clone(), value.clone());
					}
				}
			}
			"$push" => {
				for (key, value) in fields {
					match document.get_mut(key) {
						Some(Bson::Array(items)) => items.push(value.clone()),
						None => {
							document.insert(key.clone(), Bson::Array(vec![value.clone()]));
						}
						Some(_) => {
							return Err(NoSQLError::InvalidOperation(format!(
								"$push target {} is not an array",
								key
							)));
						}
					}
				}
			}
			"$pull" => {
				for (key, value) in fields {
					if let Some(Bson::Array(items)) = document.get_mut(key) {
						items.retain(|item| item != value);
					}
				}
			}
			other => {
				return Err(NoSQLError::InvalidOperation(format!(
					"unsupported update operator {}",
					other
				)));
			}
		}
	}
	Ok(())
}

/// Seed an upserted document with the plain equality fields of the filter.
fn document_from_filter(filter: &Document) -> Document {
	filter
		.iter()
		.filter(|(_, value)| !matches!(value, Bson::Document(d) if is_operator_document(d)))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect()
}

fn ensure_id(document: &mut Document) -> Bson {
	if let Some(id) = document.get("_id") {
		return id.clone();
	}
	let id = Bson::ObjectId(ObjectId::new());
	document.insert("_id", id.clone());
	id
}

#[async_trait]
impl NoSQLBackend for InMemoryBackend {
	fn backend_type(&self) -> NoSQLBackendType {
		NoSQLBackendType::InMemory
	}

	async fn health_check(&self) -> Result<()> {
		Ok(())
	}
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
	async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
		let collections = self.collections.read();
		let Some(coll) = collections.get(collection) else {
			return Ok(None);
		};
		Ok(coll.position(&filter)?.map(|i| coll.documents[i].clone()))
	}

	async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
		let collections = self.collections.read();
		let Some(coll) = collections.get(collection) else {
			return Ok(Vec::new());
		};
		let mut found = Vec::new();
		for document in &coll.documents {
			if matches_filter(document, &filter)? {
				found.push(document.clone());
			}
		}
		Ok(found)
	}

	async fn insert_one(&self, collection: &str, mut document: Document) -> Result<String> {
		let mut collections = self.collections.write();
		let coll = collections.entry(collection.to_string()).or_default();

		let id = ensure_id(&mut document);
		if coll.documents.iter().any(|d| d.get("_id") == Some(&id)) {
			return Err(NoSQLError::DuplicateKey(format!("_id {}", id)));
		}
		coll.check_unique(&document, None)?;
		coll.documents.push(document);

		Ok(bson_id_to_string(id))
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> Result<UpdateResult> {
		let mut collections = self.collections.write();
		let Some(coll) = collections.get_mut(collection) else {
			return Ok(UpdateResult::default());
		};
		let Some(index) = coll.position(&filter)? else {
			return Ok(UpdateResult::default());
		};

		let mut updated = coll.documents[index].clone();
		apply_update(&mut updated, &update, false)?;
		coll.check_unique(&updated, Some(index))?;

		let modified = u64::from(updated != coll.documents[index]);
		coll.documents[index] = updated;

		Ok(UpdateResult::new(1, modified, None))
	}

	async fn find_one_and_update(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: FindOneAndUpdateOptions,
	) -> Result<Option<Document>> {
		let mut collections = self.collections.write();
		let coll = collections.entry(collection.to_string()).or_default();

		if let Some(index) = coll.position(&filter)? {
			let mut updated = coll.documents[index].clone();
			apply_update(&mut updated, &update, false)?;
			coll.check_unique(&updated, Some(index))?;
			coll.documents[index] = updated.clone();
			return Ok(Some(updated));
		}

		if !options.upsert {
			return Ok(None);
		}

		let mut inserted = document_from_filter(&filter);
		apply_update(&mut inserted, &update, true)?;
		ensure_id(&mut inserted);
		coll.check_unique(&inserted, None)?;
		coll.documents.push(inserted.clone());

		Ok(Some(inserted))
	}

	async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64> {
		let mut collections = self.collections.write();
		let Some(coll) = collections.get_mut(collection) else {
			return Ok(0);
		};
		match coll.position(&filter)? {
			Some(index) => {
				coll.documents.remove(index);
				Ok(1)
			}
			None => Ok(0),
		}
	}

	async fn create_index(&self, collection: &str, index: IndexModel) -> Result<()> {
		let mut collections = self.collections.write();
		let coll = collections.entry(collection.to_string()).or_default();

		if index.unique {
			let fields = index.field_names();
			if !coll.unique_indexes.contains(&fields) {
				coll.unique_indexes.push(fields);
			}
		}
		Ok(())
	}
}
