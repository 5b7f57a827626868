//! Core `Document` trait definition.

use bson::oid::ObjectId;
use serde::{Serialize, de::DeserializeOwned};

use super::error::Result;
use super::types::{Document as BsonDocument, IndexModel};

/// A typed record stored in one collection of a [`DocumentBackend`].
///
/// [`DocumentBackend`]: super::traits::DocumentBackend
///
/// ## Example
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     id: Option<ObjectId>,
///     name: String,
/// }
///
/// impl Document for User {
///     const COLLECTION_NAME: &'static str = "users";
///     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
///     fn set_id(&mut self, id: ObjectId) { self.id = Some(id); }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
	/// Collection name in the store.
	const COLLECTION_NAME: &'static str;

	/// Get the document's ID.
	///
	/// Returns `None` if the document hasn't been persisted yet.
	fn id(&self) -> Option<&ObjectId>;

	/// Set the document's ID.
	///
	/// This is typically called after insertion.
	fn set_id(&mut self, id: ObjectId);

	/// Index definitions for this collection.
	fn indexes() -> Vec<IndexModel> {
		Vec::new()
	}

	/// Convert into a BSON document for storage.
	fn to_bson(&self) -> Result<BsonDocument> {
		Ok(bson::to_document(self)?)
	}

	/// Rebuild from a stored BSON document.
	fn from_bson(document: BsonDocument) -> Result<Self> {
		Ok(bson::from_document(document)?)
	}
}
