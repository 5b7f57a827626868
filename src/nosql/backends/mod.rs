//! Document backend implementations

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub mod memory;

use bson::Bson;

pub use memory::InMemoryBackend;
#[cfg(feature = "mongodb")]
pub use self::mongodb::{MongoDBBackend, MongoDBBackendBuilder};

/// Render a stored `_id` value as the string handed back to callers.
pub(crate) fn bson_id_to_string(id: Bson) -> String {
	match id {
		Bson::ObjectId(oid) => oid.to_hex(),
		Bson::String(s) => s,
		other => other.to_string(),
	}
}
