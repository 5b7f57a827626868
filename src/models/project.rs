//! Project model

use bson::doc;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::nosql::{Document, IndexModel};

/// A named bucket of issues
///
/// Stored in the `projects` collection as `{ name, issues: [ObjectId] }`.
/// `issues` holds references into the `issues` collection in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
	/// Primary key
	#[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
	pub id: Option<ObjectId>,

	/// Project name (unique)
	pub name: String,

	/// References to the issues filed under this project
	#[serde(default)]
	pub issues: Vec<ObjectId>,
}

impl Project {
	/// Create an unsaved project with no issues
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: None,
			name: name.into(),
			issues: Vec::new(),
		}
	}

	/// Whether the issue with the given hex id is filed under this project
	pub fn contains_issue(&self, issue_id: &str) -> bool {
		self.issues.iter().any(|id| id.to_hex() == issue_id)
	}
}

impl Document for Project {
	const COLLECTION_NAME: &'static str = "projects";

	fn id(&self) -> Option<&ObjectId> {
		self.id.as_ref()
	}

	fn set_id(&mut self, id: ObjectId) {
		self.id = Some(id);
	}

	fn indexes() -> Vec<IndexModel> {
		vec![
			IndexModel::builder()
				.keys(doc! { "name": 1 })
				.unique(true)
				.build(),
		]
	}
}
