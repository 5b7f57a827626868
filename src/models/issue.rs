//! Issue model

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nosql::Document;

/// A single issue filed under a project
///
/// Stored in the `issues` collection. Timestamps are BSON datetimes
/// (millisecond precision, UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
	/// Primary key, assigned on insert
	#[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
	pub id: Option<ObjectId>,

	pub issue_title: String,

	pub issue_text: String,

	pub created_on: bson::DateTime,

	pub updated_on: bson::DateTime,

	pub created_by: String,

	#[serde(default)]
	pub assigned_to: String,

	#[serde(default = "default_open")]
	pub open: bool,

	#[serde(default)]
	pub status_text: String,
}

fn default_open() -> bool {
	true
}

impl Issue {
	/// Create an unsaved, open issue stamped with `now`
	pub fn new(
		issue_title: impl Into<String>,
		issue_text: impl Into<String>,
		created_by: impl Into<String>,
		now: DateTime<Utc>,
	) -> Self {
		let now = bson::DateTime::from_chrono(now);
		Self {
			id: None,
			issue_title: issue_title.into(),
			issue_text: issue_text.into(),
			created_on: now,
			updated_on: now,
			created_by: created_by.into(),
			assigned_to: String::new(),
			open: true,
			status_text: String::new(),
		}
	}

	/// Set the assignee
	pub fn with_assigned_to(mut self, assigned_to: impl Into<String>) -> Self {
		self.assigned_to = assigned_to.into();
		self
	}

	/// Set the free-form status
	pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
		self.status_text = status_text.into();
		self
	}

	/// Hex form of the id, empty for an unsaved issue
	pub fn id_hex(&self) -> String {
		self.id.map(|id| id.to_hex()).unwrap_or_default()
	}

	/// Value of a filterable field rendered as text
	pub fn field_text(&self, field: IssueField) -> String {
		match field {
			IssueField::Id => self.id_hex(),
			IssueField::IssueTitle => self.issue_title.clone(),
			IssueField::IssueText => self.issue_text.clone(),
			IssueField::CreatedBy => self.created_by.clone(),
			IssueField::AssignedTo => self.assigned_to.clone(),
			IssueField::Open => self.open.to_string(),
			IssueField::StatusText => self.status_text.clone(),
		}
	}
}

impl Document for Issue {
	const COLLECTION_NAME: &'static str = "issues";

	fn id(&self) -> Option<&ObjectId> {
		self.id.as_ref()
	}

	fn set_id(&mut self, id: ObjectId) {
		self.id = Some(id);
	}
}

/// Fields an issue listing can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
	Id,
	IssueTitle,
	IssueText,
	CreatedBy,
	AssignedTo,
	Open,
	StatusText,
}

impl IssueField {
	/// Every filterable field
	pub const ALL: [IssueField; 7] = [
		IssueField::Id,
		IssueField::IssueTitle,
		IssueField::IssueText,
		IssueField::CreatedBy,
		IssueField::AssignedTo,
		IssueField::Open,
		IssueField::StatusText,
	];

	/// Wire name of the field
	pub fn as_str(self) -> &'static str {
		match self {
			IssueField::Id => "_id",
			IssueField::IssueTitle => "issue_title",
			IssueField::IssueText => "issue_text",
			IssueField::CreatedBy => "created_by",
			IssueField::AssignedTo => "assigned_to",
			IssueField::Open => "open",
			IssueField::StatusText => "status_text",
		}
	}

	/// Look a field up by wire name; `None` for anything off the whitelist
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|field| field.as_str() == key)
	}
}
