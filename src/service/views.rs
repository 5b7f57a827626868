//! Response shapes

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::models::Issue;

/// Issue as returned to clients, with a fixed field order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueView {
	#[serde(rename = "_id")]
	pub id: String,
	pub issue_title: String,
	pub issue_text: String,
	pub created_on: String,
	pub updated_on: String,
	pub created_by: String,
	pub assigned_to: String,
	pub open: bool,
	pub status_text: String,
}

/// Render a stored timestamp as RFC 3339 UTC with millisecond precision
pub fn format_timestamp(timestamp: bson::DateTime) -> String {
	timestamp
		.to_chrono()
		.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&Issue> for IssueView {
	fn from(issue: &Issue) -> Self {
		Self {
			id: issue.id_hex(),
			issue_title: issue.issue_title.clone(),
			issue_text: issue.issue_text.clone(),
			created_on: format_timestamp(issue.created_on),
			updated_on: format_timestamp(issue.updated_on),
			created_by: issue.created_by.clone(),
			assigned_to: issue.assigned_to.clone(),
			open: issue.open,
			status_text: issue.status_text.clone(),
		}
	}
}

/// Success acknowledgement for update and delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
	pub result: String,
	#[serde(rename = "_id")]
	pub id: String,
}

impl Acknowledgement {
	/// `{ result: "successfully updated", _id }`
	pub fn updated(id: impl Into<String>) -> Self {
		Self {
			result: "successfully updated".to_string(),
			id: id.into(),
		}
	}

	/// `{ result: "successfully deleted", _id }`
	pub fn deleted(id: impl Into<String>) -> Self {
		Self {
			result: "successfully deleted".to_string(),
			id: id.into(),
		}
	}
}
