//! Request inputs
//!
//! Bodies arrive either as URL-encoded forms (every value a string) or as
//! JSON (any scalar). [`FieldValue`] accepts both.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::{Issue, IssueField};

/// A loosely typed scalar from a request body
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
	Flag(bool),
	Number(serde_json::Number),
	Text(String),
}

impl FieldValue {
	/// Only the empty string is empty; flags and numbers always carry a value
	pub fn is_empty(&self) -> bool {
		matches!(self, FieldValue::Text(text) if text.is_empty())
	}

	/// The value rendered as text
	pub fn to_text(&self) -> String {
		match self {
			FieldValue::Flag(flag) => flag.to_string(),
			FieldValue::Number(number) => number.to_string(),
			FieldValue::Text(text) => text.clone(),
		}
	}

	/// Falsy values: the empty string, `false` and zero
	pub fn is_falsy(&self) -> bool {
		match self {
			FieldValue::Flag(flag) => !flag,
			FieldValue::Number(number) => number.as_f64() == Some(0.0),
			FieldValue::Text(text) => text.is_empty(),
		}
	}

	/// Interpret as a boolean: JSON booleans or `"true"`/`"false"` in any case
	pub fn to_flag(&self) -> Option<bool> {
		match self {
			FieldValue::Flag(flag) => Some(*flag),
			FieldValue::Text(text) if text.eq_ignore_ascii_case("true") => Some(true),
			FieldValue::Text(text) if text.eq_ignore_ascii_case("false") => Some(false),
			_ => None,
		}
	}
}

impl From<&str> for FieldValue {
	fn from(text: &str) -> Self {
		FieldValue::Text(text.to_string())
	}
}

impl From<bool> for FieldValue {
	fn from(flag: bool) -> Self {
		FieldValue::Flag(flag)
	}
}

/// Text of a supplied, truthy value
fn present(value: &Option<FieldValue>) -> Option<String> {
	value
		.as_ref()
		.filter(|value| !value.is_falsy())
		.map(FieldValue::to_text)
}

fn is_blank(value: &serde_json::Value) -> bool {
	match value {
		serde_json::Value::Null => true,
		serde_json::Value::String(text) => text.is_empty(),
		serde_json::Value::Array(items) => items.is_empty(),
		_ => false,
	}
}

/// POST body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIssue {
	#[serde(default)]
	pub issue_title: Option<FieldValue>,
	#[serde(default)]
	pub issue_text: Option<FieldValue>,
	#[serde(default)]
	pub created_by: Option<FieldValue>,
	#[serde(default)]
	pub assigned_to: Option<FieldValue>,
	#[serde(default)]
	pub status_text: Option<FieldValue>,
}

/// The three mandatory fields of a new issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
	pub issue_title: String,
	pub issue_text: String,
	pub created_by: String,
}

impl NewIssue {
	/// Title, text and author, or `None` if any is absent or falsy
	pub fn required(&self) -> Option<RequiredFields> {
		Some(RequiredFields {
			issue_title: present(&self.issue_title)?,
			issue_text: present(&self.issue_text)?,
			created_by: present(&self.created_by)?,
		})
	}

	/// Assignee, defaulting to the empty string
	pub fn assigned_to(&self) -> String {
		present(&self.assigned_to).unwrap_or_default()
	}

	/// Status text, defaulting to the empty string
	pub fn status_text(&self) -> String {
		present(&self.status_text).unwrap_or_default()
	}
}

/// PUT body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueUpdate {
	#[serde(rename = "_id", default)]
	pub id: Option<FieldValue>,
	#[serde(default)]
	pub issue_title: Option<FieldValue>,
	#[serde(default)]
	pub issue_text: Option<FieldValue>,
	#[serde(default)]
	pub created_by: Option<FieldValue>,
	#[serde(default)]
	pub assigned_to: Option<FieldValue>,
	#[serde(default)]
	pub status_text: Option<FieldValue>,
	#[serde(default)]
	pub open: Option<FieldValue>,
	/// Keys outside the issue schema; never stored, but they still count as
	/// update fields
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

impl IssueUpdate {
	/// The issue id, if supplied and truthy
	pub fn issue_id(&self) -> Option<String> {
		present(&self.id)
	}

	/// Whether any field besides `_id`, known or not, carries a value
	pub fn has_update_fields(&self) -> bool {
		let known = [
			&self.issue_title,
			&self.issue_text,
			&self.created_by,
			&self.assigned_to,
			&self.status_text,
			&self.open,
		]
		.into_iter()
		.any(|value| value.as_ref().is_some_and(|value| !value.is_empty()));
		known || self.extra.values().any(|value| !is_blank(value))
	}

	/// Text fields to overwrite: supplied, trimmed, and still non-empty
	pub fn text_changes(&self) -> Vec<(&'static str, String)> {
		[
			("issue_title", &self.issue_title),
			("issue_text", &self.issue_text),
			("created_by", &self.created_by),
			("assigned_to", &self.assigned_to),
			("status_text", &self.status_text),
		]
		.into_iter()
		.filter_map(|(key, value)| {
			let trimmed = value.as_ref()?.to_text().trim().to_string();
			(!trimmed.is_empty()).then_some((key, trimmed))
		})
		.collect()
	}
}

/// DELETE body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueDeletion {
	#[serde(rename = "_id", default)]
	pub id: Option<FieldValue>,
}

impl IssueDeletion {
	/// The issue id, if supplied and truthy
	pub fn issue_id(&self) -> Option<String> {
		present(&self.id)
	}
}

/// GET query: whitelisted field/substring pairs, all of which must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
	conditions: Vec<(IssueField, String)>,
}

impl IssueFilter {
	/// Build from raw query pairs, silently dropping keys off the whitelist
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let conditions = pairs
			.into_iter()
			.filter_map(|(key, value)| {
				let field = IssueField::from_key(key.as_ref())?;
				Some((field, value.as_ref().to_lowercase()))
			})
			.collect();
		Self { conditions }
	}

	/// Whether no condition survived the whitelist
	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	/// Case-insensitive substring match on every condition
	pub fn matches(&self, issue: &Issue) -> bool {
		self.conditions.iter().all(|(field, needle)| {
			issue
				.field_text(*field)
				.to_lowercase()
				.contains(needle.as_str())
		})
	}
}
