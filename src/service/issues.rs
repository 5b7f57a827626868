//! Issue service
//!
//! The four operations of the issue API. Every business outcome, success or
//! failure, is a value: `Ok` carries the response body and `Err` an
//! [`IssueError`] that renders to the client-facing `{ error, _id? }` shape.

use bson::doc;
use bson::oid::ObjectId;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::IssueError;
use super::forms::{IssueDeletion, IssueFilter, IssueUpdate, NewIssue};
use super::views::{Acknowledgement, IssueView};
use crate::models::{Issue, Project};
use crate::nosql::DocumentBackend;
use crate::repository::{
	IssueRepository, ProjectRepository, RepositoryError, RepositoryResult, parse_object_id,
};

/// Result type for issue operations
pub type IssueResult<T> = Result<T, IssueError>;

/// Behavioural switches for [`IssueService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueServiceOptions {
	/// Set `open = true` on every update that does not supply `open`
	pub reopen_on_update: bool,
}

impl Default for IssueServiceOptions {
	fn default() -> Self {
		Self {
			reopen_on_update: true,
		}
	}
}

/// Project-scoped issue operations
#[derive(Clone)]
pub struct IssueService {
	backend: Arc<dyn DocumentBackend>,
	projects: ProjectRepository,
	issues: IssueRepository,
	options: IssueServiceOptions,
}

impl IssueService {
	/// Create a service over a shared backend handle
	pub fn new(backend: Arc<dyn DocumentBackend>, options: IssueServiceOptions) -> Self {
		Self {
			projects: ProjectRepository::new(backend.clone()),
			issues: IssueRepository::new(backend.clone()),
			backend,
			options,
		}
	}

	/// Create the indexes the service relies on
	pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
		self.projects.ensure_indexes().await
	}

	/// List a project's issues, optionally filtered
	pub async fn list(&self, project: &str, filter: &IssueFilter) -> IssueResult<Vec<IssueView>> {
		let Some(found) = self.projects.find_by_name(project).await.map_err(store_failure)? else {
			return Err(IssueError::ProjectNotFound {
				project: project.to_string(),
			});
		};

		let issues = self
			.issues
			.find_many_by_ids(&found.issues)
			.await
			.map_err(store_failure)?;

		Ok(issues
			.iter()
			.filter(|issue| filter.matches(issue))
			.map(IssueView::from)
			.collect())
	}

	/// File a new issue, creating the project on first use
	///
	/// The issue is written before it is linked. If linking fails the
	/// issue remains in the store unreferenced.
	pub async fn create(&self, project: &str, form: &NewIssue) -> IssueResult<IssueView> {
		let required = form.required().ok_or(IssueError::RequiredFieldsMissing)?;

		let owner = self
			.projects
			.get_or_create_by_name(project)
			.await
			.map_err(store_failure)?;
		let project_id = owner.id.ok_or_else(|| {
			store_failure(RepositoryError::StoreUnavailable(format!(
				"project {} has no id",
				project
			)))
		})?;

		let issue = Issue::new(
			required.issue_title,
			required.issue_text,
			required.created_by,
			Utc::now(),
		)
		.with_assigned_to(form.assigned_to())
		.with_status_text(form.status_text());
		let issue = self.issues.insert(issue).await.map_err(store_failure)?;

		if let Some(issue_id) = issue.id {
			self.projects
				.push_issue(project_id, issue_id)
				.await
				.map_err(store_failure)?;
		}

		info!(project, issue = %issue.id_hex(), "issue created");
		Ok(IssueView::from(&issue))
	}

	/// Partially update an issue that belongs to `project`
	pub async fn update(&self, project: &str, form: &IssueUpdate) -> IssueResult<Acknowledgement> {
		let id = form.issue_id().ok_or(IssueError::MissingId)?;
		if !form.has_update_fields() {
			return Err(IssueError::NoUpdateFields { id });
		}

		let could_not_update = || IssueError::CouldNotUpdate { id: id.clone() };

		let owner = self.member_project(project, &id).await?;
		if owner.is_none() {
			return Err(could_not_update());
		}

		let open = match &form.open {
			Some(value) if !value.is_empty() => {
				Some(value.to_flag().ok_or_else(could_not_update)?)
			}
			_ => None,
		};

		let mut set = doc! { "updated_on": bson::DateTime::now() };
		for (key, value) in form.text_changes() {
			set.insert(key, value);
		}
		match open {
			Some(open) => {
				set.insert("open", open);
			}
			None if self.options.reopen_on_update => {
				set.insert("open", true);
			}
			None => {}
		}

		let issue_id = parse_object_id(&id).map_err(|_| could_not_update())?;
		match self.issues.apply_update(issue_id, set).await {
			Ok(true) => {
				info!(project, issue = %id, "issue updated");
				Ok(Acknowledgement::updated(id))
			}
			Ok(false) => Err(could_not_update()),
			Err(RepositoryError::NotFound(_) | RepositoryError::ValidationFailed(_)) => {
				Err(could_not_update())
			}
			Err(err) => Err(store_failure(err)),
		}
	}

	/// Delete an issue that belongs to `project`
	///
	/// The project's reference is pruned before the issue itself is removed,
	/// so a listing never sees a dangling reference.
	pub async fn delete(&self, project: &str, form: &IssueDeletion) -> IssueResult<Acknowledgement> {
		let id = form.issue_id().ok_or(IssueError::MissingId)?;
		let could_not_delete = || IssueError::CouldNotDelete { id: id.clone() };

		let Some(owner) = self.member_project(project, &id).await? else {
			return Err(could_not_delete());
		};
		let (Some(project_id), Ok(issue_id)) = (owner.id, parse_object_id(&id)) else {
			return Err(could_not_delete());
		};

		match self.unlink_and_delete(project_id, issue_id).await {
			Ok(true) => {
				info!(project, issue = %id, "issue deleted");
				Ok(Acknowledgement::deleted(id))
			}
			Ok(false) => Err(could_not_delete()),
			Err(RepositoryError::NotFound(_) | RepositoryError::ValidationFailed(_)) => {
				Err(could_not_delete())
			}
			Err(err) => Err(store_failure(err)),
		}
	}

	/// Whether the store answers
	pub async fn is_healthy(&self) -> bool {
		self.backend.health_check().await.is_ok()
	}

	async fn unlink_and_delete(&self, project_id: ObjectId, issue_id: ObjectId) -> RepositoryResult<bool> {
		self.projects.pull_issue(project_id, issue_id).await?;
		self.issues.delete(issue_id).await
	}

	/// The project named `project`, if it exists and lists issue `id`
	async fn member_project(&self, project: &str, id: &str) -> IssueResult<Option<Project>> {
		let found = self.projects.find_by_name(project).await.map_err(store_failure)?;
		Ok(found.filter(|found| found.contains_issue(id)))
	}
}

/// Log a repository failure and hand it to the client in normalised form
fn store_failure(err: RepositoryError) -> IssueError {
	match &err {
		RepositoryError::StoreUnavailable(detail) => warn!(%detail, "document store failure"),
		other => warn!(detail = other.detail(), "repository rejected request"),
	}
	IssueError::Repository(err)
}
