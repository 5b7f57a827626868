//! Issue and health endpoints
//!
//! Every issue operation answers `200` with either the success body or the
//! `{ error, _id? }` body of the failure. Only an unreadable request body
//! or query string produces a transport error.

use serde::Serialize;

use super::error::Result;
use super::request::Request;
use super::response::Response;
use crate::service::{
	IssueDeletion, IssueFilter, IssueResult, IssueService, IssueUpdate, NewIssue,
};

/// Path parameter carrying the project name
pub const PROJECT_PARAM: &str = "project";

/// Views over a shared [`IssueService`]
#[derive(Clone)]
pub struct IssueViews {
	service: IssueService,
}

impl IssueViews {
	pub fn new(service: IssueService) -> Self {
		Self { service }
	}

	/// `GET /api/issues/{project}`
	pub async fn list(&self, request: Request) -> Result<Response> {
		let filter = IssueFilter::from_pairs(request.query_pairs()?);
		Ok(render(self.service.list(project(&request), &filter).await))
	}

	/// `POST /api/issues/{project}`
	pub async fn create(&self, request: Request) -> Result<Response> {
		let form: NewIssue = request.form()?;
		Ok(render(self.service.create(project(&request), &form).await))
	}

	/// `PUT /api/issues/{project}`
	pub async fn update(&self, request: Request) -> Result<Response> {
		let form: IssueUpdate = request.form()?;
		Ok(render(self.service.update(project(&request), &form).await))
	}

	/// `DELETE /api/issues/{project}`
	pub async fn delete(&self, request: Request) -> Result<Response> {
		let form: IssueDeletion = request.form()?;
		Ok(render(self.service.delete(project(&request), &form).await))
	}

	/// `GET /health`
	pub async fn health(&self, _request: Request) -> Result<Response> {
		let status = if self.service.is_healthy().await {
			"ok"
		} else {
			"unavailable"
		};
		Ok(Response::json(&HealthStatus { status }))
	}
}

#[derive(Debug, Serialize)]
struct HealthStatus {
	status: &'static str,
}

fn project(request: &Request) -> &str {
	request.path_param(PROJECT_PARAM).unwrap_or_default()
}

fn render<T: Serialize>(outcome: IssueResult<T>) -> Response {
	match outcome {
		Ok(body) => Response::json(&body),
		Err(err) => Response::json(&err.body()),
	}
}
