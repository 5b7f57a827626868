//! URL routing
//!
//! The route table is small and fixed:
//!
//! | Path                    | Methods                 |
//! |-------------------------|-------------------------|
//! | `/api/issues/{project}` | GET, POST, PUT, DELETE  |
//! | `/health`               | GET                     |

use async_trait::async_trait;
use hyper::Method;
use percent_encoding::percent_decode_str;

use super::error::Result;
use super::handler::Handler;
use super::request::Request;
use super::response::Response;
use super::views::{IssueViews, PROJECT_PARAM};
use crate::service::IssueService;

const ISSUES_PREFIX: &str = "/api/issues/";
const HEALTH_PATH: &str = "/health";

/// A resolved route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
	Issues { project: String },
	Health,
}

impl Route {
	/// Resolve a request path, percent-decoding the project segment
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Route;
	///
	/// assert_eq!(
	///     Route::resolve("/api/issues/my%20project"),
	///     Some(Route::Issues { project: "my project".to_string() })
	/// );
	/// assert_eq!(Route::resolve("/api/issues/"), None);
	/// ```
	pub fn resolve(path: &str) -> Option<Route> {
		if path == HEALTH_PATH {
			return Some(Route::Health);
		}

		let segment = path.strip_prefix(ISSUES_PREFIX)?;
		if segment.is_empty() || segment.contains('/') {
			return None;
		}
		let project = percent_decode_str(segment).decode_utf8().ok()?;
		Some(Route::Issues {
			project: project.into_owned(),
		})
	}
}

/// Dispatches requests to [`IssueViews`]
#[derive(Clone)]
pub struct Router {
	views: IssueViews,
}

impl Router {
	pub fn new(service: IssueService) -> Self {
		Self {
			views: IssueViews::new(service),
		}
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let Some(route) = Route::resolve(request.path()) else {
			return Ok(Response::not_found());
		};

		match route {
			Route::Health => match request.method {
				Method::GET => self.views.health(request).await,
				_ => Ok(Response::method_not_allowed()),
			},
			Route::Issues { project } => {
				request.set_path_param(PROJECT_PARAM, project);
				match request.method {
					Method::GET => self.views.list(request).await,
					Method::POST => self.views.create(request).await,
					Method::PUT => self.views.update(request).await,
					Method::DELETE => self.views.delete(request).await,
					_ => Ok(Response::method_not_allowed()),
				}
			}
		}
	}
}
