//! Request logging middleware

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::error::Result;
use super::handler::{Handler, Middleware};
use super::request::Request;
use super::response::Response;

/// Emits one `tracing` event per request with method, path, status and latency
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogging;

impl RequestLogging {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for RequestLogging {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let method = request.method.clone();
		let path = request.path().to_string();
		let remote = request.remote_addr;
		let started = Instant::now();

		let result = next.handle(request).await;
		let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

		match &result {
			Ok(response) => info!(
				%method,
				path = %path,
				status = response.status.as_u16(),
				elapsed_ms,
				remote = ?remote,
				"request"
			),
			Err(err) => warn!(%method, path = %path, %err, elapsed_ms, remote = ?remote, "request failed"),
		}

		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::http::handler::MiddlewareChain;
	use crate::http::error::HttpError;
	use hyper::StatusCode;

	struct Fixed(bool);

	#[async_trait]
	impl Handler for Fixed {
		async fn handle(&self, _request: Request) -> Result<Response> {
			if self.0 {
				Ok(Response::ok())
			} else {
				Err(HttpError::Internal("boom".to_string()))
			}
		}
	}

	#[tokio::test]
	async fn test_passes_result_through() {
		let ok = MiddlewareChain::new(Arc::new(Fixed(true))).with_middleware(Arc::new(RequestLogging::new()));
		let response = ok.handle(Request::builder().build()).await.unwrap();
		assert_eq!(response.status, StatusCode::OK);

		let failing =
			MiddlewareChain::new(Arc::new(Fixed(false))).with_middleware(Arc::new(RequestLogging::new()));
		assert!(failing.handle(Request::builder().build()).await.is_err());
	}
}
