//! # Issue tracker
//!
//! A small REST backend for filing, querying, updating and deleting issues
//! grouped by project, persisted in a document store.
//!
//! ## Layers
//!
//! - [`nosql`]: the document store seam ([`DocumentBackend`]) with MongoDB
//!   and in-memory implementations
//! - [`models`]: the persisted `Project` and `Issue` records
//! - [`repository`]: typed access to the two collections
//! - [`service`]: the issue contract, independent of transport
//! - [`http`]: hyper server, routing and views
//! - [`conf`] and [`logging`]: settings and tracing setup
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use issue_tracker::nosql::backends::InMemoryBackend;
//! use issue_tracker::service::{IssueService, IssueServiceOptions};
//! use issue_tracker::http::ShutdownCoordinator;
//! use std::time::Duration;
//!
//! # async fn example() -> std::io::Result<()> {
//! let service = IssueService::new(Arc::new(InMemoryBackend::new()), IssueServiceOptions::default());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! issue_tracker::build_server(service)
//!     .listen_with_shutdown(listener, coordinator)
//!     .await
//! # }
//! ```

pub mod conf;
pub mod http;
pub mod logging;
pub mod models;
pub mod nosql;
pub mod repository;
pub mod service;

use std::sync::Arc;

use crate::conf::{BackendKind, DatabaseSettings};
use crate::http::{HttpServer, RequestLogging, Router};
use crate::nosql::DocumentBackend;
use crate::nosql::backends::InMemoryBackend;
use crate::service::IssueService;

/// The HTTP server for `service`, with request logging installed
pub fn build_server(service: IssueService) -> HttpServer {
	HttpServer::new(Arc::new(Router::new(service))).with_middleware(Arc::new(RequestLogging::new()))
}

/// Open the document store selected by `settings`
pub async fn connect_backend(settings: &DatabaseSettings) -> nosql::Result<Arc<dyn DocumentBackend>> {
	match settings.backend {
		BackendKind::Memory => Ok(Arc::new(InMemoryBackend::new())),
		BackendKind::MongoDB => connect_mongodb(settings).await,
	}
}

#[cfg(feature = "mongodb")]
async fn connect_mongodb(settings: &DatabaseSettings) -> nosql::Result<Arc<dyn DocumentBackend>> {
	use crate::nosql::backends::MongoDBBackend;

	let mut builder = MongoDBBackend::builder()
		.url(&settings.url)
		.database(&settings.name);
	if let Some(size) = settings.max_pool_size {
		builder = builder.max_pool_size(size);
	}
	if let Some(size) = settings.min_pool_size {
		builder = builder.min_pool_size(size);
	}
	if let Some(secs) = settings.max_idle_time_secs {
		builder = builder.max_idle_time_secs(secs);
	}
	Ok(Arc::new(builder.build().await?))
}

#[cfg(not(feature = "mongodb"))]
async fn connect_mongodb(_settings: &DatabaseSettings) -> nosql::Result<Arc<dyn DocumentBackend>> {
	Err(nosql::NoSQLError::ConfigError(
		"built without the `mongodb` feature; use the memory backend".to_string(),
	))
}
