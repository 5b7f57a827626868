//! HTTP binding
//!
//! A thin hyper 1 server: requests are read fully into a [`Request`], run
//! through the middleware chain and the [`Router`], and written back from a
//! [`Response`].

pub mod error;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod views;

pub use error::HttpError;
pub use handler::{Handler, Middleware, MiddlewareChain};
pub use middleware::RequestLogging;
pub use request::Request;
pub use response::Response;
pub use router::{Route, Router};
pub use server::HttpServer;
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
pub use views::IssueViews;
