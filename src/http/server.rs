use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::handler::{Handler, Middleware, MiddlewareChain};
use super::request::Request;
use super::response::Response;
use super::shutdown::ShutdownCoordinator;

/// HTTP/1.1 server with middleware support
pub struct HttpServer {
	pub handler: Arc<dyn Handler>,
	middlewares: Vec<Arc<dyn Middleware>>,
}

impl HttpServer {
	/// Create a new server with the given handler
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			middlewares: Vec::new(),
		}
	}

	/// Add a middleware; middlewares run in the order they are added
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// Build the final handler with middleware chain
	fn build_handler(&self) -> Arc<dyn Handler> {
		if self.middlewares.is_empty() {
			return self.handler.clone();
		}

		let mut chain = MiddlewareChain::new(self.handler.clone());
		for middleware in &self.middlewares {
			chain.add_middleware(middleware.clone());
		}

		Arc::new(chain)
	}

	/// Accept connections until `coordinator` broadcasts shutdown
	///
	/// After the notice, idle connections close and busy ones finish the
	/// request in flight. Connections still open when the coordinator's
	/// timeout runs out are aborted.
	pub async fn listen_with_shutdown(
		self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> std::io::Result<()> {
		info!(addr = ?listener.local_addr().ok(), "server listening");
		let handler = self.build_handler();

		let mut shutdown_rx = coordinator.subscribe();
		let mut connections = JoinSet::new();

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, socket_addr) = result?;
					let handler = handler.clone();
					let conn_shutdown = coordinator.subscribe();

					connections.spawn(async move {
						if let Err(err) =
							Self::handle_connection(stream, socket_addr, handler, Some(conn_shutdown)).await
						{
							debug!(%socket_addr, %err, "error handling connection");
						}
					});
				}
				Some(_) = connections.join_next(), if !connections.is_empty() => {}
				_ = shutdown_rx.recv() => {
					info!("shutdown signal received, stopping server");
					break;
				}
			}
		}

		drop(listener);
		let open = connections.len();
		let drained = tokio::time::timeout(coordinator.timeout(), async {
			while connections.join_next().await.is_some() {}
		})
		.await;
		if drained.is_err() {
			warn!(remaining = connections.len(), "aborting connections still open at shutdown");
			connections.abort_all();
		} else {
			debug!(connections = open, "open connections drained");
		}

		coordinator.notify_shutdown_complete();

		Ok(())
	}

	/// Serve HTTP/1.1 on a single TCP connection
	pub async fn handle_connection(
		stream: TcpStream,
		socket_addr: SocketAddr,
		handler: Arc<dyn Handler>,
		shutdown: Option<broadcast::Receiver<()>>,
	) -> Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr: socket_addr,
		};

		let connection = http1::Builder::new().serve_connection(io, service);
		tokio::pin!(connection);

		let Some(mut shutdown) = shutdown else {
			return connection.await;
		};

		tokio::select! {
			result = connection.as_mut() => result,
			_ = shutdown.recv() => {
				connection.as_mut().graceful_shutdown();
				connection.await
			}
		}
	}
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = body.collect().await?.to_bytes();

			let mut request = Request::new(parts.method, parts.uri, parts.version, parts.headers, body);
			request.remote_addr = Some(remote_addr);

			let response = handler.handle(request).await.unwrap_or_else(|err| {
				if err.status().is_server_error() {
					error!(%err, "request handler failed");
				}
				Response::from(err)
			});

			let mut hyper_response = hyper::Response::new(Full::new(response.body));
			*hyper_response.status_mut() = response.status;
			*hyper_response.headers_mut() = response.headers;
			Ok(hyper_response)
		})
	}
}
