//! Graceful shutdown
//!
//! [`ShutdownCoordinator`] broadcasts a single shutdown notice to the accept
//! loop and to every open connection, then lets the caller wait (bounded by
//! a timeout) for the server to report that it has stopped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast};
use tracing::{info, warn};

/// Coordinates shutdown between the signal source and the server
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
	timeout: Duration,
	sender: broadcast::Sender<()>,
	complete: Arc<Notify>,
}

impl ShutdownCoordinator {
	/// Create a coordinator that waits at most `timeout` for the server to stop
	pub fn new(timeout: Duration) -> Self {
		let (sender, _) = broadcast::channel(1);
		Self {
			timeout,
			sender,
			complete: Arc::new(Notify::new()),
		}
	}

	/// How long shutdown may take before open connections are aborted
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Receive the shutdown notice
	pub fn subscribe(&self) -> broadcast::Receiver<()> {
		self.sender.subscribe()
	}

	/// Broadcast the shutdown notice
	pub fn shutdown(&self) {
		// No receivers means nothing is running, which is fine.
		let _ = self.sender.send(());
	}

	/// Called by the server once it has stopped accepting connections
	pub fn notify_shutdown_complete(&self) {
		self.complete.notify_one();
	}

	/// Broadcast the notice and wait for the server to stop
	///
	/// Returns `false` if the server did not stop within the timeout.
	pub async fn shutdown_and_wait(&self) -> bool {
		self.shutdown();
		match tokio::time::timeout(self.timeout, self.complete.notified()).await {
			Ok(()) => true,
			Err(_) => {
				warn!(timeout = ?self.timeout, "server did not stop in time");
				false
			}
		}
	}
}

/// Resolve once the process receives Ctrl-C or (on Unix) SIGTERM
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(err) = tokio::signal::ctrl_c().await {
			warn!(%err, "failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(err) => {
				warn!(%err, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => info!("received Ctrl-C"),
		_ = terminate => info!("received SIGTERM"),
	}
}
