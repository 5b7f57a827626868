use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use issue_tracker::conf::{BackendKind, Settings};
use issue_tracker::http::{ShutdownCoordinator, shutdown_signal};
use issue_tracker::service::IssueService;
use issue_tracker::{build_server, connect_backend, logging};

/// How long to wait for open connections after a shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "issue-tracker", version, about = "Issue tracking REST backend")]
struct Cli {
	/// TOML settings file
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Address to listen on (overrides settings)
	#[arg(short, long, value_name = "ADDR")]
	bind: Option<SocketAddr>,

	/// Document store: mongodb or memory (overrides settings)
	#[arg(long, value_name = "BACKEND")]
	backend: Option<BackendKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
	if let Some(bind) = cli.bind {
		settings.server.bind_address = bind;
	}
	if let Some(backend) = cli.backend {
		settings.database.backend = backend;
	}

	logging::init(&settings.logging).context("failed to initialise logging")?;
	info!(
		version = env!("CARGO_PKG_VERSION"),
		backend = %settings.database.backend,
		database = %settings.database.name,
		"starting issue tracker"
	);

	let backend = connect_backend(&settings.database)
		.await
		.context("failed to connect to the document store")?;
	if let Err(err) = backend.health_check().await {
		warn!(%err, "document store is not answering yet");
	}

	let service = IssueService::new(backend, settings.issue_options());
	service
		.ensure_indexes()
		.await
		.context("failed to create indexes")?;

	let listener = TcpListener::bind(settings.server.bind_address)
		.await
		.with_context(|| format!("failed to bind {}", settings.server.bind_address))?;

	let coordinator = ShutdownCoordinator::new(SHUTDOWN_TIMEOUT);
	let signal = coordinator.clone();
	tokio::spawn(async move {
		shutdown_signal().await;
		signal.shutdown_and_wait().await;
	});

	build_server(service)
		.listen_with_shutdown(listener, coordinator)
		.await
		.context("server error")?;

	info!("issue tracker stopped");
	Ok(())
}
