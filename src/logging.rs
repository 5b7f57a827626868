//! Tracing subscriber setup

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::{LogFormat, LoggingSettings};

/// Build the level filter; `RUST_LOG` wins over the configured level
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
	EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&settings.level))
		.unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// Fails if a global subscriber is already set.
pub fn init(settings: &LoggingSettings) -> Result<(), TryInitError> {
	let filter = env_filter(settings);
	match settings.format {
		LogFormat::Json => tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer().json())
			.try_init(),
		LogFormat::Plain => tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer())
			.try_init(),
	}
}
