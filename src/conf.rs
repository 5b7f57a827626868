//! Settings
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `ISSUE_TRACKER_`-prefixed environment variables. Command-line flags are
//! applied last by the binary.
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0:3000"
//!
//! [database]
//! backend = "mongodb"
//! url = "mongodb://localhost:27017"
//! name = "issue_tracker"
//!
//! [logging]
//! level = "info"
//! format = "plain"
//!
//! [issues]
//! reopen_on_update = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::service::IssueServiceOptions;

/// Prefix for every environment variable read by [`Settings::apply_env`]
pub const ENV_PREFIX: &str = "ISSUE_TRACKER_";

/// Unprefixed connection-string variable honoured when the prefixed one is unset
pub const FALLBACK_MONGODB_URI: &str = "MONGODB_URI";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {message}")]
	Parse { path: PathBuf, message: String },

	#[error("invalid value {value:?} for {key}: {reason}")]
	InvalidValue {
		key: String,
		value: String,
		reason: String,
	},
}

impl ConfigError {
	fn invalid(key: &str, value: &str, reason: impl fmt::Display) -> Self {
		ConfigError::InvalidValue {
			key: key.to_string(),
			value: value.to_string(),
			reason: reason.to_string(),
		}
	}
}

/// Which document store to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
	#[default]
	#[serde(rename = "mongodb", alias = "mongo")]
	MongoDB,
	Memory,
}

impl FromStr for BackendKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"mongodb" | "mongo" => Ok(BackendKind::MongoDB),
			"memory" | "in-memory" => Ok(BackendKind::Memory),
			other => Err(format!("unknown backend {:?} (expected mongodb or memory)", other)),
		}
	}
}

impl fmt::Display for BackendKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BackendKind::MongoDB => write!(f, "mongodb"),
			BackendKind::Memory => write!(f, "memory"),
		}
	}
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Plain,
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"plain" | "text" => Ok(LogFormat::Plain),
			"json" => Ok(LogFormat::Json),
			other => Err(format!("unknown log format {:?} (expected plain or json)", other)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
	pub bind_address: SocketAddr,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	pub backend: BackendKind,
	pub url: String,
	pub name: String,
	pub max_pool_size: Option<u32>,
	pub min_pool_size: Option<u32>,
	pub max_idle_time_secs: Option<u64>,
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			backend: BackendKind::MongoDB,
			url: "mongodb://localhost:27017".to_string(),
			name: "issue_tracker".to_string(),
			max_pool_size: None,
			min_pool_size: None,
			max_idle_time_secs: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// `tracing` filter directive, e.g. `info` or `issue_tracker=debug,info`
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Plain,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueSettings {
	/// Reopen an issue on every update that does not say otherwise
	pub reopen_on_update: bool,
}

impl Default for IssueSettings {
	fn default() -> Self {
		Self {
			reopen_on_update: IssueServiceOptions::default().reopen_on_update,
		}
	}
}

impl From<&IssueSettings> for IssueServiceOptions {
	fn from(settings: &IssueSettings) -> Self {
		IssueServiceOptions {
			reopen_on_update: settings.reopen_on_update,
		}
	}
}

/// All runtime settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub database: DatabaseSettings,
	pub logging: LoggingSettings,
	pub issues: IssueSettings,
}

impl Settings {
	/// Defaults, then `path` if given, then the process environment
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut settings = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		settings.apply_env(&Env::process().with_prefix(ENV_PREFIX))?;
		Ok(settings)
	}

	/// Read settings from a TOML file; missing keys keep their defaults
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml(&contents).map_err(|err| match err {
			ConfigError::Parse { message, .. } => ConfigError::Parse {
				path: path.to_path_buf(),
				message,
			},
			other => other,
		})
	}

	pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
		toml::from_str(contents).map_err(|err| ConfigError::Parse {
			path: PathBuf::new(),
			message: err.to_string(),
		})
	}

	/// Override fields from environment variables
	pub fn apply_env(&mut self, env: &Env) -> Result<(), ConfigError> {
		if let Some(addr) = env.parse::<SocketAddr>("BIND_ADDRESS")? {
			self.server.bind_address = addr;
		}

		if let Some(backend) = env.parse::<BackendKind>("BACKEND")? {
			self.database.backend = backend;
		}
		if let Some(url) = env.str("MONGODB_URI").or_else(|| env.raw(FALLBACK_MONGODB_URI)) {
			self.database.url = url;
		}
		if let Some(name) = env.str("DATABASE") {
			self.database.name = name;
		}
		if let Some(size) = env.parse::<u32>("MAX_POOL_SIZE")? {
			self.database.max_pool_size = Some(size);
		}
		if let Some(size) = env.parse::<u32>("MIN_POOL_SIZE")? {
			self.database.min_pool_size = Some(size);
		}

		if let Some(level) = env.str("LOG_LEVEL") {
			self.logging.level = level;
		}
		if let Some(format) = env.parse::<LogFormat>("LOG_FORMAT")? {
			self.logging.format = format;
		}

		if let Some(reopen) = env.bool("REOPEN_ON_UPDATE")? {
			self.issues.reopen_on_update = reopen;
		}

		Ok(())
	}

	pub fn issue_options(&self) -> IssueServiceOptions {
		IssueServiceOptions::from(&self.issues)
	}
}

/// Where [`Env`] reads variables from
#[derive(Debug, Clone)]
enum Source {
	Process,
	Map(HashMap<String, String>),
}

/// Environment variable reader with prefix support
#[derive(Debug, Clone)]
pub struct Env {
	/// Prefix prepended to every key (e.g. `ISSUE_TRACKER_`)
	pub prefix: Option<String>,
	source: Source,
}

impl Env {
	/// Read from the process environment
	pub fn process() -> Self {
		Self {
			prefix: None,
			source: Source::Process,
		}
	}

	/// Read from a fixed map instead of the process environment
	pub fn from_map<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			prefix: None,
			source: Source::Map(
				vars.into_iter()
					.map(|(key, value)| (key.into(), value.into()))
					.collect(),
			),
		}
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	fn key_name(&self, key: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{}{}", prefix, key),
			None => key.to_string(),
		}
	}

	/// Value of `key` without the prefix applied; empty values count as unset
	pub fn raw(&self, key: &str) -> Option<String> {
		let value = match &self.source {
			Source::Process => std::env::var(key).ok(),
			Source::Map(vars) => vars.get(key).cloned(),
		};
		value.filter(|value| !value.is_empty())
	}

	/// Value of the prefixed `key`
	pub fn str(&self, key: &str) -> Option<String> {
		self.raw(&self.key_name(key))
	}

	/// Parse the prefixed `key` with [`FromStr`]
	pub fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: fmt::Display,
	{
		let full_key = self.key_name(key);
		self.raw(&full_key)
			.map(|value| {
				value
					.trim()
					.parse()
					.map_err(|err| ConfigError::invalid(&full_key, &value, err))
			})
			.transpose()
	}

	/// Read the prefixed `key` as a boolean (`true/false`, `1/0`, `yes/no`, `on/off`)
	pub fn bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
		let full_key = self.key_name(key);
		self.raw(&full_key)
			.map(|value| {
				parse_bool(&value).ok_or_else(|| {
					ConfigError::invalid(&full_key, &value, "expected a boolean")
				})
			})
			.transpose()
	}
}

/// Parse the usual spellings of a boolean
pub fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Some(true),
		"false" | "0" | "no" | "off" => Some(false),
		_ => None,
	}
}
