// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::WorkerConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, GeocoderConfigLayer, LoggingConfigLayer, PathsConfigLayer,
	RendererConfigLayer, WorkerLoopConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/poster-worker/worker.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<WorkerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<WorkerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(WorkerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WorkerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(WorkerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: WorkerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: POSTER_WORKER_<FIELD>, with the section name included where the
/// field alone would be ambiguous.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WorkerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(WorkerConfigLayer {
			database: Some(load_database_from_env()),
			renderer: Some(load_renderer_from_env()),
			geocoder: Some(load_geocoder_from_env()?),
			worker: Some(load_worker_from_env()?),
			paths: Some(load_paths_from_env()),
			logging: Some(load_logging_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u32 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Whitespace-separated argument list; arguments containing spaces belong in the TOML file.
fn env_args(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| s.split_whitespace().map(str::to_string).collect())
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("POSTER_WORKER_DATABASE_URL"),
	}
}

fn load_renderer_from_env() -> RendererConfigLayer {
	RendererConfigLayer {
		program: env_var("POSTER_WORKER_RENDERER_PROGRAM").map(PathBuf::from),
		args: env_args("POSTER_WORKER_RENDERER_ARGS"),
		working_dir: env_var("POSTER_WORKER_RENDERER_WORKING_DIR").map(PathBuf::from),
	}
}

fn load_geocoder_from_env() -> Result<GeocoderConfigLayer, ConfigError> {
	Ok(GeocoderConfigLayer {
		base_url: env_var("POSTER_WORKER_GEOCODER_BASE_URL"),
		user_agent: env_var("POSTER_WORKER_GEOCODER_USER_AGENT"),
		min_interval_ms: env_u64("POSTER_WORKER_GEOCODER_MIN_INTERVAL_MS")?,
		timeout_secs: env_u64("POSTER_WORKER_GEOCODER_TIMEOUT_SECS")?,
	})
}

fn load_worker_from_env() -> Result<WorkerLoopConfigLayer, ConfigError> {
	Ok(WorkerLoopConfigLayer {
		poll_interval_secs: env_u64("POSTER_WORKER_POLL_INTERVAL_SECS")?,
		connect_retry_secs: env_u64("POSTER_WORKER_CONNECT_RETRY_SECS")?,
		error_retry_secs: env_u64("POSTER_WORKER_ERROR_RETRY_SECS")?,
		max_consecutive_errors: env_u32("POSTER_WORKER_MAX_CONSECUTIVE_ERRORS")?,
		stale_job_timeout_secs: env_u64("POSTER_WORKER_STALE_JOB_TIMEOUT_SECS")?,
		geocode_cache_ttl_secs: env_u64("POSTER_WORKER_GEOCODE_CACHE_TTL_SECS")?,
	})
}

fn load_paths_from_env() -> PathsConfigLayer {
	PathsConfigLayer {
		storage_dir: env_var("POSTER_WORKER_STORAGE_DIR").map(PathBuf::from),
		themes_dir: env_var("POSTER_WORKER_THEMES_DIR").map(PathBuf::from),
	}
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("POSTER_WORKER_LOG_LEVEL"),
	}
}
