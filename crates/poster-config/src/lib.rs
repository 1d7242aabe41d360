// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the poster render worker.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`POSTER_WORKER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use poster_config::load_config;
//!
//! let config = load_config()?;
//! println!("polling every {:?}", config.worker.poll_interval());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WorkerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
	pub database: DatabaseConfig,
	pub renderer: RendererConfig,
	pub geocoder: GeocoderConfig,
	pub worker: WorkerLoopConfig,
	pub paths: PathsConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`POSTER_WORKER_*`)
/// 2. Config file (`/etc/poster-worker/worker.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WorkerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path in place of the system one.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<WorkerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<WorkerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WorkerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: WorkerConfigLayer) -> Result<WorkerConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize()?;
	let renderer = layer.renderer.unwrap_or_default().finalize()?;
	let geocoder = layer.geocoder.unwrap_or_default().finalize();
	let worker = layer.worker.unwrap_or_default().finalize();
	let paths = layer.paths.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_worker(&worker)?;

	info!(
		database = %database.url,
		renderer = %renderer.program.display(),
		geocoder = %geocoder.base_url,
		storage_dir = %paths.storage_dir.display(),
		poll_interval_secs = worker.poll_interval_secs,
		max_consecutive_errors = worker.max_consecutive_errors,
		"Worker configuration loaded"
	);

	Ok(WorkerConfig {
		database,
		renderer,
		geocoder,
		worker,
		paths,
		logging,
	})
}

/// Upper bound for durations added to or subtracted from the current time (100 years).
pub const MAX_TIMESTAMP_OFFSET_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Validate cross-field configuration rules.
fn validate_worker(worker: &WorkerLoopConfig) -> Result<(), ConfigError> {
	if worker.max_consecutive_errors == 0 {
		return Err(ConfigError::Validation(
			"worker.max_consecutive_errors must be at least 1".to_string(),
		));
	}
	if worker.poll_interval_secs == 0 {
		return Err(ConfigError::Validation(
			"worker.poll_interval_secs must be at least 1"
				.to_string(),
		));
	}

	for (key, value) in [
		("worker.stale_job_timeout_secs", worker.stale_job_timeout_secs),
		("worker.geocode_cache_ttl_secs", worker.geocode_cache_ttl_secs),
	] {
		if value > MAX_TIMESTAMP_OFFSET_SECS {
			return Err(ConfigError::Validation(format!(
				"{key} must be at most {MAX_TIMESTAMP_OFFSET_SECS}"
			)));
		}
	}

	Ok(())
}
