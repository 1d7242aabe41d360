// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Worker loop timing and circuit-breaker configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkerLoopConfigLayer {
	pub poll_interval_secs: Option<u64>,
	pub connect_retry_secs: Option<u64>,
	pub error_retry_secs: Option<u64>,
	pub max_consecutive_errors: Option<u32>,
	pub stale_job_timeout_secs: Option<u64>,
	pub geocode_cache_ttl_secs: Option<u64>,
}

impl WorkerLoopConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.poll_interval_secs.is_some() {
			self.poll_interval_secs = other.poll_interval_secs;
		}
		if other.connect_retry_secs.is_some() {
			self.connect_retry_secs = other.connect_retry_secs;
		}
		if other.error_retry_secs.is_some() {
			self.error_retry_secs = other.error_retry_secs;
		}
		if other.max_consecutive_errors.is_some() {
			self.max_consecutive_errors = other.max_consecutive_errors;
		}
		if other.stale_job_timeout_secs.is_some() {
			self.stale_job_timeout_secs = other.stale_job_timeout_secs;
		}
		if other.geocode_cache_ttl_secs.is_some() {
			self.geocode_cache_ttl_secs = other.geocode_cache_ttl_secs;
		}
	}

	pub fn finalize(self) -> WorkerLoopConfig {
		let defaults = WorkerLoopConfig::default();
		WorkerLoopConfig {
			poll_interval_secs: self.poll_interval_secs.unwrap_or(defaults.poll_interval_secs),
			connect_retry_secs: self.connect_retry_secs.unwrap_or(defaults.connect_retry_secs),
			error_retry_secs: self.error_retry_secs.unwrap_or(defaults.error_retry_secs),
			max_consecutive_errors: self
				.max_consecutive_errors
				.unwrap_or(defaults.max_consecutive_errors),
			stale_job_timeout_secs: self
				.stale_job_timeout_secs
				.unwrap_or(defaults.stale_job_timeout_secs),
			geocode_cache_ttl_secs: self
				.geocode_cache_ttl_secs
				.unwrap_or(defaults.geocode_cache_ttl_secs),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerLoopConfig {
	pub poll_interval_secs: u64,
	pub connect_retry_secs: u64,
	pub error_retry_secs: u64,
	pub max_consecutive_errors: u32,
	pub stale_job_timeout_secs: u64,
	pub geocode_cache_ttl_secs: u64,
}

impl Default for WorkerLoopConfig {
	fn default() -> Self {
		Self {
			poll_interval_secs: 2,
			connect_retry_secs: 10,
			error_retry_secs: 5,
			max_consecutive_errors: 5,
			stale_job_timeout_secs: 600, // 10 minutes
			geocode_cache_ttl_secs: 2_592_000, // 30 days
		}
	}
}

impl WorkerLoopConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}

	pub fn connect_retry(&self) -> Duration {
		Duration::from_secs(self.connect_retry_secs)
	}

	pub fn error_retry(&self) -> Duration {
		Duration::from_secs(self.error_retry_secs)
	}

	pub fn stale_job_timeout(&self) -> Duration {
		Duration::from_secs(self.stale_job_timeout_secs)
	}

	pub fn geocode_cache_ttl(&self) -> Duration {
		Duration::from_secs(self.geocode_cache_ttl_secs)
	}
}
