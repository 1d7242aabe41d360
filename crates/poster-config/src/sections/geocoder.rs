// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Geocoding provider configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";

const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_user_agent() -> String {
	format!("poster-worker/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeocoderConfigLayer {
	pub base_url: Option<String>,
	pub user_agent: Option<String>,
	pub min_interval_ms: Option<u64>,
	pub timeout_secs: Option<u64>,
}

impl GeocoderConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.user_agent.is_some() {
			self.user_agent = other.user_agent;
		}
		if other.min_interval_ms.is_some() {
			self.min_interval_ms = other.min_interval_ms;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	pub fn finalize(self) -> GeocoderConfig {
		GeocoderConfig {
			base_url: self
				.base_url
				.unwrap_or_else(|| DEFAULT_GEOCODER_BASE_URL.to_string()),
			user_agent: self.user_agent.unwrap_or_else(default_user_agent),
			min_interval_ms: self.min_interval_ms.unwrap_or(DEFAULT_MIN_INTERVAL_MS),
			timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeocoderConfig {
	pub base_url: String,
	/// Nominatim's usage policy rejects requests without an identifying User-Agent.
	pub user_agent: String,
	pub min_interval_ms: u64,
	pub timeout_secs: u64,
}

impl GeocoderConfig {
	pub fn min_interval(&self) -> Duration {
		Duration::from_millis(self.min_interval_ms)
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

impl Default for GeocoderConfig {
	fn default() -> Self {
		GeocoderConfigLayer::default().finalize()
	}
}
