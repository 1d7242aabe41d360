// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Database configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

/// Database configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> Result<DatabaseConfig, ConfigError> {
		let url = self.url.ok_or_else(|| ConfigError::Missing {
			key: "database.url".to_string(),
		})?;
		Ok(DatabaseConfig { url })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_url_is_error() {
		let result = DatabaseConfigLayer::default().finalize();
		assert!(matches!(result, Err(ConfigError::Missing { key }) if key == "database.url"));
	}

	#[test]
	fn test_custom_url() {
		let layer = DatabaseConfigLayer {
			url: Some("sqlite:/var/lib/poster/queue.db".to_string()),
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.url, "sqlite:/var/lib/poster/queue.db");
	}
}
