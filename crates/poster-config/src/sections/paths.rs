// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filesystem locations.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
	/// Root under which each job gets its own output directory.
	pub storage_dir: PathBuf,
	/// Directory of `<theme_id>.json` fallback theme files.
	pub themes_dir: PathBuf,
}

impl Default for PathsConfig {
	fn default() -> Self {
		Self {
			storage_dir: PathBuf::from("storage/renders"),
			themes_dir: PathBuf::from("themes"),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfigLayer {
	#[serde(default)]
	pub storage_dir: Option<PathBuf>,
	#[serde(default)]
	pub themes_dir: Option<PathBuf>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.storage_dir.is_some() {
			self.storage_dir = other.storage_dir;
		}
		if other.themes_dir.is_some() {
			self.themes_dir = other.themes_dir;
		}
	}

	pub fn finalize(self) -> PathsConfig {
		let defaults = PathsConfig::default();
		PathsConfig {
			storage_dir: self.storage_dir.unwrap_or(defaults.storage_dir),
			themes_dir: self.themes_dir.unwrap_or(defaults.themes_dir),
		}
	}
}
