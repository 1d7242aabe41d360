// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External renderer command configuration.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
	pub program: PathBuf,
	pub args: Vec<String>,
	pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RendererConfigLayer {
	#[serde(default)]
	pub program: Option<PathBuf>,
	#[serde(default)]
	pub args: Option<Vec<String>>,
	#[serde(default)]
	pub working_dir: Option<PathBuf>,
}

impl RendererConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.program.is_some() {
			self.program = other.program;
		}
		if other.args.is_some() {
			self.args = other.args;
		}
		if other.working_dir.is_some() {
			self.working_dir = other.working_dir;
		}
	}

	pub fn finalize(self) -> Result<RendererConfig, ConfigError> {
		let program = self.program.ok_or_else(|| ConfigError::Missing {
			key: "renderer.program".to_string(),
		})?;

		Ok(RendererConfig {
			program,
			args: self.args.unwrap_or_default(),
			working_dir: self.working_dir,
		})
	}
}
