// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by each source, merged in precedence order.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, GeocoderConfigLayer, LoggingConfigLayer, PathsConfigLayer,
	RendererConfigLayer, WorkerLoopConfigLayer,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub renderer: Option<RendererConfigLayer>,
	#[serde(default)]
	pub geocoder: Option<GeocoderConfigLayer>,
	#[serde(default)]
	pub worker: Option<WorkerLoopConfigLayer>,
	#[serde(default)]
	pub paths: Option<PathsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl WorkerConfigLayer {
	/// Overlay `other` on top of `self`; values set in `other` win.
	pub fn merge(&mut self, other: WorkerConfigLayer) {
		if let Some(database) = other.database {
			self
				.database
				.get_or_insert_with(Default::default)
				.merge(database);
		}
		if let Some(renderer) = other.renderer {
			self
				.renderer
				.get_or_insert_with(Default::default)
				.merge(renderer);
		}
		if let Some(geocoder) = other.geocoder {
			self
				.geocoder
				.get_or_insert_with(Default::default)
				.merge(geocoder);
		}
		if let Some(worker) = other.worker {
			self.worker.get_or_insert_with(Default::default).merge(worker);
		}
		if let Some(paths) = other.paths {
			self.paths.get_or_insert_with(Default::default).merge(paths);
		}
		if let Some(logging) = other.logging {
			self
				.logging
				.get_or_insert_with(Default::default)
				.merge(logging);
		}
	}
}
