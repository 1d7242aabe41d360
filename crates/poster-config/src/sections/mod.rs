// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod database;
mod geocoder;
mod logging;
mod paths;
mod renderer;
mod worker;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use geocoder::{GeocoderConfig, GeocoderConfigLayer, DEFAULT_GEOCODER_BASE_URL};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
pub use renderer::{RendererConfig, RendererConfigLayer};
pub use worker::{WorkerLoopConfig, WorkerLoopConfigLayer};
