// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage layer for the poster render worker.
//!
//! This crate owns the SQLite schema and the three tables the worker touches:
//! the render job queue, the geocode cache and the theme catalogue. Each table
//! has a concrete sqlx repository plus an object-safe store trait so the worker
//! core can be exercised against fakes.

pub mod error;
pub mod geocode;
pub mod job;
pub mod migrations;
pub mod pool;
pub mod session;
pub mod testing;
pub mod theme;
mod time;

pub use error::{DbError, Result};
pub use geocode::{GeocodeCacheEntry, GeocodeCacheRepository, GeocodeCacheStore};
pub use job::{
	truncate_error_message, JobId, JobRepository, JobStatus, JobStore, NewJob, RenderJob,
	MAX_ERROR_MESSAGE_LEN,
};
pub use migrations::run_migrations;
pub use pool::{connect_options, create_pool};
pub use session::{SqliteConnector, StoreConnector, StoreSession};
pub use theme::{ThemeConfig, ThemeRepository, ThemeStore};
