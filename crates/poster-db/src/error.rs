// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Failures of the poster job queue, geocode cache and theme catalogue.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	/// No job with the given id.
	#[error("Job not found: {0}")]
	NotFound(String),

	/// The job exists but is not `running`: already finished, or reclaimed to the queue.
	#[error("Job not running: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	/// A stored JSON column (theme `config_json`) could not be decoded.
	#[error("Stored JSON is invalid: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
