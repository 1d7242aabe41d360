// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use poster_db::DbError;
use poster_geocoder::GeocodeError;
use thiserror::Error;

/// Infrastructure failures. At startup they abort the process; inside the loop
/// they escape the job being processed and feed the backoff and circuit breaker.
#[derive(Debug, Error)]
pub enum WorkerError {
	#[error("store error: {0}")]
	Store(#[from] DbError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("geocoder setup failed: {0}")]
	Geocoder(#[from] GeocodeError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
