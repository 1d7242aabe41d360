// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for geocoding providers.

use thiserror::Error;

/// Errors that can occur when querying a geocoding provider.
///
/// A query that simply matches nothing is not an error; providers return `Ok(None)`.
#[derive(Debug, Error)]
pub enum GeocodeError {
	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// The provider throttled us.
	#[error("Rate limit exceeded")]
	RateLimited,

	/// Invalid or unparseable response from the provider.
	#[error("Invalid response from geocoder: {0}")]
	InvalidResponse(String),

	/// The provider returned an error status.
	#[error("Geocoder API error: {status} - {message}")]
	ApiError { status: u16, message: String },
}
