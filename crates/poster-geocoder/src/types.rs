// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// A free-text location plus a best-effort city/country split of it.
///
/// Providers receive `text` verbatim; the split is a hint for structured lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeQuery {
	pub text: String,
	pub city: String,
	/// Empty when the location has a single segment.
	pub country: String,
}

impl GeocodeQuery {
	/// Split `text` on commas: the first segment is the city, the last the country.
	pub fn from_location(text: &str) -> Self {
		let segments: Vec<&str> = text.split(',').map(str::trim).collect();
		let city = segments.first().copied().unwrap_or_default().to_string();
		let country = if segments.len() > 1 {
			segments.last().copied().unwrap_or_default().to_string()
		} else {
			String::new()
		};

		Self {
			text: text.to_string(),
			city,
			country,
		}
	}
}

/// The single best match a provider returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeMatch {
	pub latitude: f64,
	pub longitude: f64,
	pub display_name: String,
}
