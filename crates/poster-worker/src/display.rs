// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;

/// Poster heading text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayText {
	pub title: String,
	pub subtitle: String,
}

/// Fill in title and subtitle from the location when the job did not supply them.
///
/// A missing or empty title becomes the first comma-separated segment of the
/// location, upper-cased. A missing or empty subtitle becomes the last segment
/// when there is more than one, and stays empty otherwise.
pub fn derive_display_text(
	location: &str,
	title: Option<&str>,
	subtitle: Option<&str>,
) -> DisplayText {
	let segments: Vec<&str> = location.split(',').map(str::trim).collect();

	let title = match title.filter(|t| !t.is_empty()) {
		Some(title) => title.to_string(),
		None => segments.first().copied().unwrap_or_default().to_uppercase(),
	};

	let subtitle = match subtitle.filter(|s| !s.is_empty()) {
		Some(subtitle) => subtitle.to_string(),
		None if segments.len() > 1 => segments.last().copied().unwrap_or_default().to_string(),
		None => String::new(),
	};

	DisplayText { title, subtitle }
}
