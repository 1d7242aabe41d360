// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Geocoding for the poster render worker.
//!
//! This crate provides a [`Geocoder`] trait, a Nominatim HTTP client
//! implementing it, and a [`PacedGeocoder`] decorator that keeps calls to
//! any provider at least a fixed interval apart.

pub mod client;
pub mod error;
pub mod pacing;
pub mod types;

pub use client::NominatimClient;
pub use error::GeocodeError;
pub use pacing::PacedGeocoder;
pub use types::{GeocodeMatch, GeocodeQuery};

use async_trait::async_trait;

/// Resolves a free-text location to its single best match.
#[async_trait]
pub trait Geocoder: Send + Sync {
	/// Returns `Ok(None)` when the provider has no match for the query.
	async fn geocode(&self, query: &GeocodeQuery) -> Result<Option<GeocodeMatch>, GeocodeError>;
}
