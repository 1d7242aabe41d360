// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable geocode memoization with a fixed time-to-live.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use poster_db::{DbError, GeocodeCacheEntry, GeocodeCacheStore};
use poster_geocoder::GeocodeMatch;
use sha2::{Digest, Sha256};

pub const DEFAULT_GEOCODE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Cache key for a location query: hex SHA-256 of the lowercased text.
///
/// Only case is folded; surrounding whitespace is significant.
pub fn normalization_key(query: &str) -> String {
	hex::encode(Sha256::digest(query.to_lowercase().as_bytes()))
}

/// Read-through view over a [`GeocodeCacheStore`]. Performs no network I/O.
pub struct GeocodeCache {
	store: Arc<dyn GeocodeCacheStore>,
	ttl: Duration,
}

impl GeocodeCache {
	pub fn new(store: Arc<dyn GeocodeCacheStore>, ttl: Duration) -> Self {
		Self { store, ttl }
	}

	#[tracing::instrument(skip(self))]
	pub async fn lookup(&self, query: &str) -> Result<Option<GeocodeMatch>, DbError> {
		let entry = self
			.store
			.get_unexpired(&normalization_key(query), Utc::now())
			.await?;

		Ok(entry.map(|entry| GeocodeMatch {
			latitude: entry.latitude,
			longitude: entry.longitude,
			display_name: entry.display_name,
		}))
	}

	/// Upsert `found` for `query`, expiring `ttl` from now.
	#[tracing::instrument(skip(self, found))]
	pub async fn store(&self, query: &str, found: &GeocodeMatch) -> Result<(), DbError> {
		let ttl = chrono::Duration::from_std(self.ttl)
			.map_err(|e| DbError::Internal(format!("invalid geocode cache ttl: {e}")))?;

		let entry = GeocodeCacheEntry {
			query_hash: normalization_key(query),
			query: query.to_string(),
			latitude: found.latitude,
			longitude: found.longitude,
			display_name: found.display_name.clone(),
			expires_at: Utc::now()
				.checked_add_signed(ttl)
				.ok_or_else(|| DbError::Internal("geocode cache ttl out of range".to_string()))?,
		};
		self.store.upsert(&entry).await
	}
}
