// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::time::format_timestamp;

/// A memoized geocoding result keyed by the normalized query hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCacheEntry {
	pub query_hash: String,
	pub query: String,
	pub latitude: f64,
	pub longitude: f64,
	pub display_name: String,
	pub expires_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct GeocodeCacheRow {
	query_hash: String,
	query: String,
	latitude: f64,
	longitude: f64,
	display_name: String,
	expires_at: DateTime<Utc>,
}

impl From<GeocodeCacheRow> for GeocodeCacheEntry {
	fn from(row: GeocodeCacheRow) -> Self {
		Self {
			query_hash: row.query_hash,
			query: row.query,
			latitude: row.latitude,
			longitude: row.longitude,
			display_name: row.display_name,
			expires_at: row.expires_at,
		}
	}
}

#[derive(Clone)]
pub struct GeocodeCacheRepository {
	pool: SqlitePool,
}

impl GeocodeCacheRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch the entry for `query_hash` if it expires strictly after `now`.
	///
	/// Expired rows are not deleted here; they stay until the next upsert for the same key.
	#[tracing::instrument(skip(self))]
	pub async fn get_unexpired(
		&self,
		query_hash: &str,
		now: DateTime<Utc>,
	) -> Result<Option<GeocodeCacheEntry>> {
		let row = sqlx::query_as::<_, GeocodeCacheRow>(
			r#"
            SELECT query_hash, query, latitude, longitude, display_name, expires_at
            FROM geocode_cache
            WHERE query_hash = ? AND expires_at > ?
            "#,
		)
		.bind(query_hash)
		.bind(format_timestamp(now))
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(GeocodeCacheEntry::from))
	}

	/// Insert or overwrite the entry for `entry.query_hash`. Concurrent writers resolve last-write-wins.
	#[tracing::instrument(skip(self, entry), fields(query_hash = %entry.query_hash))]
	pub async fn upsert(&self, entry: &GeocodeCacheEntry) -> Result<()> {
		sqlx::query(
			r#"
            INSERT INTO geocode_cache (query_hash, query, latitude, longitude, display_name, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(query_hash) DO UPDATE SET
                query = excluded.query,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                display_name = excluded.display_name,
                expires_at = excluded.expires_at
            "#,
		)
		.bind(&entry.query_hash)
		.bind(&entry.query)
		.bind(entry.latitude)
		.bind(entry.longitude)
		.bind(&entry.display_name)
		.bind(format_timestamp(entry.expires_at))
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}

#[async_trait]
pub trait GeocodeCacheStore: Send + Sync {
	async fn get_unexpired(
		&self,
		query_hash: &str,
		now: DateTime<Utc>,
	) -> Result<Option<GeocodeCacheEntry>>;
	async fn upsert(&self, entry: &GeocodeCacheEntry) -> Result<()>;
}

#[async_trait]
impl GeocodeCacheStore for GeocodeCacheRepository {
	async fn get_unexpired(
		&self,
		query_hash: &str,
		now: DateTime<Utc>,
	) -> Result<Option<GeocodeCacheEntry>> {
		self.get_unexpired(query_hash, now).await
	}

	async fn upsert(&self, entry: &GeocodeCacheEntry) -> Result<()> {
		self.upsert(entry).await
	}
}
