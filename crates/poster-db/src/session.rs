// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::geocode::{GeocodeCacheRepository, GeocodeCacheStore};
use crate::job::{JobRepository, JobStore};
use crate::pool::connect_options;
use crate::theme::{ThemeRepository, ThemeStore};

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// The stores one worker iteration operates on, all backed by the same connection.
pub struct StoreSession {
	pub jobs: Arc<dyn JobStore>,
	pub geocode_cache: Arc<dyn GeocodeCacheStore>,
	pub themes: Arc<dyn ThemeStore>,
	pool: Option<SqlitePool>,
}

impl StoreSession {
	pub fn new(
		jobs: Arc<dyn JobStore>,
		geocode_cache: Arc<dyn GeocodeCacheStore>,
		themes: Arc<dyn ThemeStore>,
	) -> Self {
		Self {
			jobs,
			geocode_cache,
			themes,
			pool: None,
		}
	}

	pub fn from_pool(pool: SqlitePool) -> Self {
		Self {
			jobs: Arc::new(JobRepository::new(pool.clone())),
			geocode_cache: Arc::new(GeocodeCacheRepository::new(pool.clone())),
			themes: Arc::new(ThemeRepository::new(pool.clone())),
			pool: Some(pool),
		}
	}

	/// Release the underlying connection, if this session owns one.
	pub async fn close(self) {
		if let Some(pool) = self.pool {
			pool.close().await;
		}
	}
}

/// Opens a fresh [`StoreSession`] on demand.
#[async_trait]
pub trait StoreConnector: Send + Sync {
	async fn connect(&self) -> Result<StoreSession>;
}

/// Connects to an existing SQLite database with a single-connection pool.
///
/// A missing database file is a connection failure; the file is created only by
/// the startup path through [`crate::create_pool`].
#[derive(Debug, Clone)]
pub struct SqliteConnector {
	options: SqliteConnectOptions,
	acquire_timeout: Duration,
}

impl SqliteConnector {
	pub fn new(database_url: &str) -> Result<Self> {
		Ok(Self {
			options: connect_options(database_url)?,
			acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
		})
	}

	pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
		self.acquire_timeout = timeout;
		self
	}
}

#[async_trait]
impl StoreConnector for SqliteConnector {
	#[tracing::instrument(skip(self))]
	async fn connect(&self) -> Result<StoreSession> {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.acquire_timeout(self.acquire_timeout)
			.connect_with(self.options.clone())
			.await?;

		Ok(StoreSession::from_pool(pool))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::DbError;
	use crate::job::NewJob;
	use crate::testing::create_file_pool;

	#[tokio::test]
	async fn test_connect_to_missing_file_fails() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.db");
		let connector = SqliteConnector::new(&format!("sqlite:{}", path.display())).unwrap();

		let result = connector.connect().await;
		assert!(matches!(result, Err(DbError::Sqlx(_))));
		assert!(!path.exists());
	}

	#[tokio::test]
	async fn test_session_sees_existing_jobs() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("queue.db");
		let url = format!("sqlite:{}", path.display());

		let setup = create_file_pool(&path).await;
		let job_id = JobRepository::new(setup.clone())
			.enqueue(&NewJob {
				location: "Lisbon, Portugal".to_string(),
				theme: "noir".to_string(),
				distance: 8000,
				title: None,
				subtitle: None,
			})
			.await
			.unwrap();

		let session = SqliteConnector::new(&url).unwrap().connect().await.unwrap();
		let claimed = session.jobs.claim_next().await.unwrap().unwrap();
		assert_eq!(claimed.id, job_id);
		session.close().await;
		setup.close().await;
	}
}
