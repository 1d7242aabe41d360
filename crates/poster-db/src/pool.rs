// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

use crate::error::DbError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Parse a SQLite URL into connect options with WAL mode and a busy timeout.
///
/// The returned options never create a missing database file; use
/// [`create_pool`] for the startup path that is allowed to create it.
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid.
pub fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(BUSY_TIMEOUT);

	Ok(options)
}

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./poster.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = connect_options(database_url)?.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_url_is_internal_error() {
		let result = connect_options("sqlite:poster.db?unknown_option=1");
		assert!(matches!(result, Err(DbError::Internal(_))));
	}

	#[tokio::test]
	async fn test_create_pool_creates_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("fresh.db");
		let pool = create_pool(&format!("sqlite:{}", path.display()))
			.await
			.unwrap();

		assert!(path.exists());
		pool.close().await;
	}
}
