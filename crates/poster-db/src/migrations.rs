// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::SqlitePool;

use crate::error::Result;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_create_jobs",
		include_str!("../migrations/001_create_jobs.sql"),
	),
	(
		"002_create_geocode_cache",
		include_str!("../migrations/002_create_geocode_cache.sql"),
	),
	(
		"003_create_themes",
		include_str!("../migrations/003_create_themes.sql"),
	),
];

/// Apply the embedded schema. Every statement is idempotent, so this runs on each startup.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_migrations_are_idempotent() {
		let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<(String,)> = sqlx::query_as(
			"SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('jobs', 'geocode_cache', 'themes') ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();

		let names: Vec<String> = tables.into_iter().map(|(n,)| n).collect();
		assert_eq!(names, vec!["geocode_cache", "jobs", "themes"]);
	}
}
