// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;
use std::path::Path;

use crate::migrations::run_migrations;
use crate::pool::create_pool;

pub async fn create_test_pool() -> SqlitePool {
	let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

/// File-backed pool for tests that need real cross-connection locking.
pub async fn create_file_pool(path: &Path) -> SqlitePool {
	let pool = create_pool(&format!("sqlite:{}", path.display()))
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

pub async fn insert_theme(pool: &SqlitePool, id: &str, config_json: &str, active: bool) {
	sqlx::query(
		r#"
		INSERT INTO themes (id, name, description, config_json, active, sort_order)
		VALUES (?, ?, NULL, ?, ?, 0)
		"#,
	)
	.bind(id)
	.bind(id)
	.bind(config_json)
	.bind(active)
	.execute(pool)
	.await
	.unwrap();
}
