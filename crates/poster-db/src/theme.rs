// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::{DbError, Result};

/// Style parameters of a theme, as a JSON object (colors, widths, fonts...).
pub type ThemeConfig = serde_json::Map<String, serde_json::Value>;

#[derive(Clone)]
pub struct ThemeRepository {
	pool: SqlitePool,
}

impl ThemeRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Configuration of the active theme `theme_id`, or `None` if it is missing or inactive.
	#[tracing::instrument(skip(self))]
	pub async fn get_active_config(&self, theme_id: &str) -> Result<Option<ThemeConfig>> {
		let row = sqlx::query_as::<_, (String,)>(
			"SELECT config_json FROM themes WHERE id = ? AND active = 1",
		)
		.bind(theme_id)
		.fetch_optional(&self.pool)
		.await?;

		let Some((config_json,)) = row else {
			return Ok(None);
		};

		match serde_json::from_str::<serde_json::Value>(&config_json)? {
			serde_json::Value::Object(config) => Ok(Some(config)),
			_ => Err(DbError::Internal(format!(
				"theme {theme_id} config_json is not an object"
			))),
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_active(&self) -> Result<i64> {
		let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM themes WHERE active = 1")
			.fetch_one(&self.pool)
			.await?;

		Ok(row.0)
	}
}

#[async_trait]
pub trait ThemeStore: Send + Sync {
	async fn get_active_config(&self, theme_id: &str) -> Result<Option<ThemeConfig>>;
}

#[async_trait]
impl ThemeStore for ThemeRepository {
	async fn get_active_config(&self, theme_id: &str) -> Result<Option<ThemeConfig>> {
		self.get_active_config(theme_id).await
	}
}
