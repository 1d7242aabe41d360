// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Theme resolution as an ordered list of sources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use poster_db::{DbError, ThemeConfig, ThemeStore};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ThemeError {
	#[error("theme not found: {0}")]
	NotFound(String),

	#[error("theme store error: {0}")]
	Store(#[from] DbError),

	#[error("failed to read theme file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid theme file {path}: {message}")]
	Parse { path: PathBuf, message: String },
}

/// A resolved theme, passed to the renderer as part of the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
	pub id: String,
	pub config: ThemeConfig,
}

#[async_trait]
pub trait ThemeSource: Send + Sync {
	fn name(&self) -> &'static str;
	async fn load(&self, theme_id: &str) -> Result<Option<ThemeConfig>, ThemeError>;
}

/// Active themes in the durable store.
pub struct StoreThemeSource {
	store: Arc<dyn ThemeStore>,
}

impl StoreThemeSource {
	pub fn new(store: Arc<dyn ThemeStore>) -> Self {
		Self { store }
	}
}

#[async_trait]
impl ThemeSource for StoreThemeSource {
	fn name(&self) -> &'static str {
		"store"
	}

	async fn load(&self, theme_id: &str) -> Result<Option<ThemeConfig>, ThemeError> {
		Ok(self.store.get_active_config(theme_id).await?)
	}
}

/// `<dir>/<theme_id>.json` files.
pub struct FileThemeSource {
	dir: PathBuf,
}

impl FileThemeSource {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	fn path_for(&self, theme_id: &str) -> Option<PathBuf> {
		if !is_plain_file_stem(theme_id) {
			return None;
		}
		Some(self.dir.join(format!("{theme_id}.json")))
	}
}

fn is_plain_file_stem(theme_id: &str) -> bool {
	!theme_id.is_empty()
		&& !theme_id.contains(['/', '\\'])
		&& !theme_id.contains("..")
		&& !Path::new(theme_id).is_absolute()
}

#[async_trait]
impl ThemeSource for FileThemeSource {
	fn name(&self) -> &'static str {
		"file"
	}

	async fn load(&self, theme_id: &str) -> Result<Option<ThemeConfig>, ThemeError> {
		let Some(path) = self.path_for(theme_id) else {
			warn!(theme_id, "theme id is not a plain file name, skipping file lookup");
			return Ok(None);
		};

		let content = match tokio::fs::read_to_string(&path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(source) => return Err(ThemeError::Io { path, source }),
		};

		match serde_json::from_str::<serde_json::Value>(&content) {
			Ok(serde_json::Value::Object(config)) => Ok(Some(config)),
			Ok(_) => Err(ThemeError::Parse {
				path,
				message: "expected a JSON object".to_string(),
			}),
			Err(e) => Err(ThemeError::Parse {
				path,
				message: e.to_string(),
			}),
		}
	}
}

/// Tries each source in order; the first that knows the theme wins.
pub struct ThemeResolver {
	sources: Vec<Box<dyn ThemeSource>>,
}

impl ThemeResolver {
	pub fn new(sources: Vec<Box<dyn ThemeSource>>) -> Self {
		Self { sources }
	}

	/// Store first, then the themes directory.
	pub fn standard(store: Arc<dyn ThemeStore>, themes_dir: impl Into<PathBuf>) -> Self {
		Self::new(vec![
			Box::new(StoreThemeSource::new(store)),
			Box::new(FileThemeSource::new(themes_dir)),
		])
	}

	#[tracing::instrument(skip(self))]
	pub async fn resolve(&self, theme_id: &str) -> Result<Theme, ThemeError> {
		for source in &self.sources {
			if let Some(config) = source.load(theme_id).await? {
				debug!(source = source.name(), "theme resolved");
				return Ok(Theme {
					id: theme_id.to_string(),
					config,
				});
			}
		}

		Err(ThemeError::NotFound(theme_id.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use poster_db::testing::{create_test_pool, insert_theme};
	use poster_db::ThemeRepository;

	async fn store_with(themes: &[(&str, &str, bool)]) -> Arc<dyn ThemeStore> {
		let pool = create_test_pool().await;
		for (id, config, active) in themes {
			insert_theme(&pool, id, config, *active).await;
		}
		Arc::new(ThemeRepository::new(pool))
	}

	fn write_theme(dir: &Path, id: &str, content: &str) {
		std::fs::write(dir.join(format!("{id}.json")), content).unwrap();
	}

	#[tokio::test]
	async fn test_store_wins_over_file() {
		let dir = tempfile::tempdir().unwrap();
		write_theme(dir.path(), "noir", r##"{"bg": "#111111"}"##);
		let store = store_with(&[("noir", r##"{"bg": "#000000"}"##, true)]).await;

		let theme = ThemeResolver::standard(store, dir.path())
			.resolve("noir")
			.await
			.unwrap();
		assert_eq!(theme.config["bg"], "#000000");
	}

	#[tokio::test]
	async fn test_inactive_store_theme_falls_back_to_file() {
		let dir = tempfile::tempdir().unwrap();
		write_theme(dir.path(), "noir", r##"{"bg": "#111111"}"##);
		let store = store_with(&[("noir", r##"{"bg": "#000000"}"##, false)]).await;

		let theme = ThemeResolver::standard(store, dir.path())
			.resolve("noir")
			.await
			.unwrap();
		assert_eq!(theme.id, "noir");
		assert_eq!(theme.config["bg"], "#111111");
	}

	#[tokio::test]
	async fn test_unknown_theme_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let store = store_with(&[]).await;

		let result = ThemeResolver::standard(store, dir.path())
			.resolve("pastel")
			.await;
		assert!(matches!(result, Err(ThemeError::NotFound(id)) if id == "pastel"));
	}

	#[tokio::test]
	async fn test_traversal_ids_never_touch_filesystem() {
		let dir = tempfile::tempdir().unwrap();
		let themes = dir.path().join("themes");
		std::fs::create_dir(&themes).unwrap();
		write_theme(dir.path(), "secret", r#"{"leak": true}"#);
		let store = store_with(&[]).await;

		let resolver = ThemeResolver::standard(store, &themes);
		for id in ["../secret", "..", "a/b", "a\\b", ""] {
			assert!(matches!(
				resolver.resolve(id).await,
				Err(ThemeError::NotFound(_))
			));
		}
	}

	#[tokio::test]
	async fn test_malformed_file_is_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		write_theme(dir.path(), "broken", "{ not json");
		let source = FileThemeSource::new(dir.path());

		let result = source.load("broken").await;
		assert!(matches!(result, Err(ThemeError::Parse { .. })));
	}

	#[tokio::test]
	async fn test_non_object_file_is_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		write_theme(dir.path(), "list", "[1, 2]");
		let source = FileThemeSource::new(dir.path());

		let result = source.load("list").await;
		assert!(matches!(result, Err(ThemeError::Parse { .. })));
	}

	#[tokio::test]
	async fn test_sources_are_tried_in_order() {
		struct Fixed(&'static str, Option<&'static str>);

		#[async_trait]
		impl ThemeSource for Fixed {
			fn name(&self) -> &'static str {
				self.0
			}

			async fn load(&self, _theme_id: &str) -> Result<Option<ThemeConfig>, ThemeError> {
				Ok(self.1.map(|label| {
					let mut config = ThemeConfig::new();
					config.insert("from".to_string(), label.into());
					config
				}))
			}
		}

		let resolver = ThemeResolver::new(vec![
			Box::new(Fixed("empty", None)),
			Box::new(Fixed("second", Some("second"))),
			Box::new(Fixed("third", Some("third"))),
		]);
		let theme = resolver.resolve("any").await.unwrap();
		assert_eq!(theme.config["from"], "second");
	}
}
