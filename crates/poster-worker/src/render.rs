// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The external rendering collaborator.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use poster_config::RendererConfig;
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::theme::Theme;

/// Bound on the stderr excerpt carried in [`RenderError::Failed`].
const STDERR_TAIL_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum RenderError {
	#[error("failed to start renderer {program}: {source}")]
	Spawn {
		program: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("renderer I/O failed: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to encode render request: {0}")]
	Encode(#[from] serde_json::Error),

	#[error("renderer exited with {}: {stderr}", exit_description(.code))]
	Failed { code: Option<i32>, stderr: String },
}

fn exit_description(code: &Option<i32>) -> String {
	match code {
		Some(code) => format!("status {code}"),
		None => "a signal".to_string(),
	}
}

/// Everything the renderer needs for one poster. The theme travels with the request.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
	pub title: String,
	pub subtitle: String,
	pub latitude: f64,
	pub longitude: f64,
	/// Map radius in meters.
	pub distance: i64,
	pub theme: Theme,
	pub output_path: PathBuf,
}

#[async_trait]
pub trait Renderer: Send + Sync {
	/// Produce an image at `request.output_path`. Returning `Ok` does not by itself prove the file exists.
	async fn render(&self, request: &RenderRequest) -> Result<(), RenderError>;
}

/// Runs the configured program once per job, with the request as JSON on stdin.
///
/// The child is killed if the render future is dropped.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
	config: RendererConfig,
}

impl CommandRenderer {
	pub fn new(config: RendererConfig) -> Self {
		Self { config }
	}
}

#[async_trait]
impl Renderer for CommandRenderer {
	#[instrument(skip(self, request), fields(program = %self.config.program.display(), output = %request.output_path.display()))]
	async fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
		let payload = serde_json::to_vec(request)?;

		let mut command = Command::new(&self.config.program);
		command
			.args(&self.config.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		if let Some(dir) = &self.config.working_dir {
			command.current_dir(dir);
		}

		let mut child = command.spawn().map_err(|source| RenderError::Spawn {
			program: self.config.program.clone(),
			source,
		})?;

		if let Some(mut stdin) = child.stdin.take() {
			match stdin.write_all(&payload).await {
				Ok(()) => {}
				// Child exited without reading stdin; its status is reported below.
				Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
				Err(e) => return Err(e.into()),
			}
		}

		let output = child.wait_with_output().await?;
		debug!(status = %output.status, "renderer exited");

		if output.status.success() {
			return Ok(());
		}

		Err(RenderError::Failed {
			code: output.status.code(),
			stderr: stderr_tail(&output.stderr),
		})
	}
}

fn stderr_tail(stderr: &[u8]) -> String {
	let text = String::from_utf8_lossy(stderr);
	let text = text.trim();
	let skip = text.chars().count().saturating_sub(STDERR_TAIL_CHARS);
	text.chars().skip(skip).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use poster_db::ThemeConfig;

	fn request(output_path: PathBuf) -> RenderRequest {
		let mut config = ThemeConfig::new();
		config.insert("bg".to_string(), "#000000".into());
		RenderRequest {
			title: "PARIS".to_string(),
			subtitle: "France".to_string(),
			latitude: 48.8566,
			longitude: 2.3522,
			distance: 10000,
			theme: Theme {
				id: "noir".to_string(),
				config,
			},
			output_path,
		}
	}

	fn shell(script: &str, extra: &[&str]) -> CommandRenderer {
		let mut args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
		args.extend(extra.iter().map(|s| s.to_string()));
		CommandRenderer::new(RendererConfig {
			program: PathBuf::from("sh"),
			args,
			working_dir: None,
		})
	}

	#[test]
	fn test_stderr_tail_is_bounded() {
		let noisy = "x".repeat(5000);
		assert_eq!(stderr_tail(noisy.as_bytes()).chars().count(), STDERR_TAIL_CHARS);
	}

	#[test]
	fn test_request_serializes_theme_inline() {
		let json = serde_json::to_value(request(PathBuf::from("/tmp/1/poster.png"))).unwrap();
		assert_eq!(json["theme"]["id"], "noir");
		assert_eq!(json["theme"]["config"]["bg"], "#000000");
		assert_eq!(json["output_path"], "/tmp/1/poster.png");
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_request_is_written_to_stdin() {
		let dir = tempfile::tempdir().unwrap();
		let captured = dir.path().join("request.json");
		let renderer = shell("cat > \"$1\"", &[captured.to_str().unwrap()]);

		renderer
			.render(&request(dir.path().join("poster.png")))
			.await
			.unwrap();

		let written: serde_json::Value =
			serde_json::from_str(&std::fs::read_to_string(&captured).unwrap()).unwrap();
		assert_eq!(written["title"], "PARIS");
		assert_eq!(written["distance"], 10000);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_non_zero_exit_is_failure_with_stderr() {
		let dir = tempfile::tempdir().unwrap();
		let renderer = shell("cat > /dev/null; echo 'no tiles for area' >&2; exit 3", &[]);

		let result = renderer.render(&request(dir.path().join("poster.png"))).await;
		match result {
			Err(RenderError::Failed { code, stderr }) => {
				assert_eq!(code, Some(3));
				assert_eq!(stderr, "no tiles for area");
			}
			other => panic!("expected Failed, got {other:?}"),
		}
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_working_dir_is_applied() {
		let dir = tempfile::tempdir().unwrap();
		let renderer = CommandRenderer::new(RendererConfig {
			program: PathBuf::from("sh"),
			args: vec!["-c".to_string(), "cat > /dev/null; touch marker".to_string()],
			working_dir: Some(dir.path().to_path_buf()),
		});

		renderer
			.render(&request(dir.path().join("poster.png")))
			.await
			.unwrap();
		assert!(dir.path().join("marker").exists());
	}

	#[tokio::test]
	async fn test_missing_program_is_spawn_error() {
		let renderer = CommandRenderer::new(RendererConfig {
			program: PathBuf::from("/nonexistent/render-poster"),
			args: vec![],
			working_dir: None,
		});

		let result = renderer.render(&request(PathBuf::from("/tmp/poster.png"))).await;
		assert!(matches!(result, Err(RenderError::Spawn { .. })));
	}
}
