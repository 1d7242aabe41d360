// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runs one claimed job to a terminal state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use poster_db::{DbError, RenderJob, StoreSession};
use poster_geocoder::{GeocodeError, GeocodeMatch, GeocodeQuery, Geocoder};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::cache::{GeocodeCache, DEFAULT_GEOCODE_TTL};
use crate::display::derive_display_text;
use crate::error::Result;
use crate::render::{RenderError, RenderRequest, Renderer};
use crate::theme::{ThemeError, ThemeResolver};

pub const OUTPUT_FILE_NAME: &str = "poster.png";

/// Failures scoped to a single job. They end the job in `error` and never reach the loop.
#[derive(Debug, Error)]
pub enum ProcessError {
	#[error("location not found: {0}")]
	LocationNotFound(String),

	#[error("geocoding failed: {0}")]
	Geocode(#[from] GeocodeError),

	#[error("{0}")]
	Theme(#[from] ThemeError),

	#[error("{0}")]
	Render(#[from] RenderError),

	#[error("output not created: {}", .0.display())]
	OutputMissing(PathBuf),

	#[error("failed to prepare output {}: {source}", .path.display())]
	Output {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("store error: {0}")]
	Store(#[from] DbError),
}

/// How a processed job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
	Done { result_path: String },
	Failed { message: String },
}

struct Rendered {
	result_path: String,
	location: GeocodeMatch,
}

pub struct JobProcessor {
	geocoder: Arc<dyn Geocoder>,
	renderer: Arc<dyn Renderer>,
	storage_dir: PathBuf,
	themes_dir: PathBuf,
	cache_ttl: Duration,
}

impl JobProcessor {
	pub fn new(
		geocoder: Arc<dyn Geocoder>,
		renderer: Arc<dyn Renderer>,
		storage_dir: impl Into<PathBuf>,
		themes_dir: impl Into<PathBuf>,
	) -> Self {
		Self {
			geocoder,
			renderer,
			storage_dir: storage_dir.into(),
			themes_dir: themes_dir.into(),
			cache_ttl: DEFAULT_GEOCODE_TTL,
		}
	}

	pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = ttl;
		self
	}

	/// Process `job` and record `done` or `error` for it.
	///
	/// Every job-level failure is stored via `mark_error` and reported as
	/// [`JobOutcome::Failed`]. An `Err` means the terminal mark itself could not
	/// be written; the job then stays `running` until stale reclaim.
	#[instrument(skip(self, session, job), fields(job_id = job.id, location = %job.location, theme = %job.theme))]
	pub async fn process(&self, session: &StoreSession, job: &RenderJob) -> Result<JobOutcome> {
		let message = match self.execute(session, job).await {
			Ok(rendered) => {
				let marked = session
					.jobs
					.mark_done(
						job.id,
						&rendered.result_path,
						rendered.location.latitude,
						rendered.location.longitude,
					)
					.await;
				match marked {
					Ok(()) => {
						info!(result_path = %rendered.result_path, "job completed");
						return Ok(JobOutcome::Done {
							result_path: rendered.result_path,
						});
					}
					Err(e) => format!("failed to record completion: {e}"),
				}
			}
			Err(e) => e.to_string(),
		};

		warn!(error = %message, "job failed");
		session.jobs.mark_error(job.id, &message).await?;
		Ok(JobOutcome::Failed { message })
	}

	async fn execute(
		&self,
		session: &StoreSession,
		job: &RenderJob,
	) -> std::result::Result<Rendered, ProcessError> {
		let location = self.resolve_location(session, &job.location).await?;

		let job_dir = self.storage_dir.join(job.id.to_string());
		tokio::fs::create_dir_all(&job_dir)
			.await
			.map_err(|source| ProcessError::Output {
				path: job_dir.clone(),
				source,
			})?;
		let output_path = job_dir.join(OUTPUT_FILE_NAME);
		remove_previous_output(&output_path).await?;

		let theme = ThemeResolver::standard(session.themes.clone(), &self.themes_dir)
			.resolve(&job.theme)
			.await?;

		let text = derive_display_text(&job.location, job.title.as_deref(), job.subtitle.as_deref());

		info!(title = %text.title, subtitle = %text.subtitle, distance = job.distance, "rendering poster");
		self
			.renderer
			.render(&RenderRequest {
				title: text.title,
				subtitle: text.subtitle,
				latitude: location.latitude,
				longitude: location.longitude,
				distance: job.distance,
				theme,
				output_path: output_path.clone(),
			})
			.await?;

		match tokio::fs::metadata(&output_path).await {
			Ok(meta) if meta.is_file() => {
				debug!(size_kb = meta.len() / 1024, "output verified");
			}
			_ => return Err(ProcessError::OutputMissing(output_path)),
		}

		Ok(Rendered {
			result_path: format!("{}/{}", job.id, OUTPUT_FILE_NAME),
			location,
		})
	}

	async fn resolve_location(
		&self,
		session: &StoreSession,
		location: &str,
	) -> std::result::Result<GeocodeMatch, ProcessError> {
		let cache = GeocodeCache::new(session.geocode_cache.clone(), self.cache_ttl);

		if let Some(hit) = cache.lookup(location).await? {
			debug!(latitude = hit.latitude, longitude = hit.longitude, "geocode cache hit");
			return Ok(hit);
		}

		let query = GeocodeQuery::from_location(location);
		debug!(city = %query.city, country = %query.country, "geocode cache miss, querying provider");

		let found = self
			.geocoder
			.geocode(&query)
			.await?
			.ok_or_else(|| ProcessError::LocationNotFound(location.to_string()))?;

		cache.store(location, &found).await?;
		info!(latitude = found.latitude, longitude = found.longitude, "location geocoded");
		Ok(found)
	}
}

/// A reclaimed job may find its previous attempt's output; it must not satisfy verification.
async fn remove_previous_output(path: &Path) -> std::result::Result<(), ProcessError> {
	match tokio::fs::remove_file(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(source) => Err(ProcessError::Output {
			path: path.to_path_buf(),
			source,
		}),
	}
}
