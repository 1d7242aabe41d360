// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::time::Duration;

use crate::error::{DbError, Result};
use crate::time::format_timestamp;

/// Stored error messages are cut to this many characters.
pub const MAX_ERROR_MESSAGE_LEN: usize = 500;

pub type JobId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Queued,
	Running,
	Done,
	Error,
}

impl JobStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobStatus::Queued => "queued",
			JobStatus::Running => "running",
			JobStatus::Done => "done",
			JobStatus::Error => "error",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, JobStatus::Done | JobStatus::Error)
	}
}

impl std::str::FromStr for JobStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"queued" => Ok(JobStatus::Queued),
			"running" => Ok(JobStatus::Running),
			"done" => Ok(JobStatus::Done),
			"error" => Ok(JobStatus::Error),
			_ => Err(format!("unknown job status: {s}")),
		}
	}
}

impl std::fmt::Display for JobStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A poster render request as persisted in the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
	pub id: JobId,
	pub location: String,
	pub theme: String,
	pub distance: i64,
	pub title: Option<String>,
	pub subtitle: Option<String>,
	pub status: JobStatus,
	pub created_at: DateTime<Utc>,
	pub started_at: Option<DateTime<Utc>>,
	pub finished_at: Option<DateTime<Utc>>,
	pub result_path: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub error_message: Option<String>,
}

/// Fields supplied by the submission path when a job is queued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
	pub location: String,
	pub theme: String,
	pub distance: i64,
	pub title: Option<String>,
	pub subtitle: Option<String>,
}

#[derive(sqlx::FromRow)]
struct JobRow {
	id: i64,
	location: String,
	theme: String,
	distance: i64,
	title: Option<String>,
	subtitle: Option<String>,
	status: String,
	created_at: DateTime<Utc>,
	started_at: Option<DateTime<Utc>>,
	finished_at: Option<DateTime<Utc>>,
	result_path: Option<String>,
	latitude: Option<f64>,
	longitude: Option<f64>,
	error_message: Option<String>,
}

impl TryFrom<JobRow> for RenderJob {
	type Error = DbError;

	fn try_from(row: JobRow) -> Result<Self> {
		Ok(RenderJob {
			id: row.id,
			location: row.location,
			theme: row.theme,
			distance: row.distance,
			title: row.title,
			subtitle: row.subtitle,
			status: row.status.parse().map_err(DbError::Internal)?,
			created_at: row.created_at,
			started_at: row.started_at,
			finished_at: row.finished_at,
			result_path: row.result_path,
			latitude: row.latitude,
			longitude: row.longitude,
			error_message: row.error_message,
		})
	}
}

const JOB_COLUMNS: &str = "id, location, theme, distance, title, subtitle, status, created_at, \
	started_at, finished_at, result_path, latitude, longitude, error_message";

/// Cut `message` to at most [`MAX_ERROR_MESSAGE_LEN`] characters without splitting a character.
pub fn truncate_error_message(message: &str) -> String {
	match message.char_indices().nth(MAX_ERROR_MESSAGE_LEN) {
		Some((byte_idx, _)) => message[..byte_idx].to_string(),
		None => message.to_string(),
	}
}

#[derive(Clone)]
pub struct JobRepository {
	pool: SqlitePool,
}

impl JobRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a job in `queued` state. This is the submission path's write; the worker never calls it.
	#[tracing::instrument(skip(self, job), fields(location = %job.location, theme = %job.theme))]
	pub async fn enqueue(&self, job: &NewJob) -> Result<JobId> {
		let now = format_timestamp(Utc::now());
		let result = sqlx::query(
			r#"
            INSERT INTO jobs (location, theme, distance, title, subtitle, status, created_at)
            VALUES (?, ?, ?, ?, ?, 'queued', ?)
            "#,
		)
		.bind(&job.location)
		.bind(&job.theme)
		.bind(job.distance)
		.bind(&job.title)
		.bind(&job.subtitle)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		Ok(result.last_insert_rowid())
	}

	/// Atomically move the oldest queued job to `running` and return it.
	///
	/// The select and the update are a single statement inside one write
	/// transaction; SQLite admits one writer at a time, so two callers can never
	/// both see the same row as `queued`.
	#[tracing::instrument(skip(self))]
	pub async fn claim_next(&self) -> Result<Option<RenderJob>> {
		let now = format_timestamp(Utc::now());
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query_as::<_, JobRow>(&format!(
			r#"
            UPDATE jobs
            SET status = 'running', started_at = ?
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'queued'
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            AND status = 'queued'
            RETURNING {JOB_COLUMNS}
            "#
		))
		.bind(&now)
		.fetch_optional(&mut *tx)
		.await?;

		tx.commit().await?;

		let job = row.map(RenderJob::try_from).transpose()?;
		if let Some(job) = &job {
			tracing::debug!(job_id = job.id, "claimed job");
		}
		Ok(job)
	}

	#[tracing::instrument(skip(self, result_path))]
	pub async fn mark_done(
		&self,
		job_id: JobId,
		result_path: &str,
		latitude: f64,
		longitude: f64,
	) -> Result<()> {
		let now = format_timestamp(Utc::now());
		let result = sqlx::query(
			r#"
            UPDATE jobs
            SET status = 'done',
                result_path = ?,
                latitude = ?,
                longitude = ?,
                finished_at = ?
            WHERE id = ? AND status = 'running'
            "#,
		)
		.bind(result_path)
		.bind(latitude)
		.bind(longitude)
		.bind(&now)
		.bind(job_id)
		.execute(&self.pool)
		.await?;

		self
			.ensure_transitioned(job_id, result.rows_affected(), JobStatus::Done)
			.await
	}

	#[tracing::instrument(skip(self, message))]
	pub async fn mark_error(&self, job_id: JobId, message: &str) -> Result<()> {
		let now = format_timestamp(Utc::now());
		let result = sqlx::query(
			r#"
            UPDATE jobs
            SET status = 'error',
                error_message = ?,
                finished_at = ?
            WHERE id = ? AND status = 'running'
            "#,
		)
		.bind(truncate_error_message(message))
		.bind(&now)
		.bind(job_id)
		.execute(&self.pool)
		.await?;

		self
			.ensure_transitioned(job_id, result.rows_affected(), JobStatus::Error)
			.await
	}

	/// Return every `running` job started before `now - threshold` to `queued`.
	#[tracing::instrument(skip(self))]
	pub async fn reset_stale(&self, threshold: Duration) -> Result<u64> {
		let threshold = chrono::Duration::from_std(threshold)
			.map_err(|e| DbError::Internal(format!("invalid stale threshold: {e}")))?;
		let cutoff = Utc::now()
			.checked_sub_signed(threshold)
			.ok_or_else(|| DbError::Internal("stale threshold out of range".to_string()))?;
		let cutoff = format_timestamp(cutoff);

		let result = sqlx::query(
			r#"
            UPDATE jobs
            SET status = 'queued', started_at = NULL
            WHERE status = 'running' AND started_at < ?
            "#,
		)
		.bind(&cutoff)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_job(&self, job_id: JobId) -> Result<Option<RenderJob>> {
		let row = sqlx::query_as::<_, JobRow>(&format!(
			"SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"
		))
		.bind(job_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(RenderJob::try_from).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_jobs(&self) -> Result<i64> {
		let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM jobs")
			.fetch_one(&self.pool)
			.await?;

		Ok(row.0)
	}

	/// A terminal mark that touched no row is a logic error: the job is missing,
	/// already terminal, or was reclaimed. The row itself is left as it was.
	async fn ensure_transitioned(&self, job_id: JobId, rows: u64, target: JobStatus) -> Result<()> {
		if rows > 0 {
			return Ok(());
		}

		match self.get_job(job_id).await? {
			None => Err(DbError::NotFound(job_id.to_string())),
			Some(job) => Err(DbError::Conflict(format!(
				"{job_id} is {} and cannot be marked {target}",
				job.status
			))),
		}
	}
}

/// The worker's view of the job table.
#[async_trait]
pub trait JobStore: Send + Sync {
	async fn claim_next(&self) -> Result<Option<RenderJob>>;
	async fn mark_done(
		&self,
		job_id: JobId,
		result_path: &str,
		latitude: f64,
		longitude: f64,
	) -> Result<()>;
	async fn mark_error(&self, job_id: JobId, message: &str) -> Result<()>;
	async fn reset_stale(&self, threshold: Duration) -> Result<u64>;
	async fn get_job(&self, job_id: JobId) -> Result<Option<RenderJob>>;
}

#[async_trait]
impl JobStore for JobRepository {
	async fn claim_next(&self) -> Result<Option<RenderJob>> {
		self.claim_next().await
	}

	async fn mark_done(
		&self,
		job_id: JobId,
		result_path: &str,
		latitude: f64,
		longitude: f64,
	) -> Result<()> {
		self
			.mark_done(job_id, result_path, latitude, longitude)
			.await
	}

	async fn mark_error(&self, job_id: JobId, message: &str) -> Result<()> {
		self.mark_error(job_id, message).await
	}

	async fn reset_stale(&self, threshold: Duration) -> Result<u64> {
		self.reset_stale(threshold).await
	}

	async fn get_job(&self, job_id: JobId) -> Result<Option<RenderJob>> {
		self.get_job(job_id).await
	}
}


#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn test_truncation_never_exceeds_limit(message in "\\PC{0,800}") {
			let truncated = truncate_error_message(&message);
			prop_assert!(truncated.chars().count() <= MAX_ERROR_MESSAGE_LEN);
			prop_assert!(message.starts_with(&truncated));
		}

		#[test]
		fn test_short_messages_are_untouched(message in "\\PC{0,500}") {
			prop_assert_eq!(truncate_error_message(&message), message);
		}
	}
}
