// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use poster_db::{
	GeocodeCacheRepository, JobRepository, NewJob, RenderJob, StoreSession, ThemeRepository,
};
use poster_geocoder::{GeocodeError, GeocodeMatch, GeocodeQuery, Geocoder};
use sqlx::SqlitePool;

use crate::render::{RenderError, RenderRequest, Renderer};

/// A session over `pool` whose `close` leaves the pool open.
pub(crate) fn sqlite_session(pool: &SqlitePool) -> StoreSession {
	StoreSession::new(
		Arc::new(JobRepository::new(pool.clone())),
		Arc::new(GeocodeCacheRepository::new(pool.clone())),
		Arc::new(ThemeRepository::new(pool.clone())),
	)
}

pub(crate) async fn enqueue(pool: &SqlitePool, location: &str, theme: &str) -> i64 {
	JobRepository::new(pool.clone())
		.enqueue(&NewJob {
			location: location.to_string(),
			theme: theme.to_string(),
			distance: 10000,
			title: None,
			subtitle: None,
		})
		.await
		.unwrap()
}

/// Enqueue a job and claim it, as the loop would before processing.
pub(crate) async fn claim_new_job(pool: &SqlitePool, location: &str, theme: &str) -> RenderJob {
	let id = enqueue(pool, location, theme).await;
	let job = JobRepository::new(pool.clone())
		.claim_next()
		.await
		.unwrap()
		.unwrap();
	assert_eq!(job.id, id);
	job
}

pub(crate) struct FakeGeocoder {
	result: Option<GeocodeMatch>,
	calls: AtomicUsize,
	last_query: Mutex<Option<GeocodeQuery>>,
}

impl FakeGeocoder {
	pub(crate) fn found(latitude: f64, longitude: f64) -> Self {
		Self::with_result(Some(GeocodeMatch {
			latitude,
			longitude,
			display_name: format!("{latitude}, {longitude}"),
		}))
	}

	pub(crate) fn not_found() -> Self {
		Self::with_result(None)
	}

	fn with_result(result: Option<GeocodeMatch>) -> Self {
		Self {
			result,
			calls: AtomicUsize::new(0),
			last_query: Mutex::new(None),
		}
	}

	pub(crate) fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub(crate) fn last_query(&self) -> Option<GeocodeQuery> {
		self.last_query.lock().unwrap().clone()
	}
}

#[async_trait]
impl Geocoder for FakeGeocoder {
	async fn geocode(&self, query: &GeocodeQuery) -> Result<Option<GeocodeMatch>, GeocodeError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		*self.last_query.lock().unwrap() = Some(query.clone());
		Ok(self.result.clone())
	}
}

#[derive(Debug, Clone)]
pub(crate) enum RenderBehavior {
	/// Write a small file at the output path.
	Write,
	/// Report success without writing anything.
	Silent,
	Fail(String),
}

pub(crate) struct FakeRenderer {
	behavior: RenderBehavior,
	requests: Mutex<Vec<RenderRequest>>,
}

impl FakeRenderer {
	pub(crate) fn new(behavior: RenderBehavior) -> Self {
		Self {
			behavior,
			requests: Mutex::new(Vec::new()),
		}
	}

	pub(crate) fn writing() -> Self {
		Self::new(RenderBehavior::Write)
	}

	pub(crate) fn silent() -> Self {
		Self::new(RenderBehavior::Silent)
	}

	pub(crate) fn last_request(&self) -> Option<RenderRequest> {
		self.requests.lock().unwrap().last().cloned()
	}

	pub(crate) fn render_count(&self) -> usize {
		self.requests.lock().unwrap().len()
	}
}

#[async_trait]
impl Renderer for FakeRenderer {
	async fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
		self.requests.lock().unwrap().push(request.clone());
		match &self.behavior {
			RenderBehavior::Write => {
				tokio::fs::write(&request.output_path, b"\x89PNG\r\n\x1a\n").await?;
				Ok(())
			}
			RenderBehavior::Silent => Ok(()),
			RenderBehavior::Fail(stderr) => Err(RenderError::Failed {
				code: Some(1),
				stderr: stderr.clone(),
			}),
		}
	}
}
