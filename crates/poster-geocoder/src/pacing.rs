// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Minimum spacing between provider calls.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::trace;

use crate::error::GeocodeError;
use crate::types::{GeocodeMatch, GeocodeQuery};
use crate::Geocoder;

/// Wraps a [`Geocoder`] so that calls are serialized and spaced at least `min_interval` apart.
///
/// The first call also waits `min_interval`, and spacing is measured from the
/// end of the previous call, so a slow provider response never shortens the gap.
pub struct PacedGeocoder<G> {
	inner: G,
	min_interval: Duration,
	last_call: Mutex<Option<Instant>>,
}

impl<G> PacedGeocoder<G> {
	pub fn new(inner: G, min_interval: Duration) -> Self {
		Self {
			inner,
			min_interval,
			last_call: Mutex::new(None),
		}
	}

	pub fn inner(&self) -> &G {
		&self.inner
	}
}

#[async_trait]
impl<G: Geocoder> Geocoder for PacedGeocoder<G> {
	async fn geocode(&self, query: &GeocodeQuery) -> Result<Option<GeocodeMatch>, GeocodeError> {
		let mut last_call = self.last_call.lock().await;

		match *last_call {
			Some(previous) => sleep_until(previous + self.min_interval).await,
			None => sleep(self.min_interval).await,
		}
		trace!(interval_ms = self.min_interval.as_millis() as u64, "pacing satisfied");

		let result = self.inner.geocode(query).await;
		*last_call = Some(Instant::now());
		result
	}
}
