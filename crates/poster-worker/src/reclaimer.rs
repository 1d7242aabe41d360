// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use poster_db::{DbError, JobStore};
use tracing::warn;

pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// Returns jobs abandoned in `running` to the queue.
///
/// This is a coarse timeout, not a lease: a job that legitimately runs longer
/// than the threshold is reclaimed too and may be processed twice.
#[derive(Debug, Clone)]
pub struct StaleJobReclaimer {
	threshold: Duration,
}

impl StaleJobReclaimer {
	pub fn new(threshold: Duration) -> Self {
		Self { threshold }
	}

	pub fn threshold(&self) -> Duration {
		self.threshold
	}

	#[tracing::instrument(skip(self, jobs), fields(threshold_secs = self.threshold.as_secs()))]
	pub async fn reclaim(&self, jobs: &dyn JobStore) -> Result<u64, DbError> {
		let count = jobs.reset_stale(self.threshold).await?;
		if count > 0 {
			warn!(count, "stale running jobs returned to queue");
		}
		Ok(count)
	}
}

impl Default for StaleJobReclaimer {
	fn default() -> Self {
		Self::new(DEFAULT_STALE_THRESHOLD)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::claim_new_job;
	use poster_db::testing::create_test_pool;
	use poster_db::{JobRepository, JobStatus};

	#[tokio::test]
	async fn test_recent_claims_are_left_alone() {
		let pool = create_test_pool().await;
		let job = claim_new_job(&pool, "Oslo, Norway", "noir").await;
		let repo = JobRepository::new(pool);

		let count = StaleJobReclaimer::default().reclaim(&repo).await.unwrap();

		assert_eq!(count, 0);
		let stored = repo.get_job(job.id).await.unwrap().unwrap();
		assert_eq!(stored.status, JobStatus::Running);
	}

	#[tokio::test]
	async fn test_zero_threshold_reclaims_running_jobs() {
		let pool = create_test_pool().await;
		let job = claim_new_job(&pool, "Oslo, Norway", "noir").await;
		let repo = JobRepository::new(pool);
		tokio::time::sleep(Duration::from_millis(5)).await;

		let count = StaleJobReclaimer::new(Duration::ZERO)
			.reclaim(&repo)
			.await
			.unwrap();

		assert_eq!(count, 1);
		let stored = repo.get_job(job.id).await.unwrap().unwrap();
		assert_eq!(stored.status, JobStatus::Queued);
		assert!(stored.started_at.is_none());
	}
}
