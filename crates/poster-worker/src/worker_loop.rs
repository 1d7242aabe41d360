// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The supervising poll loop.

use std::sync::Arc;
use std::time::Duration;

use poster_config::WorkerLoopConfig;
use poster_db::{DbError, StoreConnector, StoreSession};
use tracing::{error, info, instrument};

use crate::breaker::CircuitBreaker;
use crate::error::{Result, WorkerError};
use crate::processor::JobProcessor;
use crate::reclaimer::StaleJobReclaimer;
use crate::shutdown::ShutdownSignal;

/// Delays and limits governing the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopTiming {
	pub poll_interval: Duration,
	pub connect_retry: Duration,
	pub error_retry: Duration,
	pub max_consecutive_errors: u32,
	pub stale_job_timeout: Duration,
}

impl Default for LoopTiming {
	fn default() -> Self {
		Self::from(&WorkerLoopConfig::default())
	}
}

impl From<&WorkerLoopConfig> for LoopTiming {
	fn from(config: &WorkerLoopConfig) -> Self {
		Self {
			poll_interval: config.poll_interval(),
			connect_retry: config.connect_retry(),
			error_retry: config.error_retry(),
			max_consecutive_errors: config.max_consecutive_errors,
			stale_job_timeout: config.stale_job_timeout(),
		}
	}
}

/// Why [`WorkerLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
	Interrupted,
	TooManyFailures { consecutive_failures: u32 },
}

impl LoopExit {
	pub fn exit_code(&self) -> u8 {
		match self {
			LoopExit::Interrupted => 0,
			LoopExit::TooManyFailures { .. } => 1,
		}
	}
}

enum Iteration {
	Processed,
	Idle,
	ConnectFailed(DbError),
	Failed(WorkerError),
}

pub struct WorkerLoop {
	connector: Arc<dyn StoreConnector>,
	processor: JobProcessor,
	reclaimer: StaleJobReclaimer,
	timing: LoopTiming,
	shutdown: ShutdownSignal,
}

impl WorkerLoop {
	pub fn new(
		connector: Arc<dyn StoreConnector>,
		processor: JobProcessor,
		timing: LoopTiming,
		shutdown: ShutdownSignal,
	) -> Self {
		Self {
			connector,
			processor,
			reclaimer: StaleJobReclaimer::new(timing.stale_job_timeout),
			timing,
			shutdown,
		}
	}

	/// Run until interrupted or until the circuit breaker trips.
	///
	/// An interrupt abandons the current iteration, including a job being
	/// rendered; that job stays `running` until stale reclaim returns it.
	pub async fn run(self) -> LoopExit {
		let mut breaker = CircuitBreaker::new(self.timing.max_consecutive_errors);
		info!(
			poll_interval_secs = self.timing.poll_interval.as_secs(),
			max_consecutive_errors = self.timing.max_consecutive_errors,
			"worker loop started"
		);

		loop {
			if self.shutdown.is_triggered() {
				return self.interrupted();
			}

			let iteration = tokio::select! {
				biased;
				_ = self.shutdown.wait() => return self.interrupted(),
				iteration = self.iterate(&mut breaker) => iteration,
			};

			let delay = match iteration {
				Iteration::Processed => None,
				Iteration::Idle => Some(self.timing.poll_interval),
				Iteration::ConnectFailed(e) => {
					error!(
						error = %e,
						retry_secs = self.timing.connect_retry.as_secs(),
						"database connection failed"
					);
					if !self.pause(self.timing.connect_retry).await {
						return self.interrupted();
					}
					if breaker.record_failure() {
						return self.fatal(&breaker);
					}
					None
				}
				Iteration::Failed(e) => {
					let tripped = breaker.record_failure();
					error!(
						error = %e,
						consecutive_failures = breaker.consecutive_failures(),
						"worker iteration failed"
					);
					if tripped {
						return self.fatal(&breaker);
					}
					Some(self.timing.error_retry)
				}
			};

			if let Some(delay) = delay {
				if !self.pause(delay).await {
					return self.interrupted();
				}
			}
		}
	}

	async fn iterate(&self, breaker: &mut CircuitBreaker) -> Iteration {
		let session = match self.connector.connect().await {
			Ok(session) => session,
			Err(e) => return Iteration::ConnectFailed(e),
		};

		let result = self.run_session(&session, breaker).await;
		session.close().await;

		match result {
			Ok(true) => Iteration::Processed,
			Ok(false) => Iteration::Idle,
			Err(e) => Iteration::Failed(e),
		}
	}

	/// Reclaim, claim and process at most one job. Returns whether a job was claimed.
	#[instrument(skip_all)]
	async fn run_session(&self, session: &StoreSession, breaker: &mut CircuitBreaker) -> Result<bool> {
		self.reclaimer.reclaim(session.jobs.as_ref()).await?;

		let Some(job) = session.jobs.claim_next().await? else {
			return Ok(false);
		};

		breaker.record_success();
		info!(job_id = job.id, location = %job.location, "claimed job");

		self.processor.process(session, &job).await?;
		Ok(true)
	}

	/// Sleep for `delay`. Returns `false` if shutdown was requested meanwhile.
	async fn pause(&self, delay: Duration) -> bool {
		tokio::select! {
			biased;
			_ = self.shutdown.wait() => false,
			_ = tokio::time::sleep(delay) => true,
		}
	}

	fn interrupted(&self) -> LoopExit {
		info!("shutdown requested, worker loop stopping");
		LoopExit::Interrupted
	}

	fn fatal(&self, breaker: &CircuitBreaker) -> LoopExit {
		error!(
			consecutive_failures = breaker.consecutive_failures(),
			"too many consecutive errors, giving up"
		);
		LoopExit::TooManyFailures {
			consecutive_failures: breaker.consecutive_failures(),
		}
	}
}
