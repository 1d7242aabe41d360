// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// One-shot stop request shared between the signal handler and the worker loop.
#[derive(Clone)]
pub struct ShutdownSignal {
	inner: Arc<Inner>,
}

struct Inner {
	triggered: AtomicBool,
	notify: Notify,
}

impl ShutdownSignal {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Inner {
				triggered: AtomicBool::new(false),
				notify: Notify::new(),
			}),
		}
	}

	pub fn trigger(&self) {
		self.inner.triggered.store(true, Ordering::SeqCst);
		self.inner.notify.notify_waiters();
	}

	pub fn is_triggered(&self) -> bool {
		self.inner.triggered.load(Ordering::SeqCst)
	}

	/// Resolves once [`trigger`](Self::trigger) has been called, immediately if it already was.
	pub async fn wait(&self) {
		let notified = self.inner.notify.notified();
		tokio::pin!(notified);
		notified.as_mut().enable();

		if self.is_triggered() {
			return;
		}
		notified.await;
	}
}

impl Default for ShutdownSignal {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn test_wait_after_trigger_returns_immediately() {
		let signal = ShutdownSignal::new();
		signal.trigger();
		tokio::time::timeout(Duration::from_secs(1), signal.wait())
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_trigger_wakes_all_waiters() {
		let signal = ShutdownSignal::new();
		let waiters: Vec<_> = (0..3)
			.map(|_| {
				let signal = signal.clone();
				tokio::spawn(async move { signal.wait().await })
			})
			.collect();

		tokio::task::yield_now().await;
		signal.trigger();

		for waiter in waiters {
			tokio::time::timeout(Duration::from_secs(1), waiter)
				.await
				.unwrap()
				.unwrap();
		}
		assert!(signal.is_triggered());
	}

	#[test]
	fn test_clones_share_state() {
		let signal = ShutdownSignal::new();
		let clone = signal.clone();
		clone.trigger();
		assert!(signal.is_triggered());
	}
}
