// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Counts uninterrupted infrastructure failures and trips at a fixed maximum.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
	consecutive_failures: u32,
	max_failures: u32,
}

impl CircuitBreaker {
	/// `max_failures` of zero is treated as one.
	pub fn new(max_failures: u32) -> Self {
		Self {
			consecutive_failures: 0,
			max_failures: max_failures.max(1),
		}
	}

	pub fn record_success(&mut self) {
		self.consecutive_failures = 0;
	}

	/// Count a failure. Returns `true` once the maximum has been reached.
	#[must_use]
	pub fn record_failure(&mut self) -> bool {
		self.consecutive_failures = self.consecutive_failures.saturating_add(1);
		self.is_tripped()
	}

	pub fn is_tripped(&self) -> bool {
		self.consecutive_failures >= self.max_failures
	}

	pub fn consecutive_failures(&self) -> u32 {
		self.consecutive_failures
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_trips_on_fifth_failure() {
		let mut breaker = CircuitBreaker::new(5);
		for _ in 0..4 {
			assert!(!breaker.record_failure());
		}
		assert!(breaker.record_failure());
		assert_eq!(breaker.consecutive_failures(), 5);
	}

	#[test]
	fn test_success_resets_count() {
		let mut breaker = CircuitBreaker::new(5);
		for _ in 0..4 {
			assert!(!breaker.record_failure());
		}
		breaker.record_success();
		assert_eq!(breaker.consecutive_failures(), 0);
		for _ in 0..4 {
			assert!(!breaker.record_failure());
		}
		assert!(!breaker.is_tripped());
	}

	#[test]
	fn test_zero_max_trips_on_first_failure() {
		let mut breaker = CircuitBreaker::new(0);
		assert!(breaker.record_failure());
	}

	proptest! {
		#[test]
		fn test_trips_exactly_at_max(max in 1u32..50) {
			let mut breaker = CircuitBreaker::new(max);
			for _ in 1..max {
				prop_assert!(!breaker.record_failure());
			}
			prop_assert!(breaker.record_failure());
		}
	}
}
