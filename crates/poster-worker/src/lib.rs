// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Poster render worker core.
//!
//! The worker polls the job queue, resolves each job's location (through the
//! geocode cache, then the provider), resolves its theme, hands a render
//! request to the external renderer and records the outcome. [`WorkerLoop`]
//! owns the process lifetime: backoff, stale reclaim and the fatal circuit
//! breaker.

pub mod breaker;
pub mod cache;
pub mod display;
pub mod error;
pub mod processor;
pub mod reclaimer;
pub mod render;
pub mod shutdown;
pub mod theme;
pub mod worker_loop;

#[cfg(test)]
mod test_support;

pub use breaker::CircuitBreaker;
pub use cache::{normalization_key, GeocodeCache, DEFAULT_GEOCODE_TTL};
pub use display::{derive_display_text, DisplayText};
pub use error::{Result, WorkerError};
pub use processor::{JobOutcome, JobProcessor, ProcessError, OUTPUT_FILE_NAME};
pub use reclaimer::{StaleJobReclaimer, DEFAULT_STALE_THRESHOLD};
pub use render::{CommandRenderer, RenderError, RenderRequest, Renderer};
pub use shutdown::ShutdownSignal;
pub use theme::{FileThemeSource, StoreThemeSource, Theme, ThemeError, ThemeResolver, ThemeSource};
pub use worker_loop::{LoopExit, LoopTiming, WorkerLoop};
