// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Poster render worker binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use poster_config::WorkerConfig;
use poster_db::{DbError, JobRepository, SqliteConnector, ThemeRepository};
use poster_geocoder::{NominatimClient, PacedGeocoder};
use poster_worker::{
	CommandRenderer, JobProcessor, LoopTiming, ShutdownSignal, WorkerError, WorkerLoop,
};
use sqlx::SqlitePool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Poster worker - claims queued poster jobs and renders them.
#[derive(Parser, Debug)]
#[command(name = "poster-worker", about = "Poster render job queue worker", version)]
struct Args {
	/// Config file to read instead of /etc/poster-worker/worker.toml
	#[arg(short, long, env = "POSTER_WORKER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the worker loop (default)
	Run,
	/// Check database connectivity and print queue statistics
	Check,
}

/// Load the environment, then parse `argv`, so `POSTER_WORKER_CONFIG` from `.env` is seen by clap.
fn parse_args<I, T>(load_env: impl FnOnce(), argv: I) -> Result<Args, clap::Error>
where
	I: IntoIterator<Item = T>,
	T: Into<std::ffi::OsString> + Clone,
{
	load_env();
	Args::try_parse_from(argv)
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = parse_args(
		|| {
			dotenvy::dotenv().ok();
		},
		std::env::args_os(),
	)
	.unwrap_or_else(|e| e.exit());

	let loaded = match &args.config {
		Some(path) => poster_config::load_config_with_file(path.clone()),
		None => poster_config::load_config(),
	};
	let config = match loaded {
		Ok(config) => config,
		Err(e) => {
			eprintln!("configuration error: {e}");
			return ExitCode::FAILURE;
		}
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let result = match args.command.unwrap_or(Command::Run) {
		Command::Run => run(config).await,
		Command::Check => check(config).await,
	};

	match result {
		Ok(code) => code,
		Err(e) => {
			tracing::error!(error = %e, "startup failed");
			ExitCode::FAILURE
		}
	}
}

async fn prepare_database(config: &WorkerConfig) -> Result<SqlitePool, DbError> {
	let pool = poster_db::create_pool(&config.database.url).await?;
	poster_db::run_migrations(&pool).await?;
	Ok(pool)
}

async fn run(config: WorkerConfig) -> Result<ExitCode, WorkerError> {
	tracing::info!(
		database = %config.database.url,
		storage_dir = %config.paths.storage_dir.display(),
		"starting poster-worker"
	);

	tokio::fs::create_dir_all(&config.paths.storage_dir).await?;
	prepare_database(&config).await?.close().await;

	let connector = Arc::new(SqliteConnector::new(&config.database.url)?);

	let client = NominatimClient::with_timeout(&config.geocoder.user_agent, config.geocoder.timeout())?
		.with_base_url(config.geocoder.base_url.clone());
	let geocoder = Arc::new(PacedGeocoder::new(client, config.geocoder.min_interval()));
	let renderer = Arc::new(CommandRenderer::new(config.renderer.clone()));

	let processor = JobProcessor::new(
		geocoder,
		renderer,
		config.paths.storage_dir.clone(),
		config.paths.themes_dir.clone(),
	)
	.with_cache_ttl(config.worker.geocode_cache_ttl());

	let shutdown = ShutdownSignal::new();
	{
		let shutdown = shutdown.clone();
		tokio::spawn(async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				tracing::info!("Received shutdown signal");
				shutdown.trigger();
			}
		});
	}

	let exit = WorkerLoop::new(
		connector,
		processor,
		LoopTiming::from(&config.worker),
		shutdown,
	)
	.run()
	.await;

	tracing::info!(?exit, "worker stopped");
	Ok(ExitCode::from(exit.exit_code()))
}

async fn check(config: WorkerConfig) -> Result<ExitCode, WorkerError> {
	let pool = prepare_database(&config).await?;

	let jobs = JobRepository::new(pool.clone()).count_jobs().await?;
	let themes = ThemeRepository::new(pool.clone()).count_active().await?;
	pool.close().await;

	println!("database ok: {}", config.database.url);
	println!("jobs: {jobs}");
	println!("active themes: {themes}");
	Ok(ExitCode::SUCCESS)
}
