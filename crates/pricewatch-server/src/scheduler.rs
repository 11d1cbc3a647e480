//! Background scrape scheduling.
//!
//! One pass runs immediately at startup, then a repeated job runs every
//! `scrape_interval_hours`.

use std::{sync::Arc, time::Duration};

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use pricewatch_core::AppConfig;
use pricewatch_scraper::Extractor;

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_scrape_job(&scheduler, pool.clone(), Arc::clone(&config)).await?;
    scheduler.start().await?;

    tokio::spawn(async move {
        tracing::info!("scheduler: starting startup scrape pass");
        run_scrape_pass(&pool, &config).await;
    });

    Ok(scheduler)
}

async fn register_scrape_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let interval = scrape_interval(config.scrape_interval_hours);
    let pool = Arc::new(pool);

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting scheduled scrape pass");
            run_scrape_pass(&pool, &config).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        interval_secs = interval.as_secs(),
        "scheduler: registered scrape job"
    );
    Ok(())
}

fn scrape_interval(hours: u64) -> Duration {
    Duration::from_secs(hours.max(1).saturating_mul(3_600))
}

/// Runs one extraction batch over the configured products and appends every
/// successful result. Failures are logged; nothing here aborts the process.
async fn run_scrape_pass(pool: &PgPool, config: &AppConfig) {
    // Re-read each pass so edits to the products file apply without a restart.
    let products = match pricewatch_core::load_products(&config.products_path) {
        Ok(file) => file.products,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load products");
            return;
        }
    };

    if products.is_empty() {
        tracing::info!("scheduler: no products configured; skipping");
        return;
    }

    let extractor = match Extractor::from_app_config(config) {
        Ok(extractor) => extractor,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to build extractor");
            return;
        }
    };

    let outcomes = extractor
        .extract_batch(&products, config.scraper_max_concurrent)
        .await;

    let mut stored = 0_usize;
    let mut failed = 0_usize;
    for (descriptor, outcome) in products.iter().zip(outcomes) {
        let result = match outcome.result {
            Ok(result) => result,
            Err(_) => {
                // extract_batch already logged the cause.
                failed += 1;
                continue;
            }
        };

        match pricewatch_db::insert_observation(pool, &result, &descriptor.site).await {
            Ok(Some(_)) => stored += 1,
            Ok(None) => {
                tracing::warn!(
                    product = %result.product_name,
                    captured_at = %result.captured_at,
                    "scheduler: duplicate observation ignored"
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    product = %result.product_name,
                    error = %e,
                    "scheduler: failed to store observation"
                );
            }
        }
    }

    tracing::info!(
        total = products.len(),
        stored,
        failed,
        "scheduler: scrape pass complete"
    );
}
