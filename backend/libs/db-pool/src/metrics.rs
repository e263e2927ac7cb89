//! Connection acquisition latency, labelled by outcome.

use prometheus::{register_histogram_vec, HistogramVec};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

lazy_static::lazy_static! {
    static ref DB_POOL_ACQUIRE_DURATION: HistogramVec = register_histogram_vec!(
        "db_pool_acquire_duration_seconds",
        "Time spent waiting for a pooled connection",
        &["service", "outcome"],
        vec![0.001, 0.005, 0.025, 0.1, 0.5, 2.0, 10.0]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// `pool.acquire()`, timed into `db_pool_acquire_duration_seconds`.
///
/// Failed acquisitions land in the same histogram under their own
/// `outcome` label, so the error rate is the non-`ok` sample count.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let start = Instant::now();
    let result = pool.acquire().await;

    DB_POOL_ACQUIRE_DURATION
        .with_label_values(&[service, outcome(&result)])
        .observe(start.elapsed().as_secs_f64());

    result
}

fn outcome<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::PoolTimedOut) => "timeout",
        Err(sqlx::Error::PoolClosed) => "closed",
        Err(sqlx::Error::Io(_)) => "io",
        Err(_) => "other",
    }
}
