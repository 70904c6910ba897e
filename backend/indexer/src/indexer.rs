//! Long-running background task that polls the Soroban RPC and writes
//! decoded registry events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::errors::{IndexerError, Result};
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Run the indexer loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting, contract: {}", state.config.contract_id);

    let (mut current_ledger, mut cursor) =
        resume_point(&state.pool, state.config.start_ledger).await;

    info!("Resuming from ledger {current_ledger}");

    loop {
        match poll_once(&state, current_ledger, cursor.as_deref(), &shutdown).await {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(IndexerError::Shutdown) => break,
            Err(e) => {
                error!("Indexer poll error: {e}");
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!("Indexer stopped at ledger {current_ledger}");
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    state: &IndexerState,
    start_ledger: u32,
    cursor: Option<&str>,
    shutdown: &CancellationToken,
) -> Result<(u32, Option<String>)> {
    let page = rpc::fetch_events(
        &state.client,
        &state.config.rpc_url,
        &state.config.contract_id,
        start_ledger,
        cursor,
        state.config.events_per_page,
        shutdown,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &state.config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} new records stored",
            page.events.len(),
            inserted
        );
    }

    let next_ledger = next_start_ledger(start_ledger, page.latest_ledger);

    // Persist cursor so restarts are deterministic.
    db::save_cursor(&state.pool, next_ledger as i64, page.cursor.as_deref()).await?;

    Ok((next_ledger, page.cursor))
}

/// Where to pick up after a restart: the persisted ledger and cursor, or
/// `start_ledger` when nothing usable is stored. Read failures are logged
/// and fall back to `start_ledger` so the loop can still start.
async fn resume_point(pool: &SqlitePool, start_ledger: u32) -> (u32, Option<String>) {
    let last_ledger = db::get_last_ledger(pool).await.unwrap_or_else(|e| {
        error!("Failed to read last ledger, starting from {start_ledger}: {e}");
        0
    });
    let cursor = db::get_cursor_string(pool).await.unwrap_or_else(|e| {
        error!("Failed to read pagination cursor, starting without one: {e}");
        None
    });
    (resume_ledger(last_ledger, start_ledger), cursor)
}

/// A stored ledger that is zero, negative, or outside `u32` is unusable.
fn resume_ledger(last_ledger: i64, start_ledger: u32) -> u32 {
    match u32::try_from(last_ledger) {
        Ok(ledger) if ledger > 0 => ledger,
        Ok(_) => start_ledger,
        Err(_) => {
            warn!("Stored ledger {last_ledger} is out of range, starting from {start_ledger}");
            start_ledger
        }
    }
}

/// The start ledger never moves backwards, even if the RPC reports an older
/// latest ledger (e.g. a lagging node behind a load balancer).
fn next_start_ledger(start_ledger: u32, latest_ledger: Option<u64>) -> u32 {
    latest_ledger
        .map(|l| (l.min(u32::MAX as u64) as u32).max(start_ledger))
        .unwrap_or(start_ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_ledger_advances_to_latest() {
        assert_eq!(next_start_ledger(100, Some(250)), 250);
    }

    #[test]
    fn start_ledger_never_regresses() {
        assert_eq!(next_start_ledger(300, Some(250)), 300);
        assert_eq!(next_start_ledger(300, None), 300);
    }

    #[test]
    fn resume_ledger_prefers_stored_value() {
        assert_eq!(resume_ledger(500, 10), 500);
        assert_eq!(resume_ledger(0, 10), 10);
        assert_eq!(resume_ledger(-1, 10), 10);
        assert_eq!(resume_ledger(i64::from(u32::MAX) + 1, 10), 10);
    }

    #[tokio::test]
    async fn resume_point_reads_persisted_cursor() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        assert_eq!(resume_point(&pool, 42).await, (42, None));

        db::save_cursor(&pool, 900, Some("c-900")).await.unwrap();
        assert_eq!(
            resume_point(&pool, 42).await,
            (900, Some("c-900".to_string()))
        );
    }

    #[tokio::test]
    async fn resume_point_survives_unreadable_cursor_table() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        sqlx::query("DROP TABLE indexer_cursor")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(resume_point(&pool, 42).await, (42, None));
    }
}
