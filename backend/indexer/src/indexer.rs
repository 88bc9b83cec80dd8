//! Background task that follows the contract's event stream into SQLite.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::db::{self, Cursor};
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Poll until `shutdown` is cancelled.
///
/// A poll in flight when cancellation arrives is dropped; its cursor was not
/// saved, so the next start replays that page and the insert dedup absorbs it.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting — contract: {}", state.config.contract_id);

    let mut cursor = match db::load_cursor(&state.pool).await {
        Ok(Some(saved)) => saved,
        Ok(None) => Cursor {
            ledger: state.config.start_ledger,
            page: None,
        },
        Err(e) => {
            error!("Could not read the saved cursor, starting from config: {e}");
            Cursor {
                ledger: state.config.start_ledger,
                page: None,
            }
        }
    };
    info!("Resuming from ledger {}", cursor.ledger);

    let interval = Duration::from_secs(state.config.poll_interval_secs);
    loop {
        let poll = poll_once(&state, &cursor);
        let outcome = tokio::select! {
            _ = shutdown.cancelled() => break,
            outcome = poll => outcome,
        };
        match outcome {
            Ok(next) => cursor = next,
            Err(e) => error!("Indexer poll error at ledger {}: {e}", cursor.ledger),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("Indexer stopped at ledger {}", cursor.ledger);
}

/// Fetch one page after `cursor`, store it, and persist where to go next.
async fn poll_once(state: &IndexerState, cursor: &Cursor) -> Result<Cursor> {
    let config = &state.config;
    let (raw_events, next_page, latest_ledger) = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        cursor.ledger,
        cursor.page.as_deref(),
        config.events_per_page,
    )
    .await?;

    if raw_events.is_empty() {
        debug!("No new events since ledger {}", cursor.ledger);
    } else {
        let decoded = rpc::decode_events(&raw_events, &config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} decoded, {} new",
            raw_events.len(),
            decoded.len(),
            inserted
        );
    }

    let next = advance(cursor, latest_ledger, next_page);
    db::save_cursor(&state.pool, &next).await?;
    Ok(next)
}

/// The cursor for the following poll. The start ledger never moves
/// backwards, and stays put while the RPC still hands out a paging token.
fn advance(cursor: &Cursor, latest_ledger: Option<u64>, next_page: Option<String>) -> Cursor {
    let ledger = match (&next_page, latest_ledger) {
        (Some(_), _) | (None, None) => cursor.ledger,
        (None, Some(latest)) => u32::try_from(latest)
            .unwrap_or(u32::MAX)
            .max(cursor.ledger),
    };
    Cursor {
        ledger,
        page: next_page,
    }
}
