//! Background task that polls the Soroban RPC and writes decoded contract
//! events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db::{self, Cursor};
use crate::errors::Result;
use crate::rpc::{self, EventsPage};

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Poll until `shutdown` is cancelled. The cursor is saved after every page,
/// so a restart resumes where the last successful poll stopped.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "indexer starting");

    let mut cursor = match db::load_cursor(&state.pool).await {
        Ok(saved) if saved.last_ledger > 0 || saved.last_cursor.is_some() => saved,
        Ok(_) => Cursor {
            last_ledger: i64::from(state.config.start_ledger),
            last_cursor: None,
        },
        Err(e) => {
            error!("failed to load indexer cursor, starting from config: {e}");
            Cursor {
                last_ledger: i64::from(state.config.start_ledger),
                last_cursor: None,
            }
        }
    };
    info!(ledger = cursor.last_ledger, "resuming");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(&state, &cursor) => match polled {
                Ok(next) => cursor = next,
                Err(e) => error!("indexer poll error: {e}"),
            },
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!(ledger = cursor.last_ledger, "indexer stopped");
}

/// Fetch, decode and store one page, then persist and return the next cursor.
async fn poll_once(state: &IndexerState, cursor: &Cursor) -> Result<Cursor> {
    let start_ledger = u32::try_from(cursor.last_ledger).unwrap_or(u32::MAX);
    let page = rpc::fetch_events(
        &state.client,
        &state.config.rpc_url,
        &state.config.contract_id,
        start_ledger,
        cursor.last_cursor.as_deref(),
        state.config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &state.config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            fetched = page.events.len(),
            stored = inserted,
            "indexed events page"
        );
    }

    let next = next_cursor(cursor, &page);
    db::save_cursor(&state.pool, &next).await?;
    Ok(next)
}

/// Keep the RPC's pagination cursor when it returns one (an empty page keeps
/// the previous one), and never move the ledger backwards.
fn next_cursor(current: &Cursor, page: &EventsPage) -> Cursor {
    let last_ledger = page
        .latest_ledger
        .map(|l| (l as i64).max(current.last_ledger))
        .unwrap_or(current.last_ledger);
    let last_cursor = page
        .cursor
        .clone()
        .or_else(|| current.last_cursor.clone());
    Cursor {
        last_ledger,
        last_cursor,
    }
}
