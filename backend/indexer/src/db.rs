//! Database layer: migrations, event storage and the resume cursor.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::events::{EventRecord, HandlerEvent};

const EVENT_COLUMNS: &str = "id, event_type, event_id, round_id, identity, actor, amount, \
                             detail, ledger, timestamp, contract_id, tx_hash, created_at";

/// Open the SQLite pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    connect(database_url, 5).await
}

async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    // Create the database file on first run.
    let url = if url.contains('?') || url.contains(":memory:") {
        url
    } else {
        format!("{url}?mode=rwc")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database migrations applied");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor
// ─────────────────────────────────────────────────────────

/// Where the poll loop should resume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub last_ledger: i64,
    pub last_cursor: Option<String>,
}

pub async fn load_cursor(pool: &SqlitePool) -> Result<Cursor> {
    let row: Option<(i64, Option<String>)> =
        sqlx::query_as("SELECT last_ledger, last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row
        .map(|(last_ledger, last_cursor)| Cursor {
            last_ledger,
            last_cursor,
        })
        .unwrap_or_default())
}

pub async fn save_cursor(pool: &SqlitePool, cursor: &Cursor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO indexer_cursor (id, last_ledger, last_cursor) VALUES (1, ?1, ?2)
        ON CONFLICT (id) DO UPDATE SET last_ledger = excluded.last_ledger,
                                       last_cursor = excluded.last_cursor
        "#,
    )
    .bind(cursor.last_ledger)
    .bind(&cursor.last_cursor)
    .execute(pool)
    .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events in one transaction and return how many
/// were new. Events whose RPC `event_id` is already stored are skipped, so
/// re-polling an overlapping range is harmless.
pub async fn insert_events(pool: &SqlitePool, events: &[HandlerEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_type, event_id, round_id, identity, actor, amount, detail,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ev.event_type)
        .bind(&ev.event_id)
        .bind(&ev.round_id)
        .bind(&ev.identity)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.detail)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// All events for a round, oldest first.
pub async fn get_events_for_round(pool: &SqlitePool, round_id: &str) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE round_id = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(round_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// All events that concern `address`, either as the identity or as the
/// acting wallet, oldest first.
pub async fn get_events_for_identity(
    pool: &SqlitePool,
    address: &str,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE identity = ?1 OR actor = ?1 \
         ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(address)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every stored event, oldest first.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // One connection, so every query sees the same in-memory database.
    connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database")
}

#[cfg(test)]
pub(crate) fn sample_event(event_id: &str, event_type: &str, round_id: Option<&str>) -> HandlerEvent {
    HandlerEvent {
        event_type: event_type.to_string(),
        event_id: Some(event_id.to_string()),
        round_id: round_id.map(String::from),
        identity: Some("GALICE".to_string()),
        actor: Some("GWALLET".to_string()),
        amount: Some("100".to_string()),
        detail: None,
        ledger: 10,
        timestamp: 1_704_067_200,
        contract_id: "CONTRACT1".to_string(),
        tx_hash: Some("TX".to_string()),
    }
}
