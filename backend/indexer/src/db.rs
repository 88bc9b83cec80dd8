//! Database layer: migrations, event queries and the resume cursor.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::events::{CrowdfundEvent, EventKind, EventRecord};

const EVENT_COLUMNS: &str = "id, event_type, project_id, phase_id, actor, amount, end_time, \
                             ledger, timestamp, contract_id, tx_hash, created_at";

/// Open the SQLite pool (creating the file on first run) and apply migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Cursor
// ─────────────────────────────────────────────────────────

/// Where the indexer left off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub ledger: u32,
    /// Opaque `getEvents` paging token, set while a ledger range is only
    /// partially consumed.
    pub page: Option<String>,
}

/// Load the saved cursor, or `None` before the first successful poll.
pub async fn load_cursor(pool: &SqlitePool) -> Result<Option<Cursor>> {
    let row: Option<(i64, Option<String>)> =
        sqlx::query_as("SELECT last_ledger, last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row
        .filter(|(ledger, page)| *ledger > 0 || page.is_some())
        .map(|(ledger, page)| Cursor {
            ledger: u32::try_from(ledger).unwrap_or(u32::MAX),
            page,
        }))
}

pub async fn save_cursor(pool: &SqlitePool, cursor: &Cursor) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(i64::from(cursor.ledger))
        .bind(cursor.page.as_deref())
        .execute(pool)
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events in one transaction, returning how many
/// were new. Rows matching an existing
/// `(ledger, tx_hash, event_type, project_id, phase_id, actor)` are skipped,
/// so replaying a ledger range is harmless.
pub async fn insert_events(pool: &SqlitePool, events: &[CrowdfundEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_type, project_id, phase_id, actor, amount, end_time,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ev.event_type)
        .bind(&ev.project_id)
        .bind(ev.phase_id)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(ev.end_time)
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

/// Narrowing applied to event listings. Empty means everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub project_id: Option<String>,
    pub phase_id: Option<i64>,
    pub kind: Option<EventKind>,
    pub limit: Option<i64>,
}

/// Events matching `filter`, oldest first.
pub async fn query_events(pool: &SqlitePool, filter: &EventFilter) -> Result<Vec<EventRecord>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE 1 = 1"));
    if let Some(project_id) = &filter.project_id {
        query.push(" AND project_id = ").push_bind(project_id.clone());
    }
    if let Some(phase_id) = filter.phase_id {
        query.push(" AND phase_id = ").push_bind(phase_id);
    }
    if let Some(kind) = filter.kind {
        query.push(" AND event_type = ").push_bind(kind.as_str());
    }
    query.push(" ORDER BY ledger ASC, id ASC");
    if let Some(limit) = filter.limit {
        query.push(" LIMIT ").push_bind(limit);
    }

    let rows = query.build_query_as::<EventRecord>().fetch_all(pool).await?;
    Ok(rows)
}

/// Every event of one project, oldest first.
pub async fn get_events_for_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Vec<EventRecord>> {
    let filter = EventFilter {
        project_id: Some(project_id.to_string()),
        ..EventFilter::default()
    };
    query_events(pool, &filter).await
}

/// Ids of every project whose creation has been indexed, in creation order.
pub async fn list_project_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT project_id
        FROM   events
        WHERE  event_type = ?1 AND project_id IS NOT NULL
        ORDER  BY CAST(project_id AS INTEGER) ASC
        "#,
    )
    .bind(EventKind::ProjectCreated.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
