//! SQLite implementation of [`StatusStore`].
//!
//! Migrations are embedded at compile time via `sqlx::migrate!("./migrations")`
//! (resolved relative to `CARGO_MANIFEST_DIR`) and run on [`SqliteStore::connect`].
//! The database location is a runtime setting and unrelated to the working
//! directory.
//!
//! The runtime-verified `sqlx::query` form is used so no `DATABASE_URL` is
//! needed at compile time.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`
//! suffix) so that string comparison in SQL orders them chronologically.
//! Transitions are conditional updates guarded by the allowed predecessor
//! states, which keeps the state machine monotonic even with several writers.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::StatusStore;
use crate::error::StoreError;
use crate::types::{ProcessId, ProcessRecord, ProcessStatus, StatusUpdate, TaskType};

const SELECT_COLUMNS: &str = "SELECT process_id, task_type, parameters, status, result, error_detail, created_at, updated_at \
                              FROM processes";

type ProcessRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

/// SQLite-backed status store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://newsdesk.db"`
    /// or `"sqlite::memory:"` for tests. In-memory databases are pinned to a
    /// single long-lived connection because each connection would otherwise
    /// see its own empty database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };
        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}

/// `'A', 'B'` list for an `IN (...)` clause. Only ever fed enum constants.
fn status_list(statuses: &[ProcessStatus]) -> String {
    statuses
        .iter()
        .map(|s| format!("'{}'", s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_row(row: ProcessRow) -> Result<ProcessRecord, StoreError> {
    let (process_id, task_type, parameters, status, result, error_detail, created_at, updated_at) = row;
    Ok(ProcessRecord {
        task_type: TaskType::from_str(&task_type)
            .map_err(|_| StoreError::Corrupt(format!("unknown task type {task_type:?}")))?,
        status: ProcessStatus::from_str(&status)
            .map_err(|_| StoreError::Corrupt(format!("unknown status {status:?}")))?,
        parameters: serde_json::from_str(&parameters)?,
        result: result.as_deref().map(serde_json::from_str).transpose()?,
        error_detail,
        created_at: decode_ts(&created_at)?,
        updated_at: decode_ts(&updated_at)?,
        process_id: ProcessId::from(process_id),
    })
}

impl StatusStore for SqliteStore {
    async fn put(&self, record: ProcessRecord) -> Result<(), StoreError> {
        let parameters = serde_json::to_string(&record.parameters)?;
        let result = record.result.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            "INSERT INTO processes (process_id, task_type, parameters, status, result, error_detail, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(process_id) DO UPDATE SET \
             task_type = ?2, parameters = ?3, status = ?4, result = ?5, error_detail = ?6, created_at = ?7, updated_at = ?8",
        )
        .bind(record.process_id.as_str())
        .bind(record.task_type.as_ref())
        .bind(&parameters)
        .bind(record.status.as_ref())
        .bind(&result)
        .bind(&record.error_detail)
        .bind(encode_ts(record.created_at))
        .bind(encode_ts(record.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: &ProcessId) -> Result<Option<ProcessRecord>, StoreError> {
        let row: Option<ProcessRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE process_id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode_row).transpose()
    }

    async fn update(&self, id: &ProcessId, update: StatusUpdate) -> Result<ProcessRecord, StoreError> {
        let next = update.status();
        let (result, error_detail) = match &update {
            StatusUpdate::Processing => (None, None),
            StatusUpdate::Completed(v) => (Some(serde_json::to_string(v)?), None),
            StatusUpdate::Failed(d) => (None, Some(d.clone())),
        };
        let sql = format!(
            "UPDATE processes SET status = ?1, result = ?2, error_detail = ?3, updated_at = ?4 \
             WHERE process_id = ?5 AND status IN ({})",
            status_list(next.predecessors())
        );
        let outcome = sqlx::query(&sql)
            .bind(next.as_ref())
            .bind(&result)
            .bind(&error_detail)
            .bind(encode_ts(Utc::now()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        let current = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if outcome.rows_affected() == 0 {
            return Err(StoreError::InvalidTransition {
                process_id: id.clone(),
                from: current.status,
                to: next,
            });
        }
        Ok(current)
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<ProcessRecord>, StoreError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE status IN ({}) AND updated_at < ?1 ORDER BY updated_at ASC",
            status_list(&[ProcessStatus::Processing])
        );
        let rows: Vec<ProcessRow> = sqlx::query_as(&sql)
            .bind(encode_ts(cutoff))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(decode_row).collect()
    }

    async fn fail_unfinished(&self, detail: &str) -> Result<u64, StoreError> {
        let sql = format!(
            "UPDATE processes SET status = ?1, error_detail = ?2, updated_at = ?3 WHERE status IN ({})",
            status_list(&ProcessStatus::NON_TERMINAL)
        );
        let outcome = sqlx::query(&sql)
            .bind(ProcessStatus::Failed.as_ref())
            .bind(detail)
            .bind(encode_ts(Utc::now()))
            .execute(&self.pool)
            .await?;
        Ok(outcome.rows_affected())
    }
}
