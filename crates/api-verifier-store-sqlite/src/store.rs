// crates/api-verifier-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Run History Store
// Description: Durable RunHistoryStore backed by SQLite.
// Purpose: Persist run records and answer filtered, paged listings.
// Dependencies: api-verifier-core, rusqlite, serde, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`RunHistoryStore`] using `SQLite`. Each
//! run is one row keyed by run id; saving an existing id replaces it. The
//! summary/details document is stored as JSON bytes next to its SHA-256
//! digest, and loads fail closed when the digest does not match.
//! Listings push the date window, search, sort, and paging into SQL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use api_verifier_core::RunHistoryStore;
use api_verifier_core::RunListEntry;
use api_verifier_core::RunQuery;
use api_verifier_core::RunRecord;
use api_verifier_core::RunStatus;
use api_verifier_core::SortOrder;
use api_verifier_core::StoreError;
use api_verifier_core::now_ms;
use api_verifier_core::pass_rate_percent;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum run document size accepted by the store.
pub const MAX_DOCUMENT_BYTES: usize = 64 * 1024 * 1024;
/// Columns selected for listing rows.
const LIST_COLUMNS: &str = "run_id, run_name, started_at, ended_at, status, passed, failed, skipped";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` run history store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with default pragmas for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Run document exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "run document exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps a `rusqlite` error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err function pointer.")]
fn db_err(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed run history store.
#[derive(Clone)]
pub struct SqliteRunStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

/// Listing columns as read from a row, before validation.
type RawListRow = (String, String, i64, Option<i64>, String, i64, i64, i64);

impl SqliteRunStore {
    /// Opens an `SQLite`-backed run history store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Saves a run record, replacing an existing row with the same id.
    fn save_record(&self, record: &RunRecord) -> Result<(), SqliteStoreError> {
        if record.run_id.trim().is_empty() {
            return Err(SqliteStoreError::Invalid("run_id must be non-empty".to_string()));
        }
        let document =
            serde_json::to_vec(&record.document).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if document.len() > MAX_DOCUMENT_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_DOCUMENT_BYTES,
                actual_bytes: document.len(),
            });
        }
        let digest = sha256_hex(&document);
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO runs (run_id, run_name, started_at, ended_at, status, passed, failed, \
                 skipped, document, document_hash, saved_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, \
                 ?8, ?9, ?10, ?11) ON CONFLICT(run_id) DO UPDATE SET run_name = excluded.run_name, \
                 started_at = excluded.started_at, ended_at = excluded.ended_at, status = \
                 excluded.status, passed = excluded.passed, failed = excluded.failed, skipped = \
                 excluded.skipped, document = excluded.document, document_hash = \
                 excluded.document_hash, saved_at = excluded.saved_at",
                params![
                    record.run_id,
                    record.run_name,
                    record.started_at_ms,
                    record.ended_at_ms,
                    record.status.as_str(),
                    counter_to_sql(record.passed)?,
                    counter_to_sql(record.failed)?,
                    counter_to_sql(record.skipped)?,
                    document,
                    digest,
                    now_ms(),
                ],
            )
            .map_err(db_err)?;
        drop(guard);
        Ok(())
    }

    /// Loads one run record.
    fn load_record(&self, run_id: &str) -> Result<Option<RunRecord>, SqliteStoreError> {
        let row = {
            let mut guard = self.lock()?;
            let tx = guard.transaction().map_err(db_err)?;
            let metadata: Option<(i64, String)> = tx
                .query_row(
                    "SELECT length(document), document_hash FROM runs WHERE run_id = ?1",
                    params![run_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(db_err)?;
            let row = match metadata {
                None => None,
                Some((length, hash)) => {
                    let length = usize::try_from(length).map_err(|_| {
                        SqliteStoreError::Corrupt(format!("negative document length for run {run_id}"))
                    })?;
                    if length > MAX_DOCUMENT_BYTES {
                        return Err(SqliteStoreError::TooLarge {
                            max_bytes: MAX_DOCUMENT_BYTES,
                            actual_bytes: length,
                        });
                    }
                    let (columns, document): (RawListRow, Vec<u8>) = tx
                        .query_row(
                            &format!("SELECT {LIST_COLUMNS}, document FROM runs WHERE run_id = ?1"),
                            params![run_id],
                            |row| Ok((read_list_row(row)?, row.get(8)?)),
                        )
                        .map_err(db_err)?;
                    Some((columns, document, hash))
                }
            };
            tx.commit().map_err(db_err)?;
            drop(guard);
            row
        };
        let Some((columns, document, hash)) = row else {
            return Ok(None);
        };
        if sha256_hex(&document) != hash {
            return Err(SqliteStoreError::Corrupt(format!("hash mismatch for run {run_id}")));
        }
        let document: Value =
            serde_json::from_slice(&document).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let entry = list_entry_from_raw(columns)?;
        if entry.run_id != run_id {
            return Err(SqliteStoreError::Invalid("run_id mismatch between key and row".to_string()));
        }
        Ok(Some(RunRecord {
            run_id: entry.run_id,
            run_name: entry.run_name,
            started_at_ms: entry.started_at_ms,
            ended_at_ms: entry.ended_at_ms,
            status: entry.status,
            passed: entry.passed,
            failed: entry.failed,
            skipped: entry.skipped,
            document,
        }))
    }

    /// Lists runs matching a query.
    fn list_records(&self, query: &RunQuery, now: OffsetDateTime) -> Result<Vec<RunListEntry>, SqliteStoreError> {
        let window = query.filter.bounds(now);
        let from = window.map(|(from, _)| from);
        let to = window.map(|(_, to)| to);
        let pattern = query
            .search
            .as_deref()
            .map(|needle| needle.trim().to_lowercase())
            .filter(|needle| !needle.is_empty())
            .map(|needle| format!("%{}%", escape_like(&needle)));
        let limit = query.limit.map_or(-1, i64::from);
        let direction = match query.sort {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM runs WHERE (?1 IS NULL OR started_at >= ?1) AND (?2 IS \
             NULL OR started_at < ?2) AND (?3 IS NULL OR lower(run_id) LIKE ?3 ESCAPE '\\' OR \
             lower(run_name) LIKE ?3 ESCAPE '\\' OR lower(status) LIKE ?3 ESCAPE '\\') ORDER BY \
             started_at {direction}, run_id {direction} LIMIT ?4 OFFSET ?5"
        );
        let raw_rows = {
            let guard = self.lock()?;
            let mut statement = guard.prepare(&sql).map_err(db_err)?;
            let rows = statement
                .query_map(params![from, to, pattern, limit, i64::from(query.offset)], read_list_row)
                .map_err(db_err)?
                .collect::<Result<Vec<RawListRow>, _>>()
                .map_err(db_err)?;
            drop(statement);
            drop(guard);
            rows
        };
        raw_rows.into_iter().map(list_entry_from_raw).collect()
    }
}

impl RunHistoryStore for SqliteRunStore {
    fn save_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        self.save_record(record).map_err(StoreError::from)
    }

    fn load_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        self.load_record(run_id).map_err(StoreError::from)
    }

    fn list_runs(&self, query: &RunQuery, now: OffsetDateTime) -> Result<Vec<RunListEntry>, StoreError> {
        self.list_records(query, now).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Reads the listing columns of a row.
fn read_list_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawListRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

/// Validates raw listing columns into a listing row.
fn list_entry_from_raw(raw: RawListRow) -> Result<RunListEntry, SqliteStoreError> {
    let (run_id, run_name, started_at_ms, ended_at_ms, status, passed, failed, skipped) = raw;
    let status = RunStatus::parse(&status)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown status `{status}` for run {run_id}")))?;
    let passed = counter_from_sql(passed, &run_id)?;
    let failed = counter_from_sql(failed, &run_id)?;
    let skipped = counter_from_sql(skipped, &run_id)?;
    Ok(RunListEntry {
        run_id,
        run_name,
        started_at_ms,
        ended_at_ms,
        status,
        passed,
        failed,
        skipped,
        total: passed + failed + skipped,
        pass_rate: pass_rate_percent(passed, failed, skipped),
    })
}

/// Converts a counter into its `SQLite` integer form.
fn counter_to_sql(value: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(value).map_err(|_| SqliteStoreError::Invalid("counter exceeds sqlite range".to_string()))
}

/// Converts a stored counter back into `u64`.
fn counter_from_sql(value: i64, run_id: &str) -> Result<u64, SqliteStoreError> {
    u64::try_from(value).map_err(|_| SqliteStoreError::Corrupt(format!("negative counter for run {run_id}")))
}

/// Escapes `LIKE` wildcards with a backslash.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Returns the lowercase hex SHA-256 digest of `bytes`.
fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteStoreError::Invalid("store path must be non-empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid("store path contains an overlong component".to_string()));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_err)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy-timeout settings.
fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_err)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_err)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_err)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_err)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_err)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_err)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_err)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS runs (
                    run_id TEXT PRIMARY KEY,
                    run_name TEXT NOT NULL,
                    started_at INTEGER NOT NULL,
                    ended_at INTEGER,
                    status TEXT NOT NULL,
                    passed INTEGER NOT NULL,
                    failed INTEGER NOT NULL,
                    skipped INTEGER NOT NULL,
                    document BLOB NOT NULL,
                    document_hash TEXT NOT NULL,
                    saved_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs (started_at);",
            )
            .map_err(db_err)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!("unsupported schema version: {value}")));
        }
    }
    tx.commit().map_err(db_err)?;
    Ok(())
}
