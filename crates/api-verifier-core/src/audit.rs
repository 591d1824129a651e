// crates/api-verifier-core/src/audit.rs
// ============================================================================
// Module: API Verifier Audit Logging
// Description: Structured audit events for authoring, cascades, and aggregation.
// Purpose: Emit JSON-lines audit records without a logging framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every mutation performed by the authoring service and every aggregation
//! pass emits one audit event. Sinks serialize events as single JSON lines
//! so deployments can route them to any log pipeline. Credentials never
//! appear in events: accounts are referenced by their derived ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label recorded on audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Failure,
    /// The operation completed with some failed items.
    Partial,
}

/// Authoring operation audit payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuthoringAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Operation label (`create`, `update`, `rename`, ...).
    pub operation: &'static str,
    /// Target path or name.
    pub target: String,
    /// Test-case id when known.
    pub id: Option<i64>,
    /// Operation outcome.
    pub outcome: AuditOutcome,
    /// Error message on failure.
    pub error: Option<String>,
}

/// Inputs for [`AuthoringAuditEvent::new`].
#[derive(Debug, Clone)]
pub struct AuthoringAuditEventParams {
    /// Operation label.
    pub operation: &'static str,
    /// Target path or name.
    pub target: String,
    /// Test-case id when known.
    pub id: Option<i64>,
    /// Operation outcome.
    pub outcome: AuditOutcome,
    /// Error message on failure.
    pub error: Option<String>,
}

impl AuthoringAuditEvent {
    /// Creates a new authoring audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: AuthoringAuditEventParams) -> Self {
        Self {
            event: "authoring_audit",
            timestamp_ms: timestamp_ms(),
            operation: params.operation,
            target: params.target,
            id: params.id,
            outcome: params.outcome,
            error: params.error,
        }
    }
}

/// Cascade delete audit payload.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Suite the cascade ran in.
    pub suite: String,
    /// Root id of the cascade.
    pub root_id: i64,
    /// Test cases deleted.
    pub deleted: usize,
    /// Items (deletions or cleanups) that failed.
    pub failed: usize,
    /// Overall outcome.
    pub outcome: AuditOutcome,
}

/// Inputs for [`CascadeAuditEvent::new`].
#[derive(Debug, Clone)]
pub struct CascadeAuditEventParams {
    /// Suite the cascade ran in.
    pub suite: String,
    /// Root id of the cascade.
    pub root_id: i64,
    /// Test cases deleted.
    pub deleted: usize,
    /// Items that failed.
    pub failed: usize,
}

impl CascadeAuditEvent {
    /// Creates a new cascade audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: CascadeAuditEventParams) -> Self {
        let outcome = match (params.deleted, params.failed) {
            (_, 0) => AuditOutcome::Success,
            (0, _) => AuditOutcome::Failure,
            _ => AuditOutcome::Partial,
        };
        Self {
            event: "cascade_audit",
            timestamp_ms: timestamp_ms(),
            suite: params.suite,
            root_id: params.root_id,
            deleted: params.deleted,
            failed: params.failed,
            outcome,
        }
    }
}

/// Aggregation audit payload.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run id when the summary was stored.
    pub run_id: Option<String>,
    /// Suites aggregated.
    pub suites: u64,
    /// Accounts aggregated.
    pub accounts: u64,
    /// Executions observed.
    pub executions: u64,
    /// Failed executions observed.
    pub failed_executions: u64,
}

/// Inputs for [`AggregationAuditEvent::new`].
#[derive(Debug, Clone)]
pub struct AggregationAuditEventParams {
    /// Run id when the summary was stored.
    pub run_id: Option<String>,
    /// Suites aggregated.
    pub suites: u64,
    /// Accounts aggregated.
    pub accounts: u64,
    /// Executions observed.
    pub executions: u64,
    /// Failed executions observed.
    pub failed_executions: u64,
}

impl AggregationAuditEvent {
    /// Creates a new aggregation audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: AggregationAuditEventParams) -> Self {
        Self {
            event: "aggregation_audit",
            timestamp_ms: timestamp_ms(),
            run_id: params.run_id,
            suites: params.suites,
            accounts: params.accounts,
            executions: params.executions,
            failed_executions: params.failed_executions,
        }
    }
}

/// Returns milliseconds since the Unix epoch.
fn timestamp_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for API verifier events.
pub trait AuditSink: Send + Sync {
    /// Records an authoring event.
    fn record_authoring(&self, _event: &AuthoringAuditEvent) {}

    /// Records a cascade delete event.
    fn record_cascade(&self, _event: &CascadeAuditEvent) {}

    /// Records an aggregation event.
    fn record_aggregation(&self, _event: &AggregationAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl StderrAuditSink {
    /// Writes one serialized event to stderr.
    fn emit<T: Serialize>(event: &T) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

impl AuditSink for StderrAuditSink {
    fn record_authoring(&self, event: &AuthoringAuditEvent) {
        Self::emit(event);
    }

    fn record_cascade(&self, event: &CascadeAuditEvent) {
        Self::emit(event);
    }

    fn record_aggregation(&self, event: &AggregationAuditEvent) {
        Self::emit(event);
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn emit<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_authoring(&self, event: &AuthoringAuditEvent) {
        self.emit(event);
    }

    fn record_cascade(&self, event: &CascadeAuditEvent) {
        self.emit(event);
    }

    fn record_aggregation(&self, event: &AggregationAuditEvent) {
        self.emit(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {}

/// Audit sink that keeps serialized events in memory.
#[derive(Default)]
pub struct InMemoryAuditSink {
    /// Captured JSON lines.
    lines: Mutex<Vec<String>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// Captures one serialized event.
    fn emit<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut lines) = self.lines.lock()
        {
            lines.push(payload);
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record_authoring(&self, event: &AuthoringAuditEvent) {
        self.emit(event);
    }

    fn record_cascade(&self, event: &CascadeAuditEvent) {
        self.emit(event);
    }

    fn record_aggregation(&self, event: &AggregationAuditEvent) {
        self.emit(event);
    }
}
