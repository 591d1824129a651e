// crates/api-verifier-core/src/core/history.rs
// ============================================================================
// Module: API Verifier Run History
// Description: Persisted run records and history queries.
// Purpose: Define run records plus the filter, search, sort, and paging model.
// Dependencies: crate::core::summary, serde, serde_json, time
// ============================================================================

//! ## Overview
//! A [`RunRecord`] stores one completed run: its counters, status, and the
//! full summary/details document. [`RunQuery`] selects records by date
//! window (UTC days), case-insensitive search over id, name, and status,
//! sort order by start time, and paging.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::Date;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::core::summary::RunStatus;
use crate::core::summary::RunSummary;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds per day.
const MILLIS_PER_DAY: i64 = 86_400_000;
/// Calendar date format used by range filters.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Records
// ============================================================================

/// One persisted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Unique run id.
    pub run_id: String,
    /// Display name.
    pub run_name: String,
    /// Start time in unix milliseconds.
    pub started_at_ms: i64,
    /// End time in unix milliseconds.
    pub ended_at_ms: Option<i64>,
    /// Run status.
    pub status: RunStatus,
    /// Passed executions.
    pub passed: u64,
    /// Failed executions.
    pub failed: u64,
    /// Skipped executions.
    pub skipped: u64,
    /// Summary and details document.
    pub document: Value,
}

impl RunRecord {
    /// Builds a record from a summary and its raw details document.
    #[must_use]
    pub fn from_summary(
        run_id: impl Into<String>,
        run_name: impl Into<String>,
        started_at_ms: i64,
        ended_at_ms: Option<i64>,
        summary: &RunSummary,
        details: Value,
    ) -> Self {
        let executions = summary.overall.executions;
        let document = serde_json::json!({
            "summary": summary,
            "details": details,
        });
        Self {
            run_id: run_id.into(),
            run_name: run_name.into(),
            started_at_ms,
            ended_at_ms,
            status: summary.status(),
            passed: executions.passed_executions_observed,
            failed: executions.failed_executions_observed,
            skipped: executions.skipped_executions_observed,
            document,
        }
    }

    /// Returns the list row for this record.
    #[must_use]
    pub fn list_entry(&self) -> RunListEntry {
        RunListEntry {
            run_id: self.run_id.clone(),
            run_name: self.run_name.clone(),
            started_at_ms: self.started_at_ms,
            ended_at_ms: self.ended_at_ms,
            status: self.status,
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            total: self.passed + self.failed + self.skipped,
            pass_rate: pass_rate_percent(self.passed, self.failed, self.skipped),
        }
    }
}

/// One row of a run listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunListEntry {
    /// Run id.
    pub run_id: String,
    /// Display name.
    pub run_name: String,
    /// Start time in unix milliseconds.
    pub started_at_ms: i64,
    /// End time in unix milliseconds.
    pub ended_at_ms: Option<i64>,
    /// Run status.
    pub status: RunStatus,
    /// Passed executions.
    pub passed: u64,
    /// Failed executions.
    pub failed: u64,
    /// Skipped executions.
    pub skipped: u64,
    /// Total executions.
    pub total: u64,
    /// Pass rate in percent.
    pub pass_rate: f64,
}

impl RunListEntry {
    /// Returns true when `needle` occurs in the id, name, or status (case-insensitive).
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [self.run_id.as_str(), self.run_name.as_str(), self.status.as_str()]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Returns `passed / total * 100`, or 0 when there were no executions.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Counters stay far below 2^52.")]
pub fn pass_rate_percent(passed: u64, failed: u64, skipped: u64) -> f64 {
    let total = passed + failed + skipped;
    if total == 0 { 0.0 } else { passed as f64 / total as f64 * 100.0 }
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Date window of a history query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunFilter {
    /// Every run.
    #[default]
    All,
    /// Runs started today (UTC).
    Today,
    /// Runs started yesterday (UTC).
    Yesterday,
    /// Runs started within the last seven days, today included.
    Last7,
    /// Runs started within the last thirty days, today included.
    Last30,
    /// Runs started between two dates, both inclusive.
    Range {
        /// First day.
        start: Date,
        /// Last day.
        end: Date,
    },
}

impl RunFilter {
    /// Parses `all|today|yesterday|last7|last30` or `YYYY-MM-DD..YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns a message when the filter is not recognized or the range is inverted.
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "last7" => Ok(Self::Last7),
            "last30" => Ok(Self::Last30),
            other => {
                let (start, end) = other
                    .split_once("..")
                    .ok_or_else(|| format!("unknown run filter `{raw}`"))?;
                let start = Date::parse(start.trim(), DATE_FORMAT)
                    .map_err(|err| format!("invalid start date: {err}"))?;
                let end = Date::parse(end.trim(), DATE_FORMAT)
                    .map_err(|err| format!("invalid end date: {err}"))?;
                if end < start {
                    return Err("end date precedes start date".to_string());
                }
                Ok(Self::Range {
                    start,
                    end,
                })
            }
        }
    }

    /// Returns the half-open `[from, to)` millisecond window relative to `now`.
    #[must_use]
    pub fn bounds(self, now: OffsetDateTime) -> Option<(i64, i64)> {
        let today = day_start_ms(now.date());
        let tomorrow = today + MILLIS_PER_DAY;
        match self {
            Self::All => None,
            Self::Today => Some((today, tomorrow)),
            Self::Yesterday => Some((today - MILLIS_PER_DAY, today)),
            Self::Last7 => Some((today - 6 * MILLIS_PER_DAY, tomorrow)),
            Self::Last30 => Some((today - 29 * MILLIS_PER_DAY, tomorrow)),
            Self::Range {
                start,
                end,
            } => Some((day_start_ms(start), day_start_ms(end) + MILLIS_PER_DAY)),
        }
    }
}

/// Returns the unix milliseconds of a UTC midnight.
fn day_start_ms(date: Date) -> i64 {
    let seconds = date.midnight().assume_utc().unix_timestamp();
    seconds * 1000
}

/// Returns the current time in unix milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    let now = OffsetDateTime::now_utc();
    now.unix_timestamp() * 1000 + i64::from(now.millisecond())
}

/// Sort order of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses `asc` or `desc`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// History query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunQuery {
    /// Date window.
    pub filter: RunFilter,
    /// Case-insensitive search text.
    pub search: Option<String>,
    /// Sort order by start time.
    pub sort: SortOrder,
    /// Maximum rows; `None` means unbounded.
    pub limit: Option<u32>,
    /// Rows skipped before the first returned row.
    pub offset: u32,
}
