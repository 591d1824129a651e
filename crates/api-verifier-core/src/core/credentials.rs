// crates/api-verifier-core/src/core/credentials.rs
// ============================================================================
// Module: API Verifier Credential Rows
// Description: Cleaning of uploaded account/credential tables.
// Purpose: Turn raw tabular rows into validated accounts with extra headers.
// Dependencies: crate::core::identifiers, csv, serde, thiserror
// ============================================================================

//! ## Overview
//! A credential upload is a table with one account per row. Column names
//! are matched case-insensitively after trimming; `account name`,
//! `base url`, and `cookie` are required and every other non-blank column
//! becomes an extra header attached to the account.
//!
//! Rows that are entirely blank are skipped silently. Rows missing any of
//! the three required values are excluded and counted invalid.
//!
//! Security posture: uploads are untrusted; the CSV reader enforces a byte
//! limit supplied by the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::AccountId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required column holding the account display name.
pub const ACCOUNT_NAME_COLUMN: &str = "account name";
/// Required column holding the base URL.
pub const BASE_URL_COLUMN: &str = "base url";
/// Required column holding the cookie.
pub const COOKIE_COLUMN: &str = "cookie";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One cleaned credential row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRow {
    /// Account display name.
    #[serde(rename = "account name")]
    pub account_name: String,
    /// Base URL requests are issued against.
    #[serde(rename = "base url")]
    pub base_url: String,
    /// Cookie sent with every request.
    pub cookie: String,
    /// Extra headers keyed by their original column name.
    #[serde(flatten)]
    pub headers: BTreeMap<String, String>,
}

impl CredentialRow {
    /// Returns the stable account id for this row.
    #[must_use]
    pub fn account_id(&self, row_index: usize) -> AccountId {
        AccountId::derive(&self.account_name, Some(&self.cookie), row_index)
    }
}

/// Result of cleaning a credential upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    /// Valid rows in upload order.
    pub rows: Vec<CredentialRow>,
    /// Number of valid rows.
    pub valid: usize,
    /// Number of non-blank rows missing a required value.
    pub invalid: usize,
}

/// Errors raised while reading a credential upload.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The upload exceeds the byte limit.
    #[error("credential upload exceeds {max_bytes} bytes (actual: {actual_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual upload size.
        actual_bytes: usize,
    },
    /// The upload is not valid CSV.
    #[error("credential upload is not valid CSV: {0}")]
    Csv(String),
}

// ============================================================================
// SECTION: Cleaning
// ============================================================================

/// Cleans raw rows given as `(column, value)` pairs.
#[must_use]
pub fn clean_credential_rows<R, C>(rows: R) -> CleanReport
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = (String, String)>,
{
    let mut report = CleanReport::default();
    for raw in rows {
        let mut account_name = None;
        let mut base_url = None;
        let mut cookie = None;
        let mut headers = BTreeMap::new();
        let mut blank = true;
        for (column, value) in raw {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            blank = false;
            let column = column.trim();
            match column.to_lowercase().as_str() {
                ACCOUNT_NAME_COLUMN => account_name = Some(value.to_string()),
                BASE_URL_COLUMN => base_url = Some(value.to_string()),
                COOKIE_COLUMN => cookie = Some(value.to_string()),
                "" => {}
                _ => {
                    headers.insert(column.to_string(), value.to_string());
                }
            }
        }
        if blank {
            continue;
        }
        match (account_name, base_url, cookie) {
            (Some(account_name), Some(base_url), Some(cookie)) => {
                report.rows.push(CredentialRow {
                    account_name,
                    base_url,
                    cookie,
                    headers,
                });
                report.valid += 1;
            }
            _ => report.invalid += 1,
        }
    }
    report
}

/// Parses and cleans a CSV credential upload with a header row.
///
/// # Errors
///
/// Returns [`CredentialError`] when the upload exceeds `max_bytes` or is
/// not valid CSV.
pub fn parse_credentials_csv(bytes: &[u8], max_bytes: usize) -> Result<CleanReport, CredentialError> {
    if bytes.len() > max_bytes {
        return Err(CredentialError::TooLarge {
            max_bytes,
            actual_bytes: bytes.len(),
        });
    }
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(bytes);
    let headers = reader.headers().map_err(|err| CredentialError::Csv(err.to_string()))?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| CredentialError::Csv(err.to_string()))?;
        let row: Vec<(String, String)> = headers
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(clean_credential_rows(rows))
}
