// crates/api-verifier-config/src/config.rs
// ============================================================================
// Module: API Verifier Configuration
// Description: Configuration loading and validation for the API verifier.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: api-verifier-core, api-verifier-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected and every section is validated after parsing;
//! missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use api_verifier_core::runtime::DEFAULT_FIRST_ID;
use api_verifier_store_sqlite::SqliteStoreConfig;
use api_verifier_store_sqlite::SqliteStoreMode;
use api_verifier_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "api-verifier.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "API_VERIFIER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default test-case directory.
pub(crate) const DEFAULT_TESTCASES_DIR: &str = "testcases";
/// Default shared config directory (prechecks, cookie validator).
pub(crate) const DEFAULT_CONFIG_DIR: &str = "config";
/// Default `SQLite` busy timeout (ms).
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout (ms).
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Default maximum size of one test-case file.
pub(crate) const DEFAULT_MAX_TESTCASE_BYTES: usize = 1024 * 1024;
/// Hard maximum for `limits.max_testcase_bytes`.
pub(crate) const MAX_MAX_TESTCASE_BYTES: usize = 16 * 1024 * 1024;
/// Default maximum size of a raw results document.
pub(crate) const DEFAULT_MAX_RESULTS_BYTES: usize = 64 * 1024 * 1024;
/// Hard maximum for `limits.max_results_bytes`.
pub(crate) const MAX_MAX_RESULTS_BYTES: usize = 512 * 1024 * 1024;
/// Default maximum size of a credentials CSV upload.
pub(crate) const DEFAULT_MAX_CSV_BYTES: usize = 5 * 1024 * 1024;
/// Hard maximum for `limits.max_csv_bytes`.
pub(crate) const MAX_MAX_CSV_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// API verifier configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiVerifierConfig {
    /// Suite and shared-config storage locations.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Run history store configuration.
    #[serde(default)]
    pub run_store: RunStoreConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Input size limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Test-case id assignment.
    #[serde(default)]
    pub ids: IdsConfig,
}

impl ApiVerifierConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path comes from `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.run_store.validate()?;
        self.audit.validate()?;
        self.limits.validate()?;
        self.ids.validate()?;
        Ok(())
    }
}

/// Storage locations for suites and shared config.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory of the suite tree.
    #[serde(default = "default_testcases_dir")]
    pub testcases_dir: PathBuf,
    /// Directory holding `prechecks.json` and `cookie-validator.json`.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            testcases_dir: default_testcases_dir(),
            config_dir: default_config_dir(),
        }
    }
}

impl StorageConfig {
    /// Validates storage paths.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("storage.testcases_dir", &self.testcases_dir.to_string_lossy())?;
        validate_path_string("storage.config_dir", &self.config_dir.to_string_lossy())?;
        Ok(())
    }
}

/// Run history store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: RunStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for RunStoreConfig {
    fn default() -> Self {
        Self {
            store_type: RunStoreType::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl RunStoreConfig {
    /// Validates run store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "run_store.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        match self.store_type {
            RunStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory run_store must not set path".to_string()));
                }
                Ok(())
            }
            RunStoreType::Sqlite => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("sqlite run_store requires path".to_string()))?;
                validate_path_string("run_store.path", &path.to_string_lossy())
            }
        }
    }

    /// Returns the `SQLite` store config when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (RunStoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }
}

/// Run history backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStoreType {
    /// Keep run history in memory for the life of the process.
    #[default]
    Memory,
    /// Persist run history to `SQLite`.
    Sqlite,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink receiving JSON-lines audit events.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Output path when `sink = "file"`.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink=file requires audit.path".to_string()))
            }
            (_, Some(_)) => Err(ConfigError::Invalid("audit.path only allowed when audit.sink=file".to_string())),
            (_, None) => Ok(()),
        }
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard audit events.
    #[serde(rename = "none")]
    Disabled,
}

/// Hard input limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum size of one test-case file in bytes.
    #[serde(default = "default_max_testcase_bytes")]
    pub max_testcase_bytes: usize,
    /// Maximum size of a raw results document in bytes.
    #[serde(default = "default_max_results_bytes")]
    pub max_results_bytes: usize,
    /// Maximum size of a credentials CSV upload in bytes.
    #[serde(default = "default_max_csv_bytes")]
    pub max_csv_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_testcase_bytes: default_max_testcase_bytes(),
            max_results_bytes: default_max_results_bytes(),
            max_csv_bytes: default_max_csv_bytes(),
        }
    }
}

impl LimitsConfig {
    /// Validates every limit against its hard bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_limit("limits.max_testcase_bytes", self.max_testcase_bytes, MAX_MAX_TESTCASE_BYTES)?;
        validate_limit("limits.max_results_bytes", self.max_results_bytes, MAX_MAX_RESULTS_BYTES)?;
        validate_limit("limits.max_csv_bytes", self.max_csv_bytes, MAX_MAX_CSV_BYTES)?;
        Ok(())
    }
}

/// Test-case id assignment configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdsConfig {
    /// Id given to the first test case of an empty store.
    #[serde(default = "default_first_id")]
    pub first_id: i64,
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            first_id: default_first_id(),
        }
    }
}

impl IdsConfig {
    /// Validates id assignment.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.first_id < 1 {
            return Err(ConfigError::Invalid("ids.first_id must be positive".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a byte limit lies within `1 ..= max`.
fn validate_limit(field: &str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between 1 and {max}")));
    }
    Ok(())
}

/// Default test-case directory.
fn default_testcases_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TESTCASES_DIR)
}

/// Default shared config directory.
fn default_config_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_DIR)
}

/// Default `SQLite` busy timeout.
pub(crate) const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default test-case size limit.
pub(crate) const fn default_max_testcase_bytes() -> usize {
    DEFAULT_MAX_TESTCASE_BYTES
}

/// Default results size limit.
pub(crate) const fn default_max_results_bytes() -> usize {
    DEFAULT_MAX_RESULTS_BYTES
}

/// Default CSV size limit.
pub(crate) const fn default_max_csv_bytes() -> usize {
    DEFAULT_MAX_CSV_BYTES
}

/// Default first id.
pub(crate) const fn default_first_id() -> i64 {
    DEFAULT_FIRST_ID
}
