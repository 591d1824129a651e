// crates/api-verifier-store-fs/src/store.rs
// ============================================================================
// Module: Filesystem Suite Store
// Description: Directory-backed suite, precheck, and validator persistence.
// Purpose: Map suite paths onto files with strict path and size validation.
// Dependencies: api-verifier-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`FsSuiteStore`] maps a [`SuitePath`] onto `<testcases_dir>/<path>`.
//! Suite paths are validated on construction, so joined paths never escape
//! the root. Writes go to a sibling temporary file and are renamed into
//! place. Tree walks skip symlinks, hidden entries, and non-JSON files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use api_verifier_core::CookieValidator;
use api_verifier_core::FolderNode;
use api_verifier_core::ORDER_FILE_NAME;
use api_verifier_core::PrecheckSet;
use api_verifier_core::PrecheckStore;
use api_verifier_core::StoreError;
use api_verifier_core::SuitePath;
use api_verifier_core::SuiteStore;
use api_verifier_core::TEST_CASE_EXTENSION;
use api_verifier_core::TestCase;
use api_verifier_core::ValidatorStore;
use api_verifier_core::build_tree;
use api_verifier_core::parse_order_file;
use api_verifier_core::render_order_file;
use serde::Serialize;
use serde::de::DeserializeOwned;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File holding the named precheck registry.
pub const PRECHECKS_FILE_NAME: &str = "prechecks.json";
/// File holding the cookie validator reference.
pub const COOKIE_VALIDATOR_FILE_NAME: &str = "cookie-validator.json";
/// Default maximum test-case file size.
const DEFAULT_MAX_TESTCASE_BYTES: usize = 1024 * 1024;
/// Maximum size of a shared config document.
const MAX_CONFIG_DOCUMENT_BYTES: usize = 4 * 1024 * 1024;
/// Maximum size of an order file.
const MAX_ORDER_FILE_BYTES: usize = 256 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Suffix of in-flight temporary files.
const TEMP_SUFFIX: &str = ".tmp";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the filesystem suite store.
#[derive(Debug, Clone)]
pub struct FsStoreConfig {
    /// Root of the suite tree.
    pub testcases_dir: PathBuf,
    /// Directory holding shared config documents.
    pub config_dir: PathBuf,
    /// Maximum size of one test-case file.
    pub max_testcase_bytes: usize,
}

impl FsStoreConfig {
    /// Creates a config with the default size limit.
    #[must_use]
    pub fn new(testcases_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            testcases_dir: testcases_dir.into(),
            config_dir: config_dir.into(),
            max_testcase_bytes: DEFAULT_MAX_TESTCASE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Directory-backed store implementing every authoring store interface.
#[derive(Debug, Clone)]
pub struct FsSuiteStore {
    /// Root of the suite tree.
    root: PathBuf,
    /// Directory holding shared config documents.
    config_dir: PathBuf,
    /// Maximum size of one test-case file.
    max_testcase_bytes: usize,
}

/// Entries found while walking the suite tree.
#[derive(Debug, Default)]
struct WalkResult {
    /// Every folder below the root.
    folders: Vec<SuitePath>,
    /// Every test-case file.
    tests: Vec<SuitePath>,
    /// Explicit orders keyed by folder path (`""` for the root).
    orders: BTreeMap<String, Vec<String>>,
}

impl FsSuiteStore {
    /// Opens a store, creating the test-case root when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for unsafe paths and
    /// [`StoreError::Io`] when the root cannot be created.
    pub fn new(config: FsStoreConfig) -> Result<Self, StoreError> {
        validate_root(&config.testcases_dir)?;
        validate_root(&config.config_dir)?;
        if config.max_testcase_bytes == 0 {
            return Err(StoreError::Invalid("max_testcase_bytes must be greater than zero".to_string()));
        }
        fs::create_dir_all(&config.testcases_dir)
            .map_err(|err| io_error("unable to create testcases dir", &err))?;
        Ok(Self {
            root: config.testcases_dir,
            config_dir: config.config_dir,
            max_testcase_bytes: config.max_testcase_bytes,
        })
    }

    /// Returns the root directory of the suite tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a suite path below the root.
    fn resolve(&self, path: &SuitePath) -> PathBuf {
        let mut resolved = self.root.clone();
        for component in path.components() {
            resolved.push(component);
        }
        resolved
    }

    /// Resolves a folder argument (`None` is the root).
    fn resolve_folder(&self, folder: Option<&SuitePath>) -> PathBuf {
        folder.map_or_else(|| self.root.clone(), |path| self.resolve(path))
    }

    /// Walks the suite tree without following symlinks.
    fn walk(&self) -> Result<WalkResult, StoreError> {
        let mut result = WalkResult::default();
        let mut stack: Vec<(PathBuf, Option<SuitePath>)> = vec![(self.root.clone(), None)];
        while let Some((dir, folder)) = stack.pop() {
            let key = folder.as_ref().map_or_else(String::new, |path| path.as_str().to_string());
            let order = read_order_at(&dir)?;
            if !order.is_empty() {
                result.orders.insert(key, order);
            }
            let entries = fs::read_dir(&dir).map_err(|err| io_error("unable to list folder", &err))?;
            for entry in entries {
                let entry = entry.map_err(|err| io_error("unable to read folder entry", &err))?;
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with('.') || name == ORDER_FILE_NAME {
                    continue;
                }
                let file_type =
                    entry.file_type().map_err(|err| io_error("unable to stat folder entry", &err))?;
                let Ok(path) = child_path(folder.as_ref(), &name) else {
                    continue;
                };
                if file_type.is_dir() {
                    stack.push((entry.path(), Some(path.clone())));
                    result.folders.push(path);
                } else if file_type.is_file() && path.is_test_file() {
                    result.tests.push(path);
                }
            }
        }
        result.tests.sort();
        result.folders.sort();
        Ok(result)
    }
}

impl SuiteStore for FsSuiteStore {
    fn tree(&self) -> Result<FolderNode, StoreError> {
        let walk = self.walk()?;
        Ok(build_tree(walk.folders, walk.tests, &walk.orders))
    }

    fn list_test_paths(&self) -> Result<Vec<SuitePath>, StoreError> {
        Ok(self.walk()?.tests)
    }

    fn read_test_case(&self, path: &SuitePath) -> Result<Option<TestCase>, StoreError> {
        if !path.is_test_file() {
            return Err(StoreError::Invalid(format!("not a test-case path: {path}")));
        }
        let Some(bytes) = read_bounded(&self.resolve(path), self.max_testcase_bytes)? else {
            return Ok(None);
        };
        TestCase::from_slice(&bytes)
            .map(Some)
            .map_err(|err| StoreError::Corrupt(format!("{path}: {err}")))
    }

    fn write_test_case(&self, path: &SuitePath, test_case: &TestCase) -> Result<(), StoreError> {
        if !path.is_test_file() {
            return Err(StoreError::Invalid(format!("not a test-case path: {path}")));
        }
        let bytes = to_json_bytes(test_case)?;
        if bytes.len() > self.max_testcase_bytes {
            return Err(StoreError::Invalid(format!(
                "{path} exceeds size limit: {} bytes (max {})",
                bytes.len(),
                self.max_testcase_bytes
            )));
        }
        write_atomic(&self.resolve(path), &bytes)
    }

    fn delete_test_case(&self, path: &SuitePath) -> Result<bool, StoreError> {
        if !path.is_test_file() {
            return Err(StoreError::Invalid(format!("not a test-case path: {path}")));
        }
        match fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error(&format!("unable to delete {path}"), &err)),
        }
    }

    fn move_entry(&self, from: &SuitePath, to: &SuitePath) -> Result<(), StoreError> {
        let source = self.resolve(from);
        let target = self.resolve(to);
        if fs::symlink_metadata(&source).is_err() {
            return Err(StoreError::NotFound(from.to_string()));
        }
        if fs::symlink_metadata(&target).is_ok() {
            return Err(StoreError::Conflict(to.to_string()));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error("unable to create target folder", &err))?;
        }
        fs::rename(&source, &target).map_err(|err| io_error(&format!("unable to move {from}"), &err))
    }

    fn create_folder(&self, path: &SuitePath) -> Result<(), StoreError> {
        if path.is_test_file() {
            return Err(StoreError::Invalid(format!("folder name must not end in {TEST_CASE_EXTENSION}")));
        }
        fs::create_dir_all(self.resolve(path)).map_err(|err| io_error(&format!("unable to create {path}"), &err))
    }

    fn delete_folder(&self, path: &SuitePath) -> Result<(), StoreError> {
        let dir = self.resolve(path);
        match fs::symlink_metadata(&dir) {
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(&dir).map_err(|err| io_error(&format!("unable to delete {path}"), &err))
            }
            _ => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn read_order(&self, folder: Option<&SuitePath>) -> Result<Vec<String>, StoreError> {
        read_order_at(&self.resolve_folder(folder))
    }

    fn write_order(&self, folder: Option<&SuitePath>, names: &[String]) -> Result<(), StoreError> {
        let dir = self.resolve_folder(folder);
        write_atomic(&dir.join(ORDER_FILE_NAME), render_order_file(names).as_bytes())
    }
}

impl PrecheckStore for FsSuiteStore {
    fn load_prechecks(&self) -> Result<PrecheckSet, StoreError> {
        Ok(read_json(&self.config_dir.join(PRECHECKS_FILE_NAME))?.unwrap_or_default())
    }

    fn save_prechecks(&self, prechecks: &PrecheckSet) -> Result<(), StoreError> {
        write_atomic(&self.config_dir.join(PRECHECKS_FILE_NAME), &to_json_bytes(prechecks)?)
    }
}

impl ValidatorStore for FsSuiteStore {
    fn load_validator(&self) -> Result<Option<CookieValidator>, StoreError> {
        read_json(&self.config_dir.join(COOKIE_VALIDATOR_FILE_NAME))
    }

    fn save_validator(&self, validator: &CookieValidator) -> Result<(), StoreError> {
        write_atomic(&self.config_dir.join(COOKIE_VALIDATOR_FILE_NAME), &to_json_bytes(validator)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the suite path of a directory entry.
fn child_path(folder: Option<&SuitePath>, name: &str) -> Result<SuitePath, StoreError> {
    let parsed = match folder {
        Some(folder) => folder.join(name),
        None => SuitePath::parse(name),
    };
    parsed.map_err(|err| StoreError::Invalid(err.to_string()))
}

/// Reads the order file of a directory; missing files yield an empty order.
fn read_order_at(dir: &Path) -> Result<Vec<String>, StoreError> {
    let Some(bytes) = read_bounded(&dir.join(ORDER_FILE_NAME), MAX_ORDER_FILE_BYTES)? else {
        return Ok(Vec::new());
    };
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| StoreError::Corrupt(format!("{} must be utf-8", dir.join(ORDER_FILE_NAME).display())))?;
    Ok(parse_order_file(text))
}

/// Reads a JSON document; missing files yield `None`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let Some(bytes) = read_bounded(path, MAX_CONFIG_DOCUMENT_BYTES)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| StoreError::Corrupt(format!("{}: {err}", path.display())))
}

/// Serializes a value as pretty JSON with a trailing newline.
fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|err| StoreError::Invalid(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Reads a regular file up to `max_bytes`; missing files yield `None`.
fn read_bounded(path: &Path, max_bytes: usize) -> Result<Option<Vec<u8>>, StoreError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(&format!("unable to stat {}", path.display()), &err)),
    };
    if !meta.is_file() {
        return Err(StoreError::Invalid(format!("{} is not a regular file", path.display())));
    }
    let size = usize::try_from(meta.len()).unwrap_or(usize::MAX);
    if size > max_bytes {
        return Err(StoreError::Invalid(format!(
            "{} exceeds size limit: {size} bytes (max {max_bytes})",
            path.display()
        )));
    }
    fs::read(path).map(Some).map_err(|err| io_error(&format!("unable to read {}", path.display()), &err))
}

/// Writes `bytes` to a temporary sibling and renames it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Invalid(format!("{} has no parent directory", path.display())))?;
    fs::create_dir_all(parent).map_err(|err| io_error("unable to create parent directory", &err))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::Invalid(format!("{} has no file name", path.display())))?;
    let temp = parent.join(format!(".{}{TEMP_SUFFIX}", file_name.to_string_lossy()));
    fs::write(&temp, bytes).map_err(|err| io_error(&format!("unable to write {}", temp.display()), &err))?;
    fs::rename(&temp, path).map_err(|err| {
        let _ = fs::remove_file(&temp);
        io_error(&format!("unable to replace {}", path.display()), &err)
    })
}

/// Validates a configured root directory against length limits.
fn validate_root(path: &Path) -> Result<(), StoreError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(StoreError::Invalid("store directory must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StoreError::Invalid("store directory exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StoreError::Invalid("store directory component too long".to_string()));
        }
    }
    Ok(())
}

/// Formats an I/O error with context.
fn io_error(context: &str, err: &io::Error) -> StoreError {
    StoreError::Io(format!("{context}: {err}"))
}
