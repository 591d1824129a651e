// crates/api-verifier-cli/src/main.rs
// ============================================================================
// Module: API Verifier CLI Entry Point
// Description: Command dispatcher for suite authoring, results, and history.
// Purpose: Provide a safe, JSON-emitting CLI over the verifier stores.
// Dependencies: clap, api-verifier-{core,config,store-fs,store-sqlite}, serde, tokio.
// ============================================================================

//! ## Overview
//! The API verifier CLI authors test suites stored as JSON files, summarizes
//! raw run results, and browses run history. Results are written to stdout as
//! JSON; errors go to stderr with a failing exit code. All user-facing strings
//! are routed through the message catalog.
//!
//! Inputs are untrusted: every file read is size-bounded and every suite path
//! is validated before it reaches a store.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use api_verifier_cli::t;
use api_verifier_config::ApiVerifierConfig;
use api_verifier_config::AuditConfig;
use api_verifier_config::AuditSinkKind;
use api_verifier_core::AuditSink;
use api_verifier_core::Authoring;
use api_verifier_core::AuthoringError;
use api_verifier_core::AuthoringSession;
use api_verifier_core::DependencyGraph;
use api_verifier_core::FileAuditSink;
use api_verifier_core::InMemoryRunHistoryStore;
use api_verifier_core::NoopAuditSink;
use api_verifier_core::RawRun;
use api_verifier_core::RunFilter;
use api_verifier_core::RunHistoryStore;
use api_verifier_core::RunQuery;
use api_verifier_core::RunRecord;
use api_verifier_core::SortOrder;
use api_verifier_core::StderrAuditSink;
use api_verifier_core::SuiteKey;
use api_verifier_core::SuitePath;
use api_verifier_core::SuiteSnapshot;
use api_verifier_core::SuiteStore;
use api_verifier_core::TestCase;
use api_verifier_core::TestCaseId;
use api_verifier_core::aggregate;
use api_verifier_core::now_ms;
use api_verifier_core::parse_credentials_csv;
use api_verifier_core::runtime::aggregation_event;
use api_verifier_core::runtime::compute_descendants;
use api_verifier_core::runtime::group_executions;
use api_verifier_core::runtime::sort_by_file_order;
use api_verifier_core::validate_check_draft;
use api_verifier_store_fs::FsStoreConfig;
use api_verifier_store_fs::FsSuiteStore;
use api_verifier_store_sqlite::SqliteRunStore;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::task::JoinSet;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of inline JSON arguments (check fields, precheck rules).
const MAX_INLINE_JSON_BYTES: usize = 256 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "api-verifier", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to env or api-verifier.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Suite tree inspection.
    Suite {
        /// Selected suite subcommand.
        #[command(subcommand)]
        command: SuiteCommand,
    },
    /// Test-case authoring.
    Testcase {
        /// Selected test-case subcommand.
        #[command(subcommand)]
        command: TestcaseCommand,
    },
    /// Folder authoring.
    Folder {
        /// Selected folder subcommand.
        #[command(subcommand)]
        command: FolderCommand,
    },
    /// Precheck rule authoring.
    Precheck {
        /// Selected precheck subcommand.
        #[command(subcommand)]
        command: PrecheckCommand,
    },
    /// Cookie validator reference.
    Validator {
        /// Selected validator subcommand.
        #[command(subcommand)]
        command: ValidatorCommand,
    },
    /// Check draft validation.
    Check {
        /// Selected check subcommand.
        #[command(subcommand)]
        command: CheckCommand,
    },
    /// Credential upload cleaning.
    Credentials {
        /// Selected credentials subcommand.
        #[command(subcommand)]
        command: CredentialsCommand,
    },
    /// Raw results aggregation and display.
    Results {
        /// Selected results subcommand.
        #[command(subcommand)]
        command: ResultsCommand,
    },
    /// Run history browsing.
    Runs {
        /// Selected runs subcommand.
        #[command(subcommand)]
        command: RunsCommand,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
}

/// Suite subcommands.
#[derive(Subcommand, Debug)]
enum SuiteCommand {
    /// Print the ordered folder tree.
    Tree {
        /// Restrict output to one suite.
        #[arg(long)]
        suite: Option<String>,
    },
    /// Report dangling parents, cycles, and duplicate ids in a suite.
    Issues {
        /// Suite to inspect.
        #[arg(long)]
        suite: String,
    },
}

/// Test-case subcommands.
#[derive(Subcommand, Debug)]
enum TestcaseCommand {
    /// Print one test case.
    Show(PathArg),
    /// Create a test case from a JSON file.
    Create(TestcaseWriteCommand),
    /// Replace a test case from a JSON file.
    Update(TestcaseWriteCommand),
    /// Delete a test case and its descendants.
    Delete(PathArg),
    /// Rename a test case file.
    Rename(RenameCommand),
    /// Move a test case within its suite.
    Move(MoveCommand),
    /// List the descendants of a test case.
    Descendants(DescendantsCommand),
    /// Print the id the next created test case receives.
    NextId,
}

/// Folder subcommands.
#[derive(Subcommand, Debug)]
enum FolderCommand {
    /// Create a folder.
    Create(PathArg),
    /// Rename a folder.
    Rename(RenameCommand),
    /// Delete a folder and everything below it.
    Delete(PathArg),
    /// Print or replace a folder's explicit sibling order.
    Order(OrderCommand),
}

/// Precheck subcommands.
#[derive(Subcommand, Debug)]
enum PrecheckCommand {
    /// List every precheck rule.
    List,
    /// Create a precheck rule.
    Create(PrecheckWriteCommand),
    /// Replace a precheck rule.
    Update(PrecheckWriteCommand),
    /// Delete a precheck rule.
    Delete {
        /// Precheck name.
        name: String,
    },
}

/// Cookie validator subcommands.
#[derive(Subcommand, Debug)]
enum ValidatorCommand {
    /// Print the cookie validator reference.
    Get,
    /// Point the cookie validator at a test case.
    Set(PathArg),
}

/// Check subcommands.
#[derive(Subcommand, Debug)]
enum CheckCommand {
    /// Validate a check draft.
    Validate(CheckValidateCommand),
}

/// Credentials subcommands.
#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// Clean a credentials CSV upload.
    Clean {
        /// CSV file path.
        csv: PathBuf,
    },
}

/// Results subcommands.
#[derive(Subcommand, Debug)]
enum ResultsCommand {
    /// Aggregate a raw results document.
    Summarize(SummarizeCommand),
    /// Group one test case's results by execution.
    Group(GroupCommand),
}

/// Run history subcommands.
#[derive(Subcommand, Debug)]
enum RunsCommand {
    /// List stored runs.
    List(RunsListCommand),
    /// Print one stored run.
    Show {
        /// Run id.
        run_id: String,
    },
}

/// Single suite path argument.
#[derive(Args, Debug)]
struct PathArg {
    /// Store-relative path (`suite/folder/name.json`).
    path: String,
}

/// Arguments for writing a test case.
#[derive(Args, Debug)]
struct TestcaseWriteCommand {
    /// Store-relative test-case path.
    path: String,
    /// JSON file holding the test-case definition.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
}

/// Arguments for renames.
#[derive(Args, Debug)]
struct RenameCommand {
    /// Store-relative path to rename.
    path: String,
    /// New file or folder name.
    #[arg(long)]
    name: String,
}

/// Arguments for moves.
#[derive(Args, Debug)]
struct MoveCommand {
    /// Current store-relative path.
    from: String,
    /// Target store-relative path.
    to: String,
}

/// Arguments for descendant listing.
#[derive(Args, Debug)]
struct DescendantsCommand {
    /// Suite holding the test case.
    #[arg(long)]
    suite: String,
    /// Root test-case id.
    #[arg(long)]
    id: i64,
}

/// Arguments for folder ordering.
#[derive(Args, Debug)]
struct OrderCommand {
    /// Folder path; omit for the store root.
    path: Option<String>,
    /// Replace the order with these comma-separated names.
    #[arg(long, value_delimiter = ',')]
    set: Option<Vec<String>>,
}

/// Arguments for writing a precheck rule.
#[derive(Args, Debug)]
struct PrecheckWriteCommand {
    /// Precheck name.
    name: String,
    /// Rule definition as inline JSON.
    #[arg(long)]
    rule: String,
}

/// Arguments for check draft validation.
#[derive(Args, Debug)]
struct CheckValidateCommand {
    /// Check kind (`patternMatch`, `keyValue`, `fieldExistence`, `valueMatch`).
    #[arg(long = "type")]
    kind: String,
    /// Check fields as an inline JSON object.
    #[arg(long)]
    fields: String,
    /// Accept a check whose path is empty.
    #[arg(long)]
    confirm_empty_path: bool,
}

/// Arguments for results aggregation.
#[derive(Args, Debug)]
struct SummarizeCommand {
    /// Raw results JSON file.
    input: PathBuf,
    /// Save the run to history.
    #[arg(long)]
    store: bool,
    /// Display name recorded with the run.
    #[arg(long)]
    run_name: Option<String>,
    /// Explicit run id (defaults to one derived from the current time).
    #[arg(long)]
    run_id: Option<String>,
}

/// Arguments for execution grouping.
#[derive(Args, Debug)]
struct GroupCommand {
    /// Raw results JSON file.
    input: PathBuf,
    /// Suite key.
    #[arg(long)]
    suite: String,
    /// Account unique id.
    #[arg(long)]
    account: String,
    /// Test-case id.
    #[arg(long)]
    testcase: i64,
}

/// Arguments for run listing.
#[derive(Args, Debug)]
struct RunsListCommand {
    /// Date window (`all`, `today`, `yesterday`, `last7`, `last30`, `YYYY-MM-DD..YYYY-MM-DD`).
    #[arg(long, default_value = "all")]
    filter: String,
    /// Case-insensitive search over id, name, and status.
    #[arg(long)]
    search: Option<String>,
    /// Maximum rows.
    #[arg(long)]
    limit: Option<u32>,
    /// Rows to skip.
    #[arg(long, default_value_t = 0)]
    offset: u32,
    /// Sort by start time (`asc` or `desc`).
    #[arg(long, default_value = "desc")]
    sort: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Maps an authoring failure into a CLI error.
fn authoring_error(err: AuthoringError) -> CliError {
    CliError::new(t!("authoring.failed", error = err))
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = ApiVerifierConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let context = Context::new(config);

    match cli.command {
        Commands::Config {
            command: ConfigCommand::Validate,
        } => {
            write_stdout_line(&t!("config.validate.ok"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Suite {
            command,
        } => command_suite(&context, command).await,
        Commands::Testcase {
            command,
        } => command_testcase(&context, command).await,
        Commands::Folder {
            command,
        } => command_folder(&context, command),
        Commands::Precheck {
            command,
        } => command_precheck(&context, command),
        Commands::Validator {
            command,
        } => command_validator(&context, command),
        Commands::Check {
            command: CheckCommand::Validate(command),
        } => command_check_validate(&command),
        Commands::Credentials {
            command: CredentialsCommand::Clean {
                csv,
            },
        } => command_credentials_clean(&context, &csv),
        Commands::Results {
            command,
        } => command_results(&context, command),
        Commands::Runs {
            command,
        } => command_runs(&context, command),
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Loaded configuration plus store factories.
struct Context {
    /// Validated configuration.
    config: ApiVerifierConfig,
}

impl Context {
    /// Wraps a validated configuration.
    const fn new(config: ApiVerifierConfig) -> Self {
        Self {
            config,
        }
    }

    /// Opens the filesystem suite store.
    fn suite_store(&self) -> CliResult<FsSuiteStore> {
        let mut store_config =
            FsStoreConfig::new(&self.config.storage.testcases_dir, &self.config.storage.config_dir);
        store_config.max_testcase_bytes = self.config.limits.max_testcase_bytes;
        FsSuiteStore::new(store_config).map_err(|err| {
            CliError::new(t!("store.open_failed", store = t!("store.kind.suite"), error = err))
        })
    }

    /// Builds the authoring service over the suite store.
    fn authoring(&self) -> CliResult<Authoring<FsSuiteStore>> {
        Ok(Authoring::with_first_id(
            self.suite_store()?,
            audit_sink(&self.config.audit)?,
            self.config.ids.first_id,
        ))
    }

    /// Opens the configured run history store.
    fn history_store(&self) -> CliResult<Box<dyn RunHistoryStore>> {
        match self.config.run_store.sqlite_config() {
            Some(sqlite) => {
                let store = SqliteRunStore::new(&sqlite).map_err(|err| {
                    CliError::new(t!("store.open_failed", store = t!("store.kind.history"), error = err))
                })?;
                Ok(Box::new(store))
            }
            None => Ok(Box::new(InMemoryRunHistoryStore::new())),
        }
    }
}

/// Builds the audit sink selected by configuration.
fn audit_sink(config: &AuditConfig) -> CliResult<Arc<dyn AuditSink>> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
        AuditSinkKind::Disabled => Ok(Arc::new(NoopAuditSink)),
        AuditSinkKind::File => {
            let path = config.path.as_deref().unwrap_or_default();
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| CliError::new(t!("audit.open_failed", path = path, error = err)))?;
            Ok(Arc::new(sink))
        }
    }
}

/// Parses a store-relative suite path.
fn parse_path(raw: &str) -> CliResult<SuitePath> {
    SuitePath::parse(raw).map_err(|err| CliError::new(t!("path.invalid", path = raw, error = err)))
}

/// Loads every stored test case with concurrent reads and freezes the result.
///
/// Reads complete in any order; the snapshot is keyed by path so its view is
/// independent of completion order.
async fn load_snapshot_concurrent(store: &FsSuiteStore) -> CliResult<SuiteSnapshot> {
    let paths = store
        .list_test_paths()
        .map_err(|err| CliError::new(t!("suite.load_failed", error = err)))?;
    let mut tasks = JoinSet::new();
    for path in paths {
        let store = store.clone();
        tasks.spawn_blocking(move || {
            store.read_test_case(&path).map(|test| test.map(|test| (path, test)))
        });
    }
    let mut entries = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let read = joined.map_err(|err| CliError::new(t!("suite.task_failed", error = err)))?;
        if let Some(entry) = read.map_err(|err| CliError::new(t!("suite.load_failed", error = err)))? {
            entries.push(entry);
        }
    }
    Ok(SuiteSnapshot::from_entries(entries))
}

// ============================================================================
// SECTION: Suite Commands
// ============================================================================

/// Dispatches suite subcommands.
async fn command_suite(context: &Context, command: SuiteCommand) -> CliResult<ExitCode> {
    let store = context.suite_store()?;
    match command {
        SuiteCommand::Tree {
            suite,
        } => {
            let tree = store.tree().map_err(|err| CliError::new(t!("suite.load_failed", error = err)))?;
            match suite {
                Some(suite) => {
                    let node = tree
                        .child(&suite)
                        .ok_or_else(|| CliError::new(t!("suite.not_found", suite = suite)))?;
                    write_json(node)?;
                }
                None => write_json(&tree)?,
            }
        }
        SuiteCommand::Issues {
            suite,
        } => {
            let snapshot = load_snapshot_concurrent(&store).await?;
            let graph = DependencyGraph::build(&snapshot, &SuiteKey::new(suite));
            write_json(&graph.issues())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Test-Case Commands
// ============================================================================

/// Dispatches test-case subcommands.
async fn command_testcase(context: &Context, command: TestcaseCommand) -> CliResult<ExitCode> {
    let authoring = context.authoring()?;
    match command {
        TestcaseCommand::Show(arg) => {
            let path = parse_path(&arg.path)?;
            write_json(&authoring.read(&path).map_err(authoring_error)?)?;
        }
        TestcaseCommand::Create(command) => {
            let (path, draft) = read_test_case_input(context, &command)?;
            let session = AuthoringSession::for_path(&path);
            write_json(&authoring.create(&session, &path, draft).map_err(authoring_error)?)?;
        }
        TestcaseCommand::Update(command) => {
            let (path, draft) = read_test_case_input(context, &command)?;
            let session = AuthoringSession::for_path(&path);
            write_json(&authoring.update(&session, &path, draft).map_err(authoring_error)?)?;
        }
        TestcaseCommand::Delete(arg) => {
            let path = parse_path(&arg.path)?;
            let session = AuthoringSession::for_path(&path);
            let report = authoring.delete_path(&session, &path).map_err(authoring_error)?;
            write_json(&report)?;
            if !report.is_complete() {
                return Ok(ExitCode::FAILURE);
            }
        }
        TestcaseCommand::Rename(command) => {
            let path = parse_path(&command.path)?;
            let renamed = authoring.rename(&path, &command.name).map_err(authoring_error)?;
            write_json(&json!({ "from": path, "to": renamed }))?;
        }
        TestcaseCommand::Move(command) => {
            let from = parse_path(&command.from)?;
            let to = parse_path(&command.to)?;
            authoring.move_test(&from, &to).map_err(authoring_error)?;
            write_json(&json!({ "from": from, "to": to }))?;
        }
        TestcaseCommand::Descendants(command) => {
            let snapshot = load_snapshot_concurrent(authoring.store()).await?;
            let suite = SuiteKey::new(command.suite);
            let root = TestCaseId::new(command.id);
            if snapshot.find(&suite, root).is_none() {
                return Err(CliError::new(t!("testcase.not_found", id = root, suite = suite)));
            }
            let rows: Vec<Value> = compute_descendants(&snapshot, &suite, root)
                .into_iter()
                .map(|(path, test)| json!({ "id": test.id, "name": test.name, "path": path }))
                .collect();
            write_json(&rows)?;
        }
        TestcaseCommand::NextId => {
            write_json(&json!({ "id": authoring.next_id().map_err(authoring_error)? }))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Reads and parses the test-case definition named by a write command.
fn read_test_case_input(
    context: &Context,
    command: &TestcaseWriteCommand,
) -> CliResult<(SuitePath, TestCase)> {
    let path = parse_path(&command.path)?;
    let kind = t!("input.kind.testcase");
    let bytes = read_input(&command.input, context.config.limits.max_testcase_bytes, &kind)?;
    let draft = TestCase::from_slice(&bytes).map_err(|err| {
        CliError::new(t!(
            "input.parse_failed",
            kind = kind,
            path = command.input.display(),
            error = err
        ))
    })?;
    Ok((path, draft))
}

// ============================================================================
// SECTION: Folder Commands
// ============================================================================

/// Dispatches folder subcommands.
fn command_folder(context: &Context, command: FolderCommand) -> CliResult<ExitCode> {
    let authoring = context.authoring()?;
    match command {
        FolderCommand::Create(arg) => {
            let path = parse_path(&arg.path)?;
            authoring.create_folder(&path).map_err(authoring_error)?;
            write_json(&json!({ "path": path }))?;
        }
        FolderCommand::Rename(command) => {
            let path = parse_path(&command.path)?;
            let renamed = authoring.rename_folder(&path, &command.name).map_err(authoring_error)?;
            write_json(&json!({ "from": path, "to": renamed }))?;
        }
        FolderCommand::Delete(arg) => {
            let path = parse_path(&arg.path)?;
            authoring.delete_folder(&path).map_err(authoring_error)?;
            write_json(&json!({ "deleted": path }))?;
        }
        FolderCommand::Order(command) => {
            let folder = command.path.as_deref().map(parse_path).transpose()?;
            if let Some(names) = &command.set {
                authoring.set_order(folder.as_ref(), names).map_err(authoring_error)?;
            }
            let order = authoring.get_order(folder.as_ref()).map_err(authoring_error)?;
            write_json(&order)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Shared Config Commands
// ============================================================================

/// Dispatches precheck subcommands.
fn command_precheck(context: &Context, command: PrecheckCommand) -> CliResult<ExitCode> {
    let authoring = context.authoring()?;
    match command {
        PrecheckCommand::List => {
            write_json(&authoring.list_prechecks().map_err(authoring_error)?)?;
        }
        PrecheckCommand::Create(command) => {
            let rule = parse_inline_json("precheck rule", &command.rule)?;
            write_json(&authoring.create_precheck(&command.name, &rule).map_err(authoring_error)?)?;
        }
        PrecheckCommand::Update(command) => {
            let rule = parse_inline_json("precheck rule", &command.rule)?;
            write_json(&authoring.update_precheck(&command.name, &rule).map_err(authoring_error)?)?;
        }
        PrecheckCommand::Delete {
            name,
        } => {
            authoring.delete_precheck(&name).map_err(authoring_error)?;
            write_json(&json!({ "deleted": name }))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Dispatches cookie validator subcommands.
fn command_validator(context: &Context, command: ValidatorCommand) -> CliResult<ExitCode> {
    let authoring = context.authoring()?;
    match command {
        ValidatorCommand::Get => {
            write_json(&authoring.get_cookie_validator().map_err(authoring_error)?)?;
        }
        ValidatorCommand::Set(arg) => {
            let path = parse_path(&arg.path)?;
            write_json(&authoring.set_cookie_validator(&path).map_err(authoring_error)?)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Check and Credential Commands
// ============================================================================

/// Validates a check draft and prints the accepted check with its warnings.
fn command_check_validate(command: &CheckValidateCommand) -> CliResult<ExitCode> {
    let fields = parse_inline_json("check fields", &command.fields)?;
    let draft = validate_check_draft(&command.kind, &fields)
        .map_err(|err| CliError::new(t!("check.invalid", error = err)))?;
    let warnings = draft.warnings.clone();
    let check = draft
        .into_check(command.confirm_empty_path)
        .map_err(|err| CliError::new(t!("check.invalid", error = err)))?;
    write_json(&json!({ "check": check, "warnings": warnings }))?;
    Ok(ExitCode::SUCCESS)
}

/// Cleans a credentials CSV upload.
fn command_credentials_clean(context: &Context, csv: &Path) -> CliResult<ExitCode> {
    let limit = context.config.limits.max_csv_bytes;
    let bytes = read_input(csv, limit, &t!("input.kind.csv"))?;
    let report = parse_credentials_csv(&bytes, limit)
        .map_err(|err| CliError::new(t!("credentials.invalid", error = err)))?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Results Commands
// ============================================================================

/// Dispatches results subcommands.
fn command_results(context: &Context, command: ResultsCommand) -> CliResult<ExitCode> {
    match command {
        ResultsCommand::Summarize(command) => command_results_summarize(context, &command),
        ResultsCommand::Group(command) => command_results_group(context, &command),
    }
}

/// Reads and parses a raw results document.
fn read_raw_run(context: &Context, path: &Path) -> CliResult<RawRun> {
    let kind = t!("input.kind.results");
    let bytes = read_input(path, context.config.limits.max_results_bytes, &kind)?;
    serde_json::from_slice(&bytes).map_err(|err| {
        CliError::new(t!("input.parse_failed", kind = kind, path = path.display(), error = err))
    })
}

/// Aggregates a raw results document and optionally records it in history.
fn command_results_summarize(context: &Context, command: &SummarizeCommand) -> CliResult<ExitCode> {
    let mut raw = read_raw_run(context, &command.input)?;
    let store = context.suite_store()?;
    let tree = store.tree().map_err(|err| CliError::new(t!("suite.load_failed", error = err)))?;
    sort_by_file_order(&mut raw.details, &tree.file_order());
    let summary = aggregate(&raw);

    let now = now_ms();
    let run_id = command.store.then(|| command.run_id.clone().unwrap_or_else(|| format!("run-{now}")));
    audit_sink(&context.config.audit)?.record_aggregation(&aggregation_event(&summary, run_id.as_deref()));

    if let Some(run_id) = &run_id {
        let details = serde_json::to_value(&raw.details)
            .map_err(|err| CliError::new(t!("output.serialize_failed", error = err)))?;
        let run_name = command.run_name.clone().unwrap_or_else(|| run_id.clone());
        let record = RunRecord::from_summary(run_id.clone(), run_name, now, Some(now), &summary, details);
        context
            .history_store()?
            .save_run(&record)
            .map_err(|err| CliError::new(t!("runs.store_failed", error = err)))?;
    }
    write_json(&json!({
        "runId": run_id,
        "status": summary.status(),
        "summary": summary,
    }))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints one test case's results grouped by execution marker.
fn command_results_group(context: &Context, command: &GroupCommand) -> CliResult<ExitCode> {
    let raw = read_raw_run(context, &command.input)?;
    let suite = SuiteKey::new(command.suite.as_str());
    let account = raw
        .details
        .get(&suite)
        .and_then(|runs| runs.iter().find(|run| run.unique_id.as_str() == command.account))
        .ok_or_else(|| {
            CliError::new(t!("results.account_not_found", account = command.account, suite = suite))
        })?;
    let id = TestCaseId::new(command.testcase);
    let result = account
        .results
        .iter()
        .find(|result| result.id == id)
        .ok_or_else(|| CliError::new(t!("results.testcase_not_found", id = id)))?;
    write_json(&group_executions(&result.results))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Run History Commands
// ============================================================================

/// Dispatches run history subcommands.
fn command_runs(context: &Context, command: RunsCommand) -> CliResult<ExitCode> {
    let history = context.history_store()?;
    match command {
        RunsCommand::List(command) => {
            let query = build_run_query(&command)?;
            let rows = history
                .list_runs(&query, OffsetDateTime::now_utc())
                .map_err(|err| CliError::new(t!("runs.store_failed", error = err)))?;
            write_json(&rows)?;
        }
        RunsCommand::Show {
            run_id,
        } => {
            let record = history
                .load_run(&run_id)
                .map_err(|err| CliError::new(t!("runs.store_failed", error = err)))?
                .ok_or_else(|| CliError::new(t!("runs.not_found", run_id = run_id)))?;
            write_json(&record)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Builds a history query from list arguments.
fn build_run_query(command: &RunsListCommand) -> CliResult<RunQuery> {
    let filter = RunFilter::parse(&command.filter)
        .map_err(|err| CliError::new(t!("runs.filter_invalid", error = err)))?;
    let sort = SortOrder::parse(&command.sort)
        .ok_or_else(|| CliError::new(t!("runs.sort_invalid", sort = command.sort)))?;
    let search = command.search.as_deref().map(str::trim).filter(|text| !text.is_empty());
    Ok(RunQuery {
        filter,
        search: search.map(ToString::to_string),
        sort,
        limit: command.limit,
        offset: command.offset,
    })
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads an input file with a size limit, mapping failures to catalog messages.
fn read_input(path: &Path, max_bytes: usize, kind: &str) -> CliResult<Vec<u8>> {
    read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(error) => {
            CliError::new(t!("input.read_failed", kind = kind, path = path.display(), error = error))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(t!(
            "input.read_too_large",
            kind = kind,
            path = path.display(),
            size = size,
            limit = limit
        )),
    })
}

/// Parses a bounded inline JSON argument.
fn parse_inline_json(kind: &str, raw: &str) -> CliResult<Value> {
    if raw.len() > MAX_INLINE_JSON_BYTES {
        return Err(CliError::new(t!(
            "input.read_too_large",
            kind = kind,
            path = "<argument>",
            size = raw.len(),
            limit = MAX_INLINE_JSON_BYTES
        )));
    }
    serde_json::from_str(raw).map_err(|err| CliError::new(t!("input.json_invalid", kind = kind, error = err)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a value to stdout as pretty JSON followed by a newline.
fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| CliError::new(t!("output.serialize_failed", error = err)))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
