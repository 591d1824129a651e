// crates/api-verifier-core/src/core/mod.rs
// ============================================================================
// Module: API Verifier Core Types
// Description: Canonical test-definition, result, and summary structures.
// Purpose: Provide stable, serializable types shared by every crate.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types define test cases, checks, prechecks, suite trees, raw run
//! results, summaries, credential rows, and run-history records. These
//! types are the canonical wire format for stores and the CLI.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod check;
pub mod credentials;
pub mod history;
pub mod identifiers;
pub mod precheck;
pub mod results;
pub mod suite;
pub mod summary;
pub mod testcase;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use check::Check;
pub use check::CheckDraft;
pub use check::CheckDraftError;
pub use check::CheckKind;
pub use check::DraftWarning;
pub use check::Expected;
pub use check::ExpectedType;
pub use check::FieldExistenceCheck;
pub use check::KeyValueCheck;
pub use check::Logic;
pub use check::PatternMatchCheck;
pub use check::Scalar;
pub use check::ValueMatchCheck;
pub use check::ValueOperator;
pub use check::validate_check_draft;
pub use credentials::CleanReport;
pub use credentials::CredentialError;
pub use credentials::CredentialRow;
pub use credentials::clean_credential_rows;
pub use credentials::parse_credentials_csv;
pub use history::RunFilter;
pub use history::RunListEntry;
pub use history::RunQuery;
pub use history::RunRecord;
pub use history::SortOrder;
pub use history::now_ms;
pub use history::pass_rate_percent;
pub use identifiers::AccountId;
pub use identifiers::PathError;
pub use identifiers::PrecheckName;
pub use identifiers::SuiteKey;
pub use identifiers::SuitePath;
pub use identifiers::TEST_CASE_EXTENSION;
pub use identifiers::TestCaseId;
pub use precheck::MultiConditionRule;
pub use precheck::PrecheckCondition;
pub use precheck::PrecheckDraftError;
pub use precheck::PrecheckMode;
pub use precheck::PrecheckOperator;
pub use precheck::PrecheckRule;
pub use precheck::PrecheckSet;
pub use precheck::SingleConditionRule;
pub use precheck::validate_precheck_draft;
pub use results::AccountRun;
pub use results::EntryStatus;
pub use results::RawRun;
pub use results::ResultCounts;
pub use results::ResultEntry;
pub use results::RunDetails;
pub use results::TestCaseResult;
pub use suite::FolderNode;
pub use suite::ORDER_FILE_NAME;
pub use suite::SuiteSnapshot;
pub use suite::build_tree;
pub use suite::parse_order_file;
pub use suite::render_order_file;
pub use suite::sort_siblings;
pub use summary::AccountSummary;
pub use summary::ExecutionCounts;
pub use summary::FolderSummary;
pub use summary::OverallSummary;
pub use summary::RunStatus;
pub use summary::RunSummary;
pub use summary::SuiteSummary;
pub use summary::TestStatus;
pub use summary::TestcaseRollup;
pub use testcase::CookieValidator;
pub use testcase::HttpMethod;
pub use testcase::ParentRef;
pub use testcase::Requirement;
pub use testcase::TestCase;
pub use testcase::TestCaseError;
pub use testcase::UNASSIGNED_ID;
