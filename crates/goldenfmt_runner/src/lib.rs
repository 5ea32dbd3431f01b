//! Formatter test execution: runs registry entries against a formatter and
//! compares the results with golden files.

pub mod diff;
pub mod executor;
pub mod expected;
pub mod formatter;
pub mod outcome;
pub mod report;
pub mod suite;

pub use diff::{DiffLine, LineTag, TextDiff};
pub use executor::{CaseSettings, execute_case};
pub use expected::{CaseFiles, load_case};
pub use formatter::{CommandFormatter, FnFormatter, FormatError, Formatter};
pub use outcome::{CaseError, CaseFailure, CaseState, TestOutcome};
pub use report::{
    CaseReport, EXIT_CASE_FAILURES, EXIT_SUCCESS, EXIT_SUITE_FATAL, SuiteCounts, SuiteReport,
};
pub use suite::{CaseFilter, Inventory, SuiteError, check_suite, run_case, run_suite};
