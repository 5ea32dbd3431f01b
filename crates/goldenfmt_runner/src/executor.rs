//! Runs one registry entry against the formatter.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;

use goldenfmt_config::{ComparePolicy, ExpectedConvention, HarnessConfig};
use goldenfmt_fixture::{RegistryEntry, TestIdentifier};
use goldenfmt_utils::Stopwatch;
use tracing::{debug, trace, warn};

use crate::diff::TextDiff;
use crate::expected::load_case;
use crate::formatter::{FormatError, Formatter};
use crate::outcome::{CaseError, CaseFailure, CaseState, TestOutcome};
use crate::report::CaseReport;

/// Everything a case needs besides the formatter. Read-only and shared by
/// all workers.
#[derive(Debug, Clone)]
pub struct CaseSettings {
    pub root: PathBuf,
    pub expected: ExpectedConvention,
    pub compare: ComparePolicy,
    pub strict: bool,
    pub timeout: Option<Duration>,
}

impl CaseSettings {
    pub fn from_config(config: &HarnessConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            expected: config.expected.clone(),
            compare: config.compare,
            strict: config.strict,
            timeout: config.timeout(),
        }
    }
}

struct CaseRun<'a> {
    id: &'a TestIdentifier,
    state: CaseState,
    watch: Stopwatch,
    timeout: Option<Duration>,
}

impl<'a> CaseRun<'a> {
    fn new(id: &'a TestIdentifier, timeout: Option<Duration>) -> Self {
        Self {
            id,
            state: CaseState::Pending,
            watch: Stopwatch::start_new(),
            timeout,
        }
    }

    fn advance(&mut self, next: CaseState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid case transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!(case = %self.id, from = ?self.state, to = ?next, "case state");
        self.state = next;
    }

    /// Time left of the per-case budget; every formatter call draws from it.
    fn remaining(&self) -> Result<Option<Duration>, CaseError> {
        let Some(limit) = self.timeout else {
            return Ok(None);
        };
        let left = limit.saturating_sub(self.watch.elapsed());
        if left.is_zero() {
            return Err(FormatError::Timeout(limit).into());
        }
        Ok(Some(left))
    }

    fn format(&self, formatter: &dyn Formatter, source: &str) -> Result<String, CaseError> {
        let left = self.remaining()?;
        formatter
            .format_within(source, left)
            .map_err(|err| match err {
                // report the whole case budget, not the slice left for this call
                FormatError::Timeout(_) => CaseError::from(FormatError::Timeout(
                    self.timeout.unwrap_or_default(),
                )),
                other => CaseError::from(other),
            })
    }
}

/// Execute a single case: format the fixture input and compare it with the
/// golden text. In strict mode the formatter must also be deterministic and
/// idempotent on its own output.
pub fn execute_case(
    formatter: &dyn Formatter,
    entry: &RegistryEntry,
    settings: &CaseSettings,
) -> CaseReport {
    let mut run = CaseRun::new(&entry.id, settings.timeout);
    run.advance(CaseState::Running);

    // a panicking formatter fails its own case only
    let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
        evaluate(&run, formatter, entry, settings)
    }));
    let outcome = match verdict {
        Ok(Ok(())) => TestOutcome::Passed,
        Ok(Err(Verdict::Failed(failure))) => failure.into(),
        Ok(Err(Verdict::Errored(error))) => error.into(),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(case = %entry.id, %message, "formatter panicked");
            CaseError::Panicked { message }.into()
        }
    };
    run.advance(outcome.state());

    let duration = run.watch.elapsed();
    debug!(
        case = %entry.id,
        path = %entry.path,
        state = ?run.state,
        elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        "case finished"
    );

    CaseReport {
        id: entry.id.clone(),
        path: entry.path.clone(),
        outcome,
        duration,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

enum Verdict {
    Failed(CaseFailure),
    Errored(CaseError),
}

impl From<CaseError> for Verdict {
    fn from(value: CaseError) -> Self {
        Verdict::Errored(value)
    }
}

fn evaluate(
    run: &CaseRun<'_>,
    formatter: &dyn Formatter,
    entry: &RegistryEntry,
    settings: &CaseSettings,
) -> Result<(), Verdict> {
    let files = load_case(&settings.root, &entry.path, &settings.expected)?;
    let actual = run.format(formatter, &files.source)?;

    if settings.strict {
        let again = run.format(formatter, &files.source)?;
        if again != actual {
            return Err(Verdict::Failed(CaseFailure::NonDeterministic {
                diff: TextDiff::compute(&actual, &again),
            }));
        }
    }

    let expected = settings.compare.normalize(&files.expected);
    let got = settings.compare.normalize(&actual);
    if expected != got {
        return Err(Verdict::Failed(CaseFailure::Mismatch {
            expected_path: files.expected_path,
            diff: TextDiff::compute(&expected, &got),
        }));
    }

    if settings.strict {
        // golden text must be a fixed point of the formatter
        let reformatted = run.format(formatter, &files.expected)?;
        let reformatted = settings.compare.normalize(&reformatted);
        if reformatted != expected {
            return Err(Verdict::Failed(CaseFailure::NonIdempotent {
                diff: TextDiff::compute(&expected, &reformatted),
            }));
        }
    }

    Ok(())
}
