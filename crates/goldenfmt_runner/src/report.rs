use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::outcome::{CaseState, TestOutcome};
use goldenfmt_fixture::{FixturePath, TestIdentifier};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CASE_FAILURES: i32 = 1;
pub const EXIT_SUITE_FATAL: i32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: TestIdentifier,
    pub path: FixturePath,
    #[serde(flatten)]
    pub outcome: TestOutcome,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SuiteCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

/// Every per-case outcome of one run, ordered by identifier.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub strict: bool,
    pub counts: SuiteCounts,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn new(root: PathBuf, strict: bool, mut cases: Vec<CaseReport>, duration: Duration) -> Self {
        cases.sort_by(|a, b| a.id.cmp(&b.id));
        let counts = cases.iter().fold(
            SuiteCounts {
                total: cases.len(),
                ..SuiteCounts::default()
            },
            |mut counts, case| {
                match case.outcome.state() {
                    CaseState::Passed => counts.passed += 1,
                    CaseState::Failed => counts.failed += 1,
                    _ => counts.errored += 1,
                }
                counts
            },
        );
        Self {
            generated_at: Utc::now(),
            root,
            strict,
            counts,
            duration,
            cases,
        }
    }

    pub fn success(&self) -> bool {
        self.counts.passed == self.counts.total
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            EXIT_SUCCESS
        } else {
            EXIT_CASE_FAILURES
        }
    }

    pub fn case(&self, id: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.id.as_str() == id)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| !case.outcome.is_passed())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }
}
