//! Suite entry points: the inventory check followed by every case (or one
//! case) on a worker pool.

use std::path::{Path, PathBuf};

use glob::Pattern;
use goldenfmt_config::HarnessConfig;
use goldenfmt_fixture::{
    ConsistencyError, DiscoveryError, FixtureDiscoverer, Registry, RegistryEntry, check_inventory,
};
use goldenfmt_utils::Stopwatch;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::executor::{CaseSettings, execute_case};
use crate::formatter::Formatter;
use crate::report::{CaseReport, EXIT_SUITE_FATAL, SuiteReport};

#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error(transparent)]
    Inventory(#[from] ConsistencyError),
    #[error("unknown test identifier `{0}`")]
    UnknownCase(String),
    #[error("invalid case filter `{pattern}`: {source}")]
    Filter {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SuiteError {
    pub fn exit_code(&self) -> i32 {
        EXIT_SUITE_FATAL
    }
}

impl From<DiscoveryError> for SuiteError {
    fn from(value: DiscoveryError) -> Self {
        SuiteError::Inventory(value.into())
    }
}

/// Fixture root, inclusion pattern and recursion for one run.
///
/// The registry records what its generator scanned; where it is silent the
/// harness configuration fills in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub root: PathBuf,
    pub pattern: String,
    pub recursive: bool,
}

impl Inventory {
    pub fn resolve(registry: &Registry, config: &HarnessConfig, base: &Path) -> Self {
        let metadata = registry.metadata();
        Self {
            root: metadata
                .root
                .clone()
                .unwrap_or_else(|| config.resolve_root(base)),
            pattern: metadata
                .pattern
                .clone()
                .unwrap_or_else(|| config.inclusion_pattern()),
            recursive: metadata.recursive.unwrap_or(config.recursive),
        }
    }

    pub fn discoverer(&self) -> Result<FixtureDiscoverer, DiscoveryError> {
        FixtureDiscoverer::new(&self.root, &self.pattern, self.recursive)
    }
}

/// Optional narrowing of which cases execute. The inventory check always
/// covers the whole registry.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pattern: Option<Pattern>,
}

impl CaseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Glob over identifiers, e.g. `testFunction*`.
    pub fn glob(pattern: &str) -> Result<Self, SuiteError> {
        let pattern = Pattern::new(pattern).map_err(|source| SuiteError::Filter {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn matches(&self, entry: &RegistryEntry) -> bool {
        self.pattern
            .as_ref()
            .is_none_or(|pattern| pattern.matches(entry.id.as_str()))
    }
}

/// Check the inventory; fatal before any case runs if it is inconsistent.
pub fn check_suite(registry: &Registry, inventory: &Inventory) -> Result<usize, SuiteError> {
    let discoverer = inventory.discoverer()?;
    match check_inventory(registry, &discoverer) {
        Ok(found) => Ok(found.len()),
        Err(err) => {
            warn!(error = %err, "fixture inventory check failed");
            Err(err.into())
        }
    }
}

/// Run every registered case (subject to `filter`) in parallel.
///
/// `on_case` is called from worker threads as each case finishes.
pub fn run_suite<F>(
    registry: &Registry,
    inventory: &Inventory,
    config: &HarnessConfig,
    formatter: &dyn Formatter,
    filter: &CaseFilter,
    on_case: F,
) -> Result<SuiteReport, SuiteError>
where
    F: Fn(&CaseReport) + Sync,
{
    check_suite(registry, inventory)?;

    let settings = CaseSettings::from_config(config, &inventory.root);
    let selected: Vec<&RegistryEntry> = registry
        .iter()
        .filter(|entry| filter.matches(entry))
        .collect();

    let mut builder = ThreadPoolBuilder::new();
    if let Some(jobs) = config.jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build()?;

    info!(
        cases = selected.len(),
        threads = pool.current_num_threads(),
        strict = settings.strict,
        "running formatter cases"
    );

    let watch = Stopwatch::start_new();
    let reports: Vec<CaseReport> = pool.install(|| {
        selected
            .par_iter()
            .map(|entry| {
                let report = execute_case(formatter, entry, &settings);
                on_case(&report);
                report
            })
            .collect()
    });

    let report = SuiteReport::new(
        inventory.root.clone(),
        settings.strict,
        reports,
        watch.elapsed(),
    );
    info!(
        passed = report.counts.passed,
        failed = report.counts.failed,
        errored = report.counts.errored,
        "suite finished"
    );
    Ok(report)
}

/// Run the single case registered under `id`, after the same inventory check
/// as a full run.
pub fn run_case(
    registry: &Registry,
    inventory: &Inventory,
    config: &HarnessConfig,
    formatter: &dyn Formatter,
    id: &str,
) -> Result<CaseReport, SuiteError> {
    let entry = registry
        .get(id)
        .ok_or_else(|| SuiteError::UnknownCase(id.to_string()))?;
    check_suite(registry, inventory)?;

    let settings = CaseSettings::from_config(config, &inventory.root);
    Ok(execute_case(formatter, entry, &settings))
}
