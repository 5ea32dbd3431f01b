use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use goldenfmt_config::{ComparePolicy, ExpectedConvention, FormatterCommand, HarnessConfig};
use goldenfmt_fixture::{FixturePath, Registry, derive_identifier};
use goldenfmt_runner::{
    CaseFilter, CommandFormatter, EXIT_SUCCESS, EXIT_SUITE_FATAL, Inventory, check_suite,
    run_case, run_suite,
};

use crate::render;

#[derive(Parser, Debug)]
#[command(name = "goldenfmt", version, about = "Golden-file regression harness for formatters")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file (requires the `toml-config` feature)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the inventory, then run every registered case
    Run(RunArgs),
    /// Check the inventory, then run one case by identifier
    Case {
        id: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Only check that the registry matches the fixture tree
    Check(InventoryArgs),
    /// Print the identifiers derived from fixture paths
    Ident {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// JSON test registry
    #[arg(short, long)]
    pub registry: PathBuf,

    /// Fixture root, overriding the registry and configuration
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Fixture file suffix
    #[arg(long)]
    pub extension: Option<String>,

    /// File-name regex, overriding the registry and configuration
    #[arg(long)]
    pub pattern: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub inventory: InventoryArgs,

    /// Only run cases whose identifier matches this glob
    #[arg(long)]
    pub filter: Option<String>,

    /// Write a JSON report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Also require deterministic and idempotent formatting
    #[arg(long)]
    pub strict: bool,

    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// `sibling[:marker]` or `sectioned[:separator]`
    #[arg(long)]
    pub expected: Option<ExpectedConvention>,

    /// `exact` or `line-endings`
    #[arg(long)]
    pub compare: Option<ComparePolicy>,

    /// Formatter program and its arguments
    #[arg(last = true)]
    pub formatter: Vec<String>,
}

/// Run the parsed command and return the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => run_all(config, &args),
        Command::Case { id, run } => run_one(config, &run, &id),
        Command::Check(args) => check(config, &args),
        Command::Ident { paths } => {
            for path in paths {
                let fixture = FixturePath::new(&path);
                println!("{}\t{}", derive_identifier(&fixture), fixture);
            }
            Ok(EXIT_SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    let Some(path) = path else {
        return Ok(HarnessConfig::from_env());
    };
    let config = HarnessConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    Ok(config.merge_with_env())
}

fn apply_run_args(mut config: HarnessConfig, args: &RunArgs) -> HarnessConfig {
    if let Some(ext) = &args.inventory.extension {
        config.extension = ext.trim_start_matches('.').to_string();
    }
    if args.strict {
        config.strict = true;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = Some(jobs);
    }
    if let Some(timeout) = args.timeout_ms {
        config.timeout_ms = Some(timeout);
    }
    if let Some(expected) = &args.expected {
        config.expected = expected.clone();
    }
    if let Some(compare) = args.compare {
        config.compare = compare;
    }
    if let Some((program, rest)) = args.formatter.split_first() {
        config.formatter = FormatterCommand::new(program.clone(), rest.to_vec());
    }
    config
}

fn load_inventory(config: &HarnessConfig, args: &InventoryArgs) -> Result<(Registry, Inventory)> {
    let registry = Registry::load(&args.registry)?;
    let base = args.registry.parent().unwrap_or(Path::new("."));
    let mut inventory = Inventory::resolve(&registry, config, base);
    if let Some(root) = &args.root {
        inventory.root = root.clone();
    }
    if let Some(pattern) = &args.pattern {
        inventory.pattern = pattern.clone();
    }
    debug!(
        root = %inventory.root.display(),
        pattern = %inventory.pattern,
        recursive = inventory.recursive,
        "resolved fixture inventory"
    );
    Ok((registry, inventory))
}

fn formatter(config: &HarnessConfig) -> Result<CommandFormatter> {
    if !config.formatter.is_configured() {
        bail!("no formatter command given; pass it after `--` or set `formatter.program`");
    }
    Ok(CommandFormatter::new(config.formatter.clone()))
}

fn check(mut config: HarnessConfig, args: &InventoryArgs) -> Result<i32> {
    if let Some(ext) = &args.extension {
        config.extension = ext.trim_start_matches('.').to_string();
    }
    let (registry, inventory) = load_inventory(&config, args)?;
    match check_suite(&registry, &inventory) {
        Ok(fixtures) => {
            render::inventory_ok(fixtures, registry.len());
            Ok(EXIT_SUCCESS)
        }
        Err(err) => {
            render::fatal(&err);
            Ok(EXIT_SUITE_FATAL)
        }
    }
}

fn run_all(config: HarnessConfig, args: &RunArgs) -> Result<i32> {
    let config = apply_run_args(config, args);
    let formatter = formatter(&config)?;
    let (registry, inventory) = load_inventory(&config, &args.inventory)?;
    let filter = match &args.filter {
        Some(pattern) => CaseFilter::glob(pattern)?,
        None => CaseFilter::all(),
    };

    let selected = registry.iter().filter(|entry| filter.matches(entry)).count();
    let progress = progress_bar(u64::try_from(selected).unwrap_or(u64::MAX));

    let result = run_suite(
        &registry,
        &inventory,
        &config,
        &formatter,
        &filter,
        |_| progress.inc(1),
    );
    progress.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            render::fatal(&err);
            return Ok(err.exit_code());
        }
    };

    render::suite(&report);
    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }
    Ok(report.exit_code())
}

fn run_one(config: HarnessConfig, args: &RunArgs, id: &str) -> Result<i32> {
    let config = apply_run_args(config, args);
    let formatter = formatter(&config)?;
    let (registry, inventory) = load_inventory(&config, &args.inventory)?;

    match run_case(&registry, &inventory, &config, &formatter, id) {
        Ok(report) => {
            render::case(&report);
            Ok(if report.outcome.is_passed() {
                EXIT_SUCCESS
            } else {
                goldenfmt_runner::EXIT_CASE_FAILURES
            })
        }
        Err(err) => {
            render::fatal(&err);
            Ok(err.exit_code())
        }
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} cases")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}
