//! Terminal output for suite and case results.

use colored::Colorize;

use goldenfmt_runner::{CaseReport, LineTag, SuiteError, SuiteReport, TestOutcome, TextDiff};

const DIFF_CONTEXT: usize = 3;

pub fn suite(report: &SuiteReport) {
    for case in report.failures() {
        self::case(case);
    }

    let counts = report.counts;
    let summary = format!(
        "{} passed, {} failed, {} errored ({} total) in {:.2}s",
        counts.passed,
        counts.failed,
        counts.errored,
        counts.total,
        report.duration.as_secs_f64()
    );
    if report.success() {
        println!("{} {summary}", "ok:".green().bold());
    } else {
        println!("{} {summary}", "FAILED:".red().bold());
    }
}

pub fn case(report: &CaseReport) {
    let millis = report.duration.as_millis();
    match &report.outcome {
        TestOutcome::Passed => {
            println!("{} {} ({millis}ms)", "PASS".green().bold(), report.id);
        }
        TestOutcome::Failed { failure } => {
            println!(
                "{} {} [{}]: {failure}",
                "FAIL".red().bold(),
                report.id,
                report.path
            );
            diff(failure.diff());
        }
        TestOutcome::Errored { error } => {
            println!(
                "{} {} [{}]: {error}",
                "ERROR".yellow().bold(),
                report.id,
                report.path
            );
        }
    }
}

fn diff(diff: &TextDiff) {
    println!("{}", "--- expected".red());
    println!("{}", "+++ actual".green());
    for line in diff.hunks(DIFF_CONTEXT) {
        let Some(line) = line else {
            println!("{}", "@@ ... @@".cyan());
            continue;
        };
        let text = line.display_text();
        match line.tag {
            LineTag::Equal => println!(" {text}"),
            LineTag::Removed => println!("{}", format!("-{text}").red()),
            LineTag::Added => println!("{}", format!("+{text}").green()),
        }
    }
}

pub fn inventory_ok(fixtures: usize, registered: usize) {
    println!(
        "{} {fixtures} fixture(s) on disk, {registered} registered case(s)",
        "ok:".green().bold()
    );
}

pub fn fatal(err: &SuiteError) {
    eprintln!("{} {err}", "error:".red().bold());
}
