//! The formatter under test, seen as a black box from source text to
//! formatted text.

use std::thread;
use std::time::Duration;

use goldenfmt_config::FormatterCommand;
use goldenfmt_utils::Stopwatch;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The formatter could not make sense of the input
    #[error("formatter rejected input: {0}")]
    Syntax(String),
    #[error("formatter exited with {}: {}", exit_label(.status.as_ref()), .stderr.trim())]
    Rejected { status: Option<i32>, stderr: String },
    #[error("failed to start formatter `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("formatter output is not valid UTF-8")]
    InvalidUtf8,
    #[error("formatter did not finish within {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("i/o error while waiting for formatter: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(status: Option<&i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// A formatter implementation driven by the harness.
///
/// Implementations are shared across worker threads and must not keep state
/// between calls.
pub trait Formatter: Send + Sync {
    fn format(&self, source: &str) -> Result<String, FormatError>;

    /// Format with a time budget.
    ///
    /// The default cannot interrupt an in-process formatter; a call that
    /// overran the budget is still turned into [`FormatError::Timeout`].
    fn format_within(&self, source: &str, limit: Option<Duration>) -> Result<String, FormatError> {
        let Some(limit) = limit else {
            return self.format(source);
        };
        let (output, elapsed) = Stopwatch::measure(|| self.format(source));
        if elapsed > limit {
            return Err(FormatError::Timeout(limit));
        }
        output
    }
}

/// Wraps a closure as a formatter.
pub struct FnFormatter<F> {
    func: F,
}

impl<F> FnFormatter<F>
where
    F: Fn(&str) -> Result<String, FormatError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Formatter for FnFormatter<F>
where
    F: Fn(&str) -> Result<String, FormatError> + Send + Sync,
{
    fn format(&self, source: &str) -> Result<String, FormatError> {
        (self.func)(source)
    }
}

/// Runs an external program per call: source on stdin, formatted text on
/// stdout, non-zero exit for input it cannot handle.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    command: FormatterCommand,
}

impl CommandFormatter {
    pub fn new(command: FormatterCommand) -> Self {
        Self { command }
    }

    fn expression(&self, source: &str) -> duct::Expression {
        duct::cmd(self.command.program.as_str(), &self.command.args)
            .stdin_bytes(source.as_bytes().to_vec())
            .stdout_capture()
            .stderr_capture()
            .unchecked()
    }

    fn spawn_error(&self, source: std::io::Error) -> FormatError {
        FormatError::Spawn {
            program: self.command.program.clone(),
            source,
        }
    }

    fn finish(output: &std::process::Output) -> Result<String, FormatError> {
        if !output.status.success() {
            return Err(FormatError::Rejected {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        String::from_utf8(output.stdout.clone()).map_err(|_| FormatError::InvalidUtf8)
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        let output = self
            .expression(source)
            .run()
            .map_err(|err| self.spawn_error(err))?;
        Self::finish(&output)
    }

    fn format_within(&self, source: &str, limit: Option<Duration>) -> Result<String, FormatError> {
        let Some(limit) = limit else {
            return self.format(source);
        };

        let handle = self
            .expression(source)
            .start()
            .map_err(|err| self.spawn_error(err))?;
        let watch = Stopwatch::start_new();

        loop {
            if let Some(output) = handle.try_wait()? {
                return Self::finish(output);
            }
            if watch.has_exceeded(limit) {
                debug!(program = %self.command.program, "killing formatter after timeout");
                if let Err(err) = handle.kill() {
                    warn!(error = %err, "failed to kill timed out formatter");
                }
                return Err(FormatError::Timeout(limit));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
