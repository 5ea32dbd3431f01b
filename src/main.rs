mod cli;
mod render;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use goldenfmt_runner::EXIT_SUITE_FATAL;
use goldenfmt_utils::init_logging;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    let code = match cli::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            EXIT_SUITE_FATAL
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(2))
}
