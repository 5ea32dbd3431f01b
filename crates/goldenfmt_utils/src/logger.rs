use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing subscriber once per process.
///
/// `RUST_LOG` wins over `verbose`; without either the harness logs at `info`.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let fallback = if verbose {
            "goldenfmt=debug"
        } else {
            "goldenfmt=info"
        };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    });
}
