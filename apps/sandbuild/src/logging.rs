//! Tracing subscriber setup
//!
//! Every library event is already forwarded to tracing, so installing a
//! subscriber is all the CLI needs to surface progress. Logs go to stderr,
//! leaving stdout to the rendered results.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const VERBOSE_FILTER: &str = "debug";

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(json_logs: bool, verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json_logs {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}
