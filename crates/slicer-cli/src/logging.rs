//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
/// Output goes to stderr so `--json` stays parseable.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let fmt = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(verbose)
        .with_writer(std::io::stderr);

    // A second init (tests calling run twice) is harmless
    let _ = tracing_subscriber::registry().with(filter).with(fmt).try_init();
    if verbose {
        tracing::debug!("Verbose mode enabled");
    }
}
