//! Diagnostic output
//!
//! Everything in the crate logs through `tracing` macros; the binary
//! installs the subscriber once at startup. Per-port dumps are emitted at
//! debug level, so `--verbose` is what shows them.

/// Filter directive for the requested verbosity; `RUST_LOG` is not consulted
pub fn filter_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Install the compact stderr subscriber
///
/// Call early in main() before any logging occurs. A second call is a no-op.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::new(filter_directive(verbose)))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(false), "warn");
        assert_eq!(filter_directive(true), "debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(false);
        init_tracing(true);
        tracing::debug!("still alive");
    }
}
