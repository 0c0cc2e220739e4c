//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool, serving: bool) -> &'static str {
    if verbose {
        "refer_earn=debug,info"
    } else if serving {
        "refer_earn=info,warn"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Logs go to stderr so prompts on stdout
/// stay readable. `RUST_LOG` overrides `default_directive` when set.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init(default_directive: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
