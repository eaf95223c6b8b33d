//! Structured logging init, scaled down from `serin_log`'s rolling-file
//! JSON setup to the single `verbose` knob §6.1's configuration record
//! exposes.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global `tracing` subscriber. `verbose` selects `DEBUG`
/// instead of `INFO` as the default level; `GISTREE_LOG` still overrides
/// either when set.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("GISTREE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
