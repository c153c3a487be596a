//! Tracing subscriber setup for the `stamp` binary.
//!
//! `stamp-core` and `stamp-adapters` only emit events; this is the one place
//! a subscriber is installed. Everything goes to stderr so reports on stdout
//! stay machine-readable.
//!
//! `RUST_LOG` replaces the level derived from `-v`/`-q` when set.

use std::io::IsTerminal as _;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{GlobalArgs, global::LogFormat};

const CRATES: [&str; 3] = ["stamp", "stamp_core", "stamp_adapters"];

pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(args.log_level())));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match args.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(args.verbose >= 2)
                    .with_ansi(!args.no_color && std::io::stderr().is_terminal())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))
}

/// `stamp=LEVEL,stamp_core=LEVEL,...`; other crates stay at their default.
fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
