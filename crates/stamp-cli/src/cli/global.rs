//! Flags shared by every `stamp` subcommand.

use std::path::PathBuf;

use clap::{ArgAction, Args, ValueEnum, builder::FalseyValueParser};

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log more: `-v` per-file outcomes, `-vv` region decisions, `-vvv`
    /// everything.
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Only errors reach the terminal. The JSON report is still printed.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Honours `NO_COLOR` (<https://no-color.org>).
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new(),
        help = "Disable colored output"
    )]
    pub no_color: bool,

    /// Explicit config file. Unlike the default location, it must exist.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        env = "STAMP_CONFIG",
        value_name = "FILE",
        help = "Configuration file path"
    )]
    pub config: Option<PathBuf>,

    /// How reports are printed on stdout.
    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "Report format on stdout"
    )]
    pub output_format: OutputFormat,

    /// How diagnostics are printed on stderr.
    #[arg(
        long = "log-format",
        global = true,
        value_enum,
        default_value = "text",
        help = "Log format on stderr"
    )]
    pub log_format: LogFormat,
}

impl GlobalArgs {
    /// Filter level for every stamp crate. `--quiet` beats `-v`.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `human` on a terminal, `plain` otherwise.
    #[default]
    Auto,
    Human,
    Plain,
    /// The full report as one JSON document.
    Json,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event, for CI log collectors.
    Json,
}
