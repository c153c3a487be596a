//! Output management and formatting.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        // The flag wins; `auto` falls back to the configured format.
        let requested = match args.output_format {
            OutputFormat::Auto => configured_format(&config.output.format),
            explicit => explicit,
        };

        // Resolve Auto → Human (TTY) or Plain (piped/redirected).
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color || config.output.no_color,
            term: Term::stdout(),
        }
    }
    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Error indicator: `✗ <msg>`.  *Not* suppressed in quiet mode.
    pub fn error(&self, msg: &str) -> io::Result<()> {
        let line = if self.no_color {
            format!("\u{2717} {msg}") // ✗
        } else {
            format!("{} {}", "\u{2717}".red().bold(), msg.red())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Pretty-printed JSON on stdout. Never suppressed: `--quiet` only
    /// silences human-oriented output.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    pub fn is_json(&self) -> bool {
        self.resolved_format == OutputFormat::Json
    }
}

fn configured_format(value: &str) -> OutputFormat {
    match value.to_ascii_lowercase().as_str() {
        "human" => OutputFormat::Human,
        "plain" => OutputFormat::Plain,
        "json" => OutputFormat::Json,
        _ => OutputFormat::Auto,
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cli::global::LogFormat;
    use crate::config::AppConfig;

    fn make_manager(quiet: bool, no_color: bool) -> OutputManager {
        make_manager_with(quiet, no_color, OutputFormat::Plain, &AppConfig::default())
    }

    fn make_manager_with(
        quiet: bool,
        no_color: bool,
        output_format: OutputFormat,
        config: &AppConfig,
    ) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            output_format,
            log_format: LogFormat::Text,
        };
        OutputManager::new(&args, config)
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, true);
        assert!(out.print("hello").is_ok());
    }

    #[test]
    fn error_not_suppressed_in_quiet_mode() {
        let out = make_manager(true, true);
        assert!(out.error("something went wrong").is_ok());
    }

    #[test]
    fn no_color_flag_reported() {
        let colored = make_manager(false, false);
        let no_color = make_manager(false, true);
        assert!(colored.supports_color());
        assert!(!no_color.supports_color());
    }

    #[test]
    fn auto_without_terminal_is_not_json() {
        let out = make_manager_with(false, true, OutputFormat::Auto, &AppConfig::default());
        assert!(!out.is_json());
    }

    #[test]
    fn configured_format_applies_when_flag_is_auto() {
        let mut config = AppConfig::default();
        config.output.format = "json".into();

        let out = make_manager_with(false, true, OutputFormat::Auto, &config);
        assert!(out.is_json());

        let out = make_manager_with(false, true, OutputFormat::Plain, &config);
        assert!(!out.is_json());
    }

    #[test]
    fn config_no_color_is_honoured() {
        let mut config = AppConfig::default();
        config.output.no_color = true;
        let out = make_manager_with(false, false, OutputFormat::Plain, &config);
        assert!(!out.supports_color());
    }
}
