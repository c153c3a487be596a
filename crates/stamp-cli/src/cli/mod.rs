//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stamp",
    bin_name = "stamp",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Idempotent scaffolding with marker-based regeneration",
    long_about = "Stamp creates and updates the files of micro-frontend style \
                  sub-projects, rewriting only the GENERATOR marker regions \
                  inside them. Everything outside the markers is yours.",
    after_help = "EXAMPLES:\n\
        \x20 stamp new checkout --template mfe-remote\n\
        \x20 stamp generate\n\
        \x20 stamp check stamp.toml\n\
        \x20 stamp validate-name @acme/checkout",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate or update every file declared in a descriptor.
    #[command(
        visible_alias = "gen",
        about = "Generate files from a descriptor",
        after_help = "EXAMPLES:\n\
            \x20 stamp generate\n\
            \x20 stamp generate apps/stamp.toml --jobs 4\n\
            \x20 stamp generate --dry-run --output-format json"
    )]
    Generate(GenerateArgs),

    /// Report drift without writing anything.
    #[command(
        about = "Check that generated regions are up to date",
        after_help = "EXIT STATUS:\n\
            \x20 0  every file is up to date\n\
            \x20 5  at least one file would be created or updated"
    )]
    Check(CheckArgs),

    /// Run the naming gate on a single name.
    #[command(
        about = "Validate a sub-project or component name",
        after_help = "EXAMPLES:\n\
            \x20 stamp validate-name checkout\n\
            \x20 stamp validate-name CartButton --component"
    )]
    ValidateName(ValidateNameArgs),

    /// Create a starter descriptor for a new sub-project and generate it.
    #[command(
        visible_alias = "n",
        about = "Create a new sub-project",
        after_help = "EXAMPLES:\n\
            \x20 stamp new shell    --template mfe-shell\n\
            \x20 stamp new checkout --template mfe-remote --dir apps/checkout\n\
            \x20 stamp new orders   --template rest-api --dry-run"
    )]
    New(NewArgs),

    /// List built-in template sets.
    #[command(
        visible_alias = "ls",
        about = "List built-in template sets",
        after_help = "EXAMPLES:\n\
            \x20 stamp list\n\
            \x20 stamp list --format json"
    )]
    List(ListArgs),

    /// Initialise a Stamp configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 stamp init\n\
            \x20 stamp init --force"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stamp completions bash > ~/.local/share/bash-completion/completions/stamp\n\
            \x20 stamp completions zsh  > ~/.zfunc/_stamp\n\
            \x20 stamp completions fish > ~/.config/fish/completions/stamp.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Stamp configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 stamp config get generation.concurrency\n\
            \x20 stamp config list\n\
            \x20 stamp config path"
    )]
    Config(ConfigCommands),
}

// ── generate / check ──────────────────────────────────────────────────────────

/// Arguments for `stamp generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Descriptor file. Defaults to `generation.descriptor` from config
    /// (`stamp.toml`).
    #[arg(value_name = "DESCRIPTOR", help = "Descriptor file (default: stamp.toml)")]
    pub descriptor: Option<PathBuf>,

    /// Report what would change without writing.
    #[arg(long = "dry-run", help = "Show what would change without writing")]
    pub dry_run: bool,

    /// Worker threads.
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "N",
        help = "Number of worker threads (default: CPU count)"
    )]
    pub jobs: Option<usize>,
}

/// Arguments for `stamp check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(value_name = "DESCRIPTOR", help = "Descriptor file (default: stamp.toml)")]
    pub descriptor: Option<PathBuf>,

    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "N",
        help = "Number of worker threads (default: CPU count)"
    )]
    pub jobs: Option<usize>,
}

// ── validate-name ─────────────────────────────────────────────────────────────

/// Arguments for `stamp validate-name`.
#[derive(Debug, Args)]
pub struct ValidateNameArgs {
    #[arg(value_name = "NAME", help = "Name to validate")]
    pub name: String,

    /// Validate as a component (JavaScript identifier) instead of a package.
    #[arg(long = "component", help = "Validate as a component name")]
    pub component: bool,
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `stamp new`.
#[derive(Debug, Args)]
pub struct NewArgs {
    /// Sub-project name; must be a valid npm package name.
    #[arg(value_name = "NAME", help = "Sub-project name")]
    pub name: String,

    /// Built-in template set.
    #[arg(
        short = 't',
        long = "template",
        value_name = "SET",
        value_enum,
        default_value = "mfe-remote",
        help = "Built-in template set"
    )]
    pub template: TemplateSetArg,

    /// Directory for the sub-project. Defaults to `./NAME`.
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        help = "Sub-project directory (default: ./NAME)"
    )]
    pub dir: Option<PathBuf>,

    /// Overwrite an existing `stamp.toml` in the target directory.
    #[arg(long = "force", help = "Overwrite an existing descriptor")]
    pub force: bool,

    /// Preview what would be created without writing any files.
    #[arg(long = "dry-run", help = "Show what would be created without creating")]
    pub dry_run: bool,
}

/// Built-in template sets selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateSetArg {
    MfeShell,
    MfeRemote,
    RestApi,
}

impl TemplateSetArg {
    /// Name of the set in `stamp-adapters`.
    pub fn set_name(self) -> &'static str {
        match self {
            Self::MfeShell => "mfe-shell",
            Self::MfeRemote => "mfe-remote",
            Self::RestApi => "rest-api",
        }
    }
}

impl std::fmt::Display for TemplateSetArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.set_name())
    }
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `stamp list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Sets with their files.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `stamp init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stamp completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: clap_complete::Shell,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `stamp config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `markers.start`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
