//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `STAMP_<SECTION>__<KEY>`, e.g.
//!    `STAMP_GENERATION__CONCURRENCY=4`
//! 3. Config file (`--config FILE`, or `config.toml` in the platform config
//!    directory)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use stamp_adapters::LocalFilesystem;
use stamp_core::application::ports::Filesystem;
use stamp_core::domain::{DEFAULT_END_TOKEN, DEFAULT_ID_TOKEN, DEFAULT_START_TOKEN, MarkerSyntax};
use tracing::debug;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub markers: MarkersConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Worker threads. `None` uses every available CPU.
    pub concurrency: Option<usize>,
    /// Descriptor used when none is given on the command line.
    pub descriptor: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkersConfig {
    pub start: String,
    pub id: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    /// `auto`, `human`, `plain` or `json`; applies when `--output-format`
    /// is left at `auto`.
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig {
                concurrency: None,
                descriptor: PathBuf::from(stamp_adapters::DESCRIPTOR_FILE),
            },
            markers: MarkersConfig {
                start: DEFAULT_START_TOKEN.into(),
                id: DEFAULT_ID_TOKEN.into(),
                end: DEFAULT_END_TOKEN.into(),
            },
            output: OutputConfig {
                no_color: false,
                format: "auto".into(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then `STAMP_*`
    /// environment variables.
    ///
    /// A file passed via `--config` must exist; the default location is
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .context("Failed to serialise default configuration")?;

        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        debug!(path = %path.display(), required, "loading configuration");

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                config::Environment::with_prefix("STAMP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.stamp.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "stamp", "stamp")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".stamp.toml"))
    }

    /// The configured marker tokens.
    pub fn marker_syntax(&self) -> Result<MarkerSyntax, stamp_core::domain::DomainError> {
        MarkerSyntax::new(&self.markers.start, &self.markers.id, &self.markers.end)
    }

    /// Look up a dotted key such as `generation.concurrency`.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = toml::Value::try_from(self).ok()?;
        let found = key
            .split('.')
            .try_fold(&value, |node, part| node.get(part))?;
        Some(match found {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Render as TOML, the format `stamp init` writes.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialise configuration")
    }

    /// Write the configuration to `path` through the atomic writer, creating
    /// parent directories.
    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let text = self.to_toml()?;
        LocalFilesystem::new()
            .write_atomic(path, &text)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
