//! `stamp init`: write the default configuration.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::{
    cli::{GlobalArgs, InitArgs},
    config::AppConfig,
    error::{CliResult, IntoCli},
    output::OutputManager,
};

/// What `init` will do with the target path.
#[derive(Debug, PartialEq, Eq)]
enum InitPlan {
    Create(PathBuf),
    Overwrite(PathBuf),
    Keep(PathBuf),
}

fn plan(path: PathBuf, exists: bool, force: bool) -> InitPlan {
    match (exists, force) {
        (false, _) => InitPlan::Create(path),
        (true, true) => InitPlan::Overwrite(path),
        (true, false) => InitPlan::Keep(path),
    }
}

/// The destination is `--config FILE` when given, otherwise the platform
/// config directory. The loaded config is ignored: `init` always writes the
/// built-in defaults, which is also how a broken file gets reset.
#[instrument(skip_all, fields(force = args.force))]
pub fn execute(
    args: InitArgs,
    global: GlobalArgs,
    _config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let path = global.config.unwrap_or_else(AppConfig::config_path);
    let exists = path.exists();

    match plan(path, exists, args.force) {
        InitPlan::Keep(path) => {
            output.warning(&format!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            ))?;
        }
        InitPlan::Create(path) => {
            write_defaults(&path)?;
            output.success(&format!("Configuration created at {}", path.display()))?;
        }
        InitPlan::Overwrite(path) => {
            write_defaults(&path)?;
            output.success(&format!("Configuration reset at {}", path.display()))?;
        }
    }
    Ok(())
}

fn write_defaults(path: &Path) -> CliResult<()> {
    AppConfig::default()
        .write_to(path)
        .with_cli_context(|| "Failed to write default configuration")?;
    info!(path = %path.display(), "configuration written");
    Ok(())
}
