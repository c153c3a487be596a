//! `stamp config`: inspect configuration values.

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(
    cmd: ConfigCommands,
    config: AppConfig,
    config_file: Option<std::path::PathBuf>,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&config, &key)?;
            if output.is_json() {
                output.json(&serde_json::json!({ "key": key, "value": value }))?;
            } else {
                output.print(&value)?;
            }
        }

        ConfigCommands::List => {
            if output.is_json() {
                output.json(&config)?;
            } else {
                output.header("Current Configuration:")?;
                let serialised = config
                    .to_toml()
                    .with_cli_context(|| "Failed to serialise config")?;
                output.print(&serialised)?;
            }
        }

        ConfigCommands::Path => {
            let path = config_file.unwrap_or_else(AppConfig::config_path);
            output.print(&path.display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<String> {
    config.get(key).ok_or_else(|| CliError::ConfigError {
        message: format!("Unknown config key: '{key}'"),
        source: None,
    })
}

// ── tests ─────────────────────────────────────────────────────────────────────
