//! `stamp generate`: load a descriptor and run the generation service.
//!
//! The report helpers here are shared with `check` and `new`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use stamp_adapters::{DescriptorLoader, LoadedDescriptor, LocalFilesystem};
use stamp_core::{
    application::{GenerationOptions, GenerationService},
    domain::{FileOutcome, GenerationReport, IssueKind},
};

use crate::{
    cli::{GenerateArgs, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(dry_run = args.dry_run))]
pub fn execute(
    args: GenerateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let path = descriptor_path(args.descriptor, &config);
    let loaded = DescriptorLoader::new(&path).load()?;

    let report = run(&loaded, args.jobs, args.dry_run, &config)?;
    render_report(&report, &output, global.is_verbose())?;
    ensure_success(&report)
}

/// The descriptor named on the command line, or the configured default.
pub(crate) fn descriptor_path(arg: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    arg.unwrap_or_else(|| config.generation.descriptor.clone())
}

/// Run generation for every sub-project of a loaded descriptor.
pub(crate) fn run(
    loaded: &LoadedDescriptor,
    jobs: Option<usize>,
    dry_run: bool,
    config: &AppConfig,
) -> CliResult<GenerationReport> {
    let base = config.marker_syntax().map_err(|e| CliError::ConfigError {
        message: format!("invalid [markers] configuration: {e}"),
        source: Some(Box::new(e)),
    })?;
    let syntax = loaded.marker_syntax(&base).map_err(stamp_core::error::StampError::from)?;

    let concurrency = jobs
        .or(config.generation.concurrency)
        .unwrap_or_else(|| GenerationOptions::default().concurrency);
    debug!(concurrency, start = syntax.start_token(), "generation options resolved");

    let service = GenerationService::new(Box::new(LocalFilesystem::new()))
        .with_syntax(syntax)
        .with_options(GenerationOptions {
            concurrency,
            dry_run,
        });

    let report = service.generate(&loaded.sub_projects)?;
    info!(
        run_id = %report.run_id(),
        created = report.created().len(),
        updated = report.updated().len(),
        unchanged = report.unchanged().len(),
        errors = report.failures().count(),
        "generation finished"
    );
    Ok(report)
}

/// Print the report: JSON as-is, or one line per file plus a summary.
pub(crate) fn render_report(
    report: &GenerationReport,
    output: &OutputManager,
    verbose: bool,
) -> CliResult<()> {
    if output.is_json() {
        output.json(report)?;
        return Ok(());
    }

    let verb = |outcome: FileOutcome| match (outcome, report.is_dry_run()) {
        (FileOutcome::Created, false) => "created",
        (FileOutcome::Created, true) => "would create",
        (FileOutcome::Updated, false) => "updated",
        (FileOutcome::Updated, true) => "would update",
        (FileOutcome::Unchanged, _) => "unchanged",
        (FileOutcome::Failed, _) => "failed",
    };

    for summary in report.sub_projects() {
        output.header(&format!("{} ({})", summary.name, summary.state))?;
        for issue in &summary.issues {
            output.error(&format!("{}: {}", issue.kind, issue.detail))?;
        }

        for file in &summary.files {
            let path = display_path(&file.path, &summary.root);
            match file.outcome {
                FileOutcome::Created | FileOutcome::Updated => {
                    let regions = if file.rewritten_regions.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", file.rewritten_regions.join(", "))
                    };
                    output.success(&format!("{} {path}{regions}", verb(file.outcome)))?;
                }
                FileOutcome::Unchanged if verbose => {
                    output.print(&format!("  {} {path}", verb(file.outcome)))?;
                }
                FileOutcome::Unchanged => {}
                FileOutcome::Failed => {}
            }
            for issue in &file.issues {
                let line = format!("{path}: {} ({})", issue.detail, issue.kind);
                if issue.kind.is_warning() {
                    output.warning(&line)?;
                } else {
                    output.error(&line)?;
                }
            }
        }
    }

    output.print("")?;
    output.print(&format!(
        "{} created, {} updated, {} unchanged, {} error(s), {} warning(s)",
        report.created().len(),
        report.updated().len(),
        report.unchanged().len(),
        report.failures().count(),
        report.warnings().count(),
    ))?;
    Ok(())
}

/// Map a finished report onto the exit status.
pub(crate) fn ensure_success(report: &GenerationReport) -> CliResult<()> {
    if report.is_success() {
        return Ok(());
    }
    let failures = report.failures().count();
    let write_failures = report
        .failures()
        .filter(|i| i.kind == IssueKind::WriteFailure)
        .count();
    Err(CliError::GenerationFailed {
        failures,
        write_failures,
    })
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_to_config() {
        let config = AppConfig::default();
        assert_eq!(descriptor_path(None, &config), PathBuf::from("stamp.toml"));
        assert_eq!(
            descriptor_path(Some("ws/stamp.toml".into()), &config),
            PathBuf::from("ws/stamp.toml")
        );
    }

    #[test]
    fn display_path_is_relative_to_root() {
        assert_eq!(
            display_path(Path::new("apps/shell/src/App.jsx"), Path::new("apps/shell")),
            "src/App.jsx"
        );
        assert_eq!(display_path(Path::new("other.js"), Path::new("apps")), "other.js");
    }
}
