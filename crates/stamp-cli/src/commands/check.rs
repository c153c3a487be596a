//! `stamp check`: a dry run that fails when generated regions have drifted.

use tracing::instrument;

use stamp_adapters::DescriptorLoader;

use super::generate::{descriptor_path, ensure_success, render_report, run};
use crate::{
    cli::{CheckArgs, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all)]
pub fn execute(
    args: CheckArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let path = descriptor_path(args.descriptor, &config);
    let loaded = DescriptorLoader::new(&path).load()?;

    let report = run(&loaded, args.jobs, true, &config)?;
    render_report(&report, &output, global.is_verbose())?;
    ensure_success(&report)?;

    let drift = report.created().len() + report.updated().len();
    if drift > 0 {
        return Err(CliError::Drift { count: drift });
    }

    if !output.is_json() {
        output.success("All generated regions are up to date")?;
    }
    Ok(())
}
