//! Implementation of the `stamp new` command.
//!
//! Writes a starter `stamp.toml` for one sub-project built on a built-in
//! template set, then runs generation for it.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use stamp_adapters::{
    DESCRIPTOR_FILE, LocalFilesystem,
    descriptor::{self, LoadedDescriptor},
};
use stamp_core::{application::ports::Filesystem, domain::NameValidator};

use super::generate::{ensure_success, render_report, run};
use crate::{
    cli::{NewArgs, TemplateSetArg, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `stamp new` command.
///
/// Dispatch sequence:
/// 1. Run the naming gate on the sub-project name
/// 2. Resolve the sub-project directory and refuse to clobber a descriptor
/// 3. Render the starter descriptor
/// 4. Write it (skipped with `--dry-run`) and run generation
/// 5. Print next-steps guidance
#[instrument(skip_all, fields(name = %args.name, template = %args.template))]
pub fn execute(
    args: NewArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    // 1. Gate first: nothing is written for a rejected name.
    let validation = NameValidator::validate_package_name(&args.name);
    if !validation.is_valid() {
        return Err(CliError::InvalidName {
            name: args.name,
            problems: validation
                .errors
                .into_iter()
                .chain(validation.warnings)
                .collect(),
        });
    }

    // 2. Resolve paths.
    let dir = resolve_dir(&args.name, args.dir.as_deref())?;
    let descriptor_path = dir.join(DESCRIPTOR_FILE);
    let fs = LocalFilesystem::new();
    if fs.exists(&descriptor_path) && !args.force {
        return Err(CliError::DescriptorExists {
            path: descriptor_path,
        });
    }
    debug!(dir = %dir.display(), "sub-project directory resolved");

    // 3. Render and parse in memory so a dry run sees exactly what would be
    //    written.
    let text = starter_descriptor(&args.name, args.template);
    let mut loaded: LoadedDescriptor = descriptor::parse_str(&text, &dir)?;
    loaded.path = descriptor_path.clone();

    // 4. Write and generate.
    if args.dry_run {
        output.info(&format!(
            "Dry run: would write {} using '{}'",
            descriptor_path.display(),
            args.template
        ))?;
    } else {
        fs.write_atomic(&descriptor_path, &text)?;
        info!(path = %descriptor_path.display(), "descriptor written");
    }

    let report = run(&loaded, None, args.dry_run, &config)?;
    render_report(&report, &output, global.is_verbose())?;
    ensure_success(&report)?;

    // 5. Success + next steps
    if !args.dry_run && !output.is_json() {
        output.success(&format!("Sub-project '{}' created!", args.name))?;
        if !global.quiet {
            output.print("")?;
            output.print("Next steps:")?;
            output.print(&format!(
                "  edit {} to add [[remotes.units]]",
                descriptor_path.display()
            ))?;
            output.print(&format!("  stamp generate {}", descriptor_path.display()))?;
        }
    }

    Ok(())
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// `--dir` if given, otherwise `./NAME` (the unscoped part for `@scope/name`).
pub fn resolve_dir(name: &str, dir: Option<&Path>) -> CliResult<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir.to_path_buf());
    }

    let base = name.rsplit('/').next().unwrap_or(name);
    if base.is_empty() || base == "." || base == ".." {
        return Err(CliError::InvalidInput {
            message: format!("cannot derive a directory from '{name}'; pass --dir"),
            source: None,
        });
    }
    Ok(PathBuf::from(base))
}

// ── Starter descriptor ────────────────────────────────────────────────────────

/// Descriptor text for a fresh sub-project rooted next to the descriptor.
pub fn starter_descriptor(name: &str, template: TemplateSetArg) -> String {
    let examples = match template {
        TemplateSetArg::MfeShell => {
            "\
# [[remotes.units]]
# kind = \"import\"
# region = \"imports\"
# name = \"Cart\"
# from = \"checkout\"
# file = \"src/App.jsx\"
#
# [[remotes.units]]
# kind = \"usage\"
# region = \"usages\"
# name = \"Cart\"
# file = \"src/App.jsx\"
"
        }
        TemplateSetArg::MfeRemote => {
            "\
# [[remotes.units]]
# kind = \"component\"
# region = \"exposes\"
# name = \"Cart\"
#
# [[remotes.units]]
# kind = \"export\"
# region = \"exports\"
# name = \"Cart\"
"
        }
        TemplateSetArg::RestApi => {
            "\
# [[remotes.units]]
# kind = \"raw\"
# region = \"routes\"
# text = \"router.get('/health', (req, res) => res.json({ ok: true }));\"
"
        }
    };

    format!(
        "# Stamp descriptor. Run `stamp generate` after editing.\n\
         \n\
         [[remotes]]\n\
         name = {name}\n\
         root = \".\"\n\
         builtin = \"{set}\"\n\
         \n\
         {examples}",
        name = toml_string(name),
        set = template.set_name(),
    )
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
