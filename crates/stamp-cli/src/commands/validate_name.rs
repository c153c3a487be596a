//! `stamp validate-name`: run the naming gate on one name.

use stamp_core::domain::{NameValidation, NameValidator};

use crate::{
    cli::ValidateNameArgs,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(args: ValidateNameArgs, output: OutputManager) -> CliResult<()> {
    let validation = validate(&args.name, args.component);

    if output.is_json() {
        output.json(&serde_json::json!({
            "name": args.name,
            "kind": if args.component { "component" } else { "package" },
            "valid": validation.is_valid(),
            "errors": validation.errors,
            "warnings": validation.warnings,
        }))?;
    }

    if validation.is_valid() {
        if !output.is_json() {
            output.success(&format!("'{}' is a valid name", args.name))?;
        }
        return Ok(());
    }

    Err(CliError::InvalidName {
        name: args.name,
        problems: problems(validation),
    })
}

fn validate(name: &str, component: bool) -> NameValidation {
    if component {
        NameValidator::validate_component_name(name)
    } else {
        NameValidator::validate_package_name(name)
    }
}

/// Errors first, then warnings; both reject the name.
fn problems(validation: NameValidation) -> Vec<String> {
    validation
        .errors
        .into_iter()
        .chain(validation.warnings.into_iter().map(|w| format!("{w} (warning)")))
        .collect()
}
