//! `stamp list`: show the built-in template sets.

use serde::Serialize;

use stamp_adapters::builtin_templates::{TemplateSet, builtin_names, find_set};

use crate::{
    cli::{ListArgs, ListFormat},
    error::CliResult,
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct SetEntry {
    name: String,
    description: String,
    owned_regions: Vec<String>,
    files: Vec<String>,
}

impl From<TemplateSet> for SetEntry {
    fn from(set: TemplateSet) -> Self {
        Self {
            files: set.files.iter().map(|f| f.path.to_string()).collect(),
            name: set.name,
            description: set.description,
            owned_regions: set.owned_regions,
        }
    }
}

pub fn execute(args: ListArgs, output: OutputManager) -> CliResult<()> {
    let sets = builtin_names()
        .into_iter()
        .map(|name| find_set(name).map(SetEntry::from))
        .collect::<Result<Vec<_>, _>>()?;

    let format = if output.is_json() {
        ListFormat::Json
    } else {
        args.format
    };

    match format {
        ListFormat::Table => {
            output.header("Built-in template sets:")?;
            for set in &sets {
                output.print("")?;
                output.print(&format!("  {}  {}", set.name, set.description))?;
                output.print(&format!("    regions: {}", set.owned_regions.join(", ")))?;
                for file in &set.files {
                    output.print(&format!("    - {file}"))?;
                }
            }
        }
        ListFormat::List => {
            for set in &sets {
                output.print(&set.name)?;
            }
        }
        ListFormat::Json => output.json(&sets)?,
    }

    Ok(())
}
