//! `stamp completions`: print a completion script for the chosen shell.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::{
    cli::{Cli, CompletionsArgs},
    error::CliResult,
};

pub fn execute(args: CompletionsArgs) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    write_script(args.shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin, out);
}
