use std::io::Write;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Print the completion script for `shell` to stdout.
pub fn run(shell: Shell) -> Result<()> {
    let mut stdout = std::io::stdout();
    write_script(shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn write_script(shell: Shell, out: &mut impl Write) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_mentions_subcommands() {
        let mut out = Vec::new();
        write_script(Shell::Bash, &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("crda"));
        assert!(script.contains("analyse"));
        assert!(script.contains("completion"));
    }
}
