//! Interactive questions asked on the terminal.
//!
//! Questions are written to stderr so stdout only carries command output.
//! The consent question is only asked on a terminal, see [`is_interactive`].
//! The Snyk token is read from stdin either way, so it can be piped in.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Result};
use colored::Colorize;
use crossterm::cursor::MoveToPreviousLine;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use tracing::debug;

use crate::auth::is_snyk_token;

const SNYK_TOKEN_URL: &str = "https://app.snyk.io/redhat/snyk-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    Yes,
    No,
    Later,
}

pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Ask for a Snyk token, clearing the typed token from a terminal.
pub fn snyk_token() -> Result<String> {
    let stdin = io::stdin();
    snyk_token_from(&mut stdin.lock(), &mut io::stderr(), is_interactive())
}

/// Read a Snyk token from `input`, re-asking while the entry is invalid.
///
/// An empty or unreadable entry gives up. With `hide_entered` the echoed
/// entry line is erased once read.
pub fn snyk_token_from(input: &mut impl BufRead, out: &mut impl Write, hide_entered: bool) -> Result<String> {
    writeln!(out, "To get Snyk Token, Please click {}", SNYK_TOKEN_URL)?;
    loop {
        write!(out, "{} {}: ", "Snyk Token".green().bold(), "[press Enter to continue]".dimmed())?;
        out.flush()?;

        let answer = read_answer(input);
        if hide_entered {
            execute!(out, MoveToPreviousLine(1), Clear(ClearType::CurrentLine))?;
        }
        let token = match answer {
            Some(token) if !token.is_empty() => token,
            _ => bail!("unable to read snyk token, try later"),
        };
        if is_snyk_token(&token) {
            return Ok(token);
        }
        writeln!(out, "{}", "invalid snyk token".red())?;
    }
}

/// Ask whether anonymous usage statistics may be collected.
pub fn consent_from(input: &mut impl BufRead, out: &mut impl Write) -> Result<Consent> {
    loop {
        write!(
            out,
            "{} [yes/no/later]: ",
            "Would you like to contribute towards anonymous usage statistics?".bold()
        )?;
        out.flush()?;

        let Some(answer) = read_answer(input) else {
            bail!("failed to read telemetry consent");
        };
        match parse_consent(&answer) {
            Some(consent) => return Ok(consent),
            None => debug!("unrecognized consent answer {:?}", answer),
        }
    }
}

pub fn parse_consent(answer: &str) -> Option<Consent> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Consent::Yes),
        "n" | "no" => Some(Consent::No),
        "l" | "later" => Some(Consent::Later),
        _ => None,
    }
}

/// One trimmed line, or `None` on EOF or a read error.
fn read_answer(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}
