//! Subcommand handlers.
//!
//! Each handler returns `anyhow::Result<()>`; [`exit_code`] maps the outcome
//! and the collected telemetry to the process exit status.

use anyhow::Result;

use crate::cli::{ClientKind, Command, ConfigAction};
use crate::config::Config;
use crate::telemetry::{EventProperties, Property};

pub mod analyse;
pub mod auth;
pub mod completion;
pub mod config;
pub mod version;

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_VULNERABILITIES: i32 = 2;

/// State shared by every subcommand of one invocation.
pub struct Context {
    pub config: Config,
    pub client: ClientKind,
    pub event: EventProperties,
}

impl Context {
    pub fn new(config: Config, client: ClientKind) -> Self {
        let mut event = EventProperties::default();
        event.set(Property::Client, client);
        Self {
            config,
            client,
            event,
        }
    }
}

pub async fn run(command: &Command, ctx: &mut Context) -> Result<()> {
    match command {
        Command::Analyse {
            path,
            json,
            verbose,
            snyk_token,
        } => analyse::run(ctx, path, *json, *verbose, snyk_token.as_deref()).await,
        Command::Auth { snyk_token } => auth::run(ctx, snyk_token.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config::get(&ctx.config, key.as_deref()),
            ConfigAction::Set { key, value } => config::set(&mut ctx.config, key, value),
        },
        Command::Version => {
            version::run();
            Ok(())
        }
        Command::Completion { shell } => completion::run(*shell),
    }
}

/// `1` on error, `2` when vulnerabilities were found, `0` otherwise.
pub fn exit_code(result: &Result<()>, event: &EventProperties) -> i32 {
    if result.is_err() {
        return EXIT_ERROR;
    }
    let vulnerabilities = event
        .get(Property::TotalVulnerabilities)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    if vulnerabilities > 0 {
        EXIT_VULNERABILITIES
    } else {
        EXIT_OK
    }
}
