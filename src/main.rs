//! `crda`: CodeReady Dependency Analytics client.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]); argument errors exit `1`.
//! 2. Configure logging ([`logging`]) and terminal colors.
//! 3. Load `$HOME/.crda/config.yaml` with environment overrides ([`config`]).
//! 4. Run the subcommand ([`commands`]); `analyse` resolves the manifest
//!    ([`manifest`]), builds its dependency tree ([`provider`]), asks the
//!    backend for a stack analysis ([`backend`]) and renders it ([`report`]).
//! 5. On error print it followed by the subcommand usage.
//! 6. Push the telemetry event when consented ([`telemetry`]).
//! 7. Exit `0` (clean), `1` (error) or `2` (vulnerabilities found).

mod auth;
mod backend;
mod cli;
mod commands;
mod config;
mod logging;
mod manifest;
mod models;
mod prompts;
mod provider;
mod report;
mod telemetry;

use std::time::Instant;

use clap::{CommandFactory, Parser};
use tracing::debug;

use cli::Cli;
use commands::{exit_code, Context, EXIT_ERROR, EXIT_OK};
use config::Config;
use telemetry::Property;

#[tokio::main]
async fn main() {
    let code = run().await;
    std::process::exit(code);
}

async fn run() -> i32 {
    let started = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are reported through clap errors too
            return if err.use_stderr() { EXIT_ERROR } else { EXIT_OK };
        }
    };

    logging::init(cli.debug);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = match config::default_directory().and_then(|dir| Config::load(&dir)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:#}", err);
            return EXIT_ERROR;
        }
    };

    let mut ctx = Context::new(config, cli.client);
    let command_path = cli.command.path();

    debug!("executing {}", command_path.join(" "));
    let result = commands::run(&cli.command, &mut ctx).await;
    if let Err(err) = &result {
        eprintln!("{:#}", err);
        eprintln!();
        eprintln!("{}", usage(&command_path));
    }

    let code = exit_code(&result, &ctx.event);
    ctx.event.set(Property::ExitCode, code);

    let event_name = format!("crda {}", command_path.join(" "));
    telemetry::flush(&ctx.config, &event_name, &ctx.event, started).await;

    debug!("exiting with code {}", code);
    code
}

/// Usage line of the subcommand at `path`, e.g. `["config", "set"]`.
fn usage(path: &[&str]) -> String {
    let mut cmd = Cli::command();
    cmd.build();

    for name in path {
        match cmd.find_subcommand(name) {
            Some(sub) => cmd = sub.clone(),
            None => break,
        }
    }
    cmd.render_usage().to_string()
}
