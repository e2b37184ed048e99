use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::manifest::supported_filenames;

#[derive(Parser, Debug)]
#[command(
    name = "crda",
    about = "CLI for interacting with the Crda platform",
    long_about = "Use this tool for CodeReady Dependency Analytics reports",
    disable_version_flag = true
)]
pub struct Cli {
    /// Set DEBUG log level
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Toggle colors in output
    #[arg(short = 'c', long, global = true)]
    pub no_color: bool,

    /// The invoking client for telemetry
    #[arg(short = 'm', long, global = true, default_value = "terminal", value_name = "CLIENT")]
    pub client: ClientKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Perform dependency analysis report
    ///
    /// Exits with status code 2 if vulnerabilities are found.
    #[command(visible_alias = "analyze")]
    Analyse {
        #[arg(value_name = "MANIFEST", help = manifest_help())]
        path: PathBuf,

        /// Get report in a JSON format
        #[arg(short, long)]
        json: bool,

        /// Get detailed report
        #[arg(short, long)]
        verbose: bool,

        /// Include snyk token for private snyk vulnerabilities
        #[arg(long, value_name = "TOKEN")]
        snyk_token: Option<String>,
    },

    /// Link crda user with snyk
    ///
    /// Links the crda user key with a provider token, i.e. Snyk, to unlock
    /// verbose stack analyses.
    Auth {
        /// Token for Snyk Authentication
        #[arg(short = 't', long, value_name = "TOKEN")]
        snyk_token: Option<String>,
    },

    /// Manage crda config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Get binary version
    Version,

    /// Generate the autocompletion script for the specified shell
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn manifest_help() -> String {
    format!("Path to the manifest file, one of {}", supported_filenames().join(", "))
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Display crda config, a single key or all of them
    Get {
        /// consent_telemetry, crda_backend_host, crda_auth_host, crda_auth_token, crda_key or crda_snyk_token
        key: Option<String>,
    },
    /// Set a crda config key
    Set { key: String, value: String },
}

impl Command {
    /// Subcommand path used as the telemetry event name and for usage output.
    pub fn path(&self) -> Vec<&'static str> {
        match self {
            Command::Analyse { .. } => vec!["analyse"],
            Command::Auth { .. } => vec!["auth"],
            Command::Config {
                action: ConfigAction::Get { .. },
            } => vec!["config", "get"],
            Command::Config {
                action: ConfigAction::Set { .. },
            } => vec!["config", "set"],
            Command::Version => vec!["version"],
            Command::Completion { .. } => vec!["completion"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClientKind {
    Jenkins,
    Terminal,
    Tekton,
    GhActions,
    Intellij,
    Vscode,
    Image,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Jenkins => "jenkins",
            ClientKind::Terminal => "terminal",
            ClientKind::Tekton => "tekton",
            ClientKind::GhActions => "gh-actions",
            ClientKind::Intellij => "intellij",
            ClientKind::Vscode => "vscode",
            ClientKind::Image => "image",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyse_alias_and_flags() {
        let cli = Cli::try_parse_from(["crda", "analyze", "pom.xml", "-j", "-v", "-m", "gh-actions"]).unwrap();
        assert_eq!(cli.client, ClientKind::GhActions);
        match cli.command {
            Command::Analyse {
                path,
                json,
                verbose,
                snyk_token,
            } => {
                assert_eq!(path, PathBuf::from("pom.xml"));
                assert!(json && verbose);
                assert!(snyk_token.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["crda", "version", "-d", "-c"]).unwrap();
        assert!(cli.debug);
        assert!(cli.no_color);
        assert_eq!(cli.client, ClientKind::Terminal);
    }

    #[test]
    fn test_unknown_client_rejected() {
        assert!(Cli::try_parse_from(["crda", "-m", "emacs", "version"]).is_err());
    }

    #[test]
    fn test_command_path() {
        let cli = Cli::try_parse_from(["crda", "config", "set", "crda_key", "abc"]).unwrap();
        assert_eq!(cli.command.path(), vec!["config", "set"]);
    }
}
