//! Anonymous usage telemetry.
//!
//! Every invocation collects [`EventProperties`]; when the user has consented
//! and a sink is configured, an `identify` and a `track` message are pushed
//! once the command finishes. Telemetry never affects the exit code.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::{Config, ConfigKey};
use crate::prompts::{self, Consent};

pub mod identity;
pub mod segment;

/// Event property keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Property {
    Manifest,
    ExitCode,
    Client,
    TotalVulnerabilities,
    Ecosystem,
    SnykTokenAssociated,
    Json,
    Verbose,
    Success,
    Platform,
    Version,
    Duration,
    Error,
}

impl Property {
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Manifest => "manifest",
            Property::ExitCode => "exit-code",
            Property::Client => "client",
            Property::TotalVulnerabilities => "total-vulnerabilities",
            Property::Ecosystem => "ecosystem",
            Property::SnykTokenAssociated => "snyk-token-associated",
            Property::Json => "json",
            Property::Verbose => "verbose",
            Property::Success => "success",
            Property::Platform => "platform",
            Property::Version => "version",
            Property::Duration => "duration",
            Property::Error => "error",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties collected while a command runs.
#[derive(Debug, Clone, Default)]
pub struct EventProperties {
    values: BTreeMap<Property, String>,
}

impl EventProperties {
    pub fn set(&mut self, key: Property, value: impl fmt::Display) {
        self.values.insert(key, value.to_string());
    }

    pub fn get(&self, key: Property) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Record a failed command: `success=false` and the masked error.
    pub fn record_failure(&mut self, err: &anyhow::Error) {
        self.set(Property::Success, false);
        self.set(Property::Error, mask_error(err));
    }

    fn to_map(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.clone()))
            .collect()
    }
}

/// A message in a telemetry batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Identify {
        #[serde(rename = "userId")]
        user_id: String,
        timestamp: DateTime<Utc>,
    },
    Track {
        #[serde(rename = "userId")]
        user_id: String,
        event: String,
        properties: BTreeMap<String, String>,
        timestamp: DateTime<Utc>,
    },
}

/// Destination for telemetry messages.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, messages: Vec<Message>) -> Result<()>;
}

/// Push the `identify` and `track` messages for one command invocation.
///
/// Does nothing without consent. `platform`, `version` and `duration` are
/// added to `props`.
pub async fn push_event(
    consent: bool,
    sink: &dyn EventSink,
    user_id: &str,
    event_name: &str,
    props: &EventProperties,
    started: Instant,
) -> Result<()> {
    if !consent {
        debug!("pushing telemetry skipped, no consent given");
        return Ok(());
    }
    debug!("pushing telemetry track event");

    let mut props = props.clone();
    props.set(Property::Platform, std::env::consts::OS);
    props.set(Property::Version, env!("CARGO_PKG_VERSION"));
    props.set(Property::Duration, format!("{:?}", started.elapsed()));

    let now = Utc::now();
    sink.send(vec![
        Message::Identify {
            user_id: user_id.to_string(),
            timestamp: now,
        },
        Message::Track {
            user_id: user_id.to_string(),
            event: event_name.to_string(),
            properties: props.to_map(),
            timestamp: now,
        },
    ])
    .await
}

/// Send the invocation's event if a sink is configured. Failures are logged.
pub async fn flush(config: &Config, event_name: &str, props: &EventProperties, started: Instant) {
    let Some(sink) = segment::SegmentSink::from_env() else {
        debug!("no telemetry sink configured");
        return;
    };
    let Some(id_file) = identity::default_identity_file() else {
        debug!("no home directory for the telemetry user id");
        return;
    };

    let user_id = match identity::get_or_create_user_id(&id_file) {
        Ok(id) => id,
        Err(err) => {
            debug!("no user id to push telemetry, {:#}", err);
            return;
        }
    };

    let consent = config.consent().unwrap_or(false);
    if let Err(err) = push_event(consent, &sink, &user_id, event_name, props, started).await {
        debug!("failed to push telemetry event, {:#}", err);
    }
}

/// Ask for telemetry consent once; `Yes` and `No` are persisted, `Later` asks again next time.
///
/// The exchange happens on stderr so piped stdout stays machine readable.
pub fn ask_for_consent(config: &mut Config) {
    if config.consent().is_some() || !prompts::is_interactive() {
        return;
    }
    let stdin = io::stdin();
    if let Err(err) = ask_for_consent_with(config, &mut stdin.lock(), &mut io::stderr()) {
        debug!("failed to get user consent for telemetry, {:#}", err);
    }
}

fn ask_for_consent_with(config: &mut Config, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "We're constantly improving this tool and would like to know more about its usage \
         (more details at https://developers.redhat.com/article/tool-data-collection)"
    )?;
    writeln!(
        out,
        "Your preference can be changed manually if desired using 'crda config set consent_telemetry true|false'"
    )?;

    let value = match prompts::consent_from(input, out)? {
        Consent::Later => {
            writeln!(out, "Ok. I will ask you again later")?;
            return Ok(());
        }
        Consent::Yes => {
            writeln!(
                out,
                "Thanks for helping us! You can disable telemetry using 'crda config set consent_telemetry false'"
            )?;
            "true"
        }
        Consent::No => {
            writeln!(
                out,
                "No worries, you can still enable telemetry using 'crda config set consent_telemetry true'"
            )?;
            "false"
        }
    };

    if let Err(err) = config
        .set(ConfigKey::ConsentTelemetry, value)
        .and_then(|_| config.save())
    {
        debug!("failed to write configuration for telemetry consent, {:#}", err);
    }
    Ok(())
}

/// Root cause of `err` with the home directory and user name masked.
pub fn mask_error(err: &anyhow::Error) -> String {
    let home = dirs::home_dir().map(|h| h.display().to_string());
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok();
    mask_message(&err.root_cause().to_string(), home.as_deref(), user.as_deref())
}

fn mask_message(message: &str, home: Option<&str>, user: Option<&str>) -> String {
    let mut masked = message.to_string();
    if let Some(home) = home.filter(|h| !h.is_empty()) {
        masked = masked.replace(home, "$HOME");
    }
    if let Some(user) = user.filter(|u| !u.is_empty()) {
        masked = masked.replace(user, "$USERNAME");
    }
    masked
}
