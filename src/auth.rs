use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::backend::BackendClient;
use crate::config::{Config, ConfigKey};
use crate::prompts;
use crate::telemetry::{self, EventProperties, Property};

static SNYK_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-4[a-fA-F0-9]{3}-[8|9aAbB][a-fA-F0-9]{3}-[a-fA-F0-9]{12}$")
        .expect("snyk token pattern is a valid regex")
});

/// Check `token` against Snyk's token format. Empty strings never match.
pub fn is_snyk_token(token: &str) -> bool {
    SNYK_TOKEN.is_match(token)
}

/// Return the stored user key, asking the backend for a new one when absent.
///
/// A newly issued key is persisted. Failing to obtain one is not fatal.
pub async fn ensure_user_key(config: &mut Config, backend: &BackendClient) -> Option<String> {
    if let Some(key) = config.get(ConfigKey::CrdaKey) {
        return Some(key);
    }

    let auth_token = config.get(ConfigKey::AuthToken).unwrap_or_default();
    match backend.request_new_user_key(&config.auth_host(), &auth_token).await {
        Ok(key) if !key.is_empty() => {
            if let Err(err) = config.set(ConfigKey::CrdaKey, &key).and_then(|_| config.save()) {
                debug!("failed to persist the new user key: {:#}", err);
            }
            Some(key)
        }
        Ok(_) => {
            debug!("backend issued an empty user key");
            None
        }
        Err(err) => {
            debug!("failed to obtain a user key: {}", err);
            None
        }
    }
}

/// Link the user key with a Snyk token, taken from `snyk_token` when valid or
/// prompted for otherwise.
pub async fn authenticate_user(
    config: &mut Config,
    backend: &BackendClient,
    event: &mut EventProperties,
    snyk_token: Option<&str>,
) -> Result<()> {
    telemetry::ask_for_consent(config);

    let crda_key = ensure_user_key(config, backend).await;

    let token = match snyk_token.filter(|t| is_snyk_token(t)) {
        Some(token) => token.to_string(),
        None => prompts::snyk_token()?,
    };

    let mut associated = false;
    match crda_key {
        Some(key) if !token.is_empty() => {
            let auth_token = config.get(ConfigKey::AuthToken).unwrap_or_default();
            backend
                .associate_snyk_token(&config.auth_host(), &auth_token, &key, &token)
                .await?;
            associated = true;
        }
        _ => debug!("no user key or token, association skipped"),
    }
    event.set(Property::SnykTokenAssociated, associated);

    Ok(())
}
