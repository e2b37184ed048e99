//! HTTP client for the CRDA backend.
//!
//! - [`analysis`]: uploads a dependency graph and returns the stack analysis.
//! - [`user`]: issues user keys and associates provider tokens with them.
//! - [`parsers`]: decodes JSON and `multipart/mixed` analysis responses.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

pub mod analysis;
pub mod parsers;
pub mod user;

/// Stack analyses can take a while on large trees.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Header carrying a Snyk API token to unlock private vulnerability data.
pub const SNYK_TOKEN_HEADER: &str = "crda-snyk-token";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{operation} request failed, {status}")]
    Status {
        operation: &'static str,
        status: StatusCode,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("content type {0} is not supported")]
    UnsupportedContentType(String),

    #[error("unknown response type {0}")]
    UnknownPart(String),

    #[error("malformed multipart response: {0}")]
    Multipart(String),

    #[error("failed to parse analysis report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Response representation requested through the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `application/json` only.
    Json,
    /// `multipart/mixed` carrying the JSON report and an HTML page.
    Mixed,
}

impl ResponseFormat {
    pub fn accept(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Mixed => "multipart/mixed",
        }
    }
}

/// Third-party vulnerability provider tokens forwarded as request headers.
#[derive(Debug, Clone, Default)]
pub struct ProviderTokens {
    pub snyk: Option<String>,
}

impl ProviderTokens {
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers = Vec::new();
        if let Some(token) = &self.snyk {
            headers.push((SNYK_TOKEN_HEADER, token.as_str()));
        }
        headers
    }
}

/// Backend client; every request carries the invoking client name in the
/// `Client` header.
pub struct BackendClient {
    http: Client,
    client_name: String,
}

impl BackendClient {
    pub fn new(client_name: impl Into<String>) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("crda/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            client_name: client_name.into(),
        })
    }
}

fn join_url(host: &str, path: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_headers() {
        assert_eq!(ResponseFormat::Json.accept(), "application/json");
        assert_eq!(ResponseFormat::Mixed.accept(), "multipart/mixed");
    }

    #[test]
    fn test_provider_token_headers() {
        assert!(ProviderTokens::default().headers().is_empty());

        let tokens = ProviderTokens {
            snyk: Some("token".to_string()),
        };
        assert_eq!(tokens.headers(), vec![(SNYK_TOKEN_HEADER, "token")]);
    }

    #[test]
    fn test_join_url_strips_trailing_slash() {
        assert_eq!(join_url("http://host/", "/user"), "http://host/user");
        assert_eq!(join_url("http://host", "/user"), "http://host/user");
    }

    #[test]
    fn test_status_error_message() {
        let err = BackendError::Status {
            operation: "analyze dependencies",
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(
            err.to_string(),
            "analyze dependencies request failed, 500 Internal Server Error"
        );
    }
}
