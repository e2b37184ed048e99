use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{join_url, BackendClient, BackendError};

const USER_PATH: &str = "/user";

#[derive(Debug, Deserialize)]
struct NewUserKey {
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Serialize)]
struct SnykTokenAssociation<'a> {
    user_id: &'a str,
    snyk_api_token: &'a str,
}

impl BackendClient {
    /// Ask the backend to issue a new user key.
    pub async fn request_new_user_key(
        &self,
        host: &str,
        auth_token: &str,
    ) -> Result<String, BackendError> {
        debug!("requesting a new user key");
        let response = self
            .http
            .post(join_url(host, USER_PATH))
            .query(&[("user_key", auth_token)])
            .header("Client", &self.client_name)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(BackendError::Status {
                operation: "new user key",
                status: response.status(),
            });
        }

        let parsed: NewUserKey = response.json().await?;
        Ok(parsed.user_id)
    }

    /// Associate a Snyk API token with an existing user key.
    pub async fn associate_snyk_token(
        &self,
        host: &str,
        auth_token: &str,
        crda_key: &str,
        snyk_token: &str,
    ) -> Result<(), BackendError> {
        debug!("associating snyk token with user key");
        let response = self
            .http
            .put(join_url(host, USER_PATH))
            .query(&[("user_key", auth_token)])
            .header("Client", &self.client_name)
            .header("Uuid", crda_key)
            .json(&SnykTokenAssociation {
                user_id: crda_key,
                snyk_api_token: snyk_token,
            })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(BackendError::Status {
                operation: "associate snyk token",
                status: response.status(),
            });
        }
        Ok(())
    }
}
