use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

use super::{join_url, parsers, BackendClient, BackendError, ProviderTokens, ResponseFormat};
use crate::models::{AnalysisResponse, DependencyGraph};

impl BackendClient {
    /// Request a stack analysis for `graph`.
    ///
    /// `crda_key` is sent as the `Uuid` header when present; provider tokens
    /// are forwarded as their own headers.
    pub async fn analyze_dependency_tree(
        &self,
        host: &str,
        ecosystem: &str,
        crda_key: Option<&str>,
        tokens: &ProviderTokens,
        graph: &DependencyGraph,
        format: ResponseFormat,
    ) -> Result<AnalysisResponse, BackendError> {
        let url = join_url(host, &format!("/api/v3/dependency-analysis/{}", ecosystem));
        debug!(%url, accept = format.accept(), "requesting stack analysis");

        let mut request = self
            .http
            .post(&url)
            .header("Client", &self.client_name)
            .header(CONTENT_TYPE, &graph.content_type)
            .header(ACCEPT, format.accept())
            .body(graph.content.clone());

        if let Some(key) = crda_key {
            request = request.header("Uuid", key);
        }
        for (name, value) in tokens.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(BackendError::Status {
                operation: "analyze dependencies",
                status: response.status(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?;
        debug!(%content_type, bytes = body.len(), "received stack analysis");

        parsers::parse_analysis_response(&content_type, &body)
    }
}
