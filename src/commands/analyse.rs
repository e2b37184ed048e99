use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use super::Context;
use crate::auth::{ensure_user_key, is_snyk_token};
use crate::backend::{BackendClient, ProviderTokens, ResponseFormat};
use crate::config::ConfigKey;
use crate::manifest::{manifest_for_path, Manifest};
use crate::models::AnalysisResponse;
use crate::provider::TreeProvider;
use crate::report;
use crate::telemetry::{self, Property};

const UNAVAILABLE: &str = "unavailable";

/// Request a stack analysis for the manifest at `path` and print the report.
///
/// Exits with `2` (through the recorded `total-vulnerabilities`) when the
/// report lists any vulnerability.
pub async fn run(
    ctx: &mut Context,
    path: &Path,
    json: bool,
    verbose: bool,
    snyk_token: Option<&str>,
) -> Result<()> {
    debug!("executing analyse command");
    let manifest = manifest_for_path(path)?;
    let Some(provider) = manifest.provider else {
        bail!(
            "sorry, this is a wip, support for {} is not yet active",
            manifest.filename
        );
    };

    telemetry::ask_for_consent(&mut ctx.config);

    ctx.event.set(Property::Json, json);
    ctx.event.set(Property::Verbose, verbose);
    ctx.event.set(Property::Manifest, manifest.filename);
    ctx.event.set(Property::Ecosystem, manifest.ecosystem);

    let tokens = provider_tokens(ctx, snyk_token);
    let result = analyse(ctx, manifest, provider, path, &tokens, json, verbose).await;
    match &result {
        Ok(()) => ctx.event.set(Property::Success, true),
        Err(err) => ctx.event.record_failure(err),
    }
    result
}

fn provider_tokens(ctx: &Context, snyk_token: Option<&str>) -> ProviderTokens {
    let snyk = match snyk_token.filter(|t| is_snyk_token(t)) {
        Some(token) => {
            debug!("using snyk token from flag");
            Some(token.to_string())
        }
        None => ctx.config.get(ConfigKey::SnykToken).inspect(|_| {
            debug!("using snyk token from env/config");
        }),
    };
    ProviderTokens { snyk }
}

async fn analyse(
    ctx: &mut Context,
    manifest: &Manifest,
    provider: &dyn TreeProvider,
    path: &Path,
    tokens: &ProviderTokens,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let spinner = spinner(json)?;

    spinner.set_message(format!("Building {} dependency tree", manifest.ecosystem));
    let graph = match provider.provide(path).await {
        Ok(graph) => graph,
        Err(err) => {
            spinner.finish_and_clear();
            return Err(err);
        }
    };

    spinner.set_message("Analysing dependencies");
    let backend = BackendClient::new(ctx.client.as_str())?;
    let crda_key = ensure_user_key(&mut ctx.config, &backend).await;
    let format = if json {
        ResponseFormat::Json
    } else {
        ResponseFormat::Mixed
    };

    let response = backend
        .analyze_dependency_tree(
            &ctx.config.backend_host(),
            manifest.ecosystem,
            crda_key.as_deref(),
            tokens,
            &graph,
            format,
        )
        .await;
    spinner.finish_and_clear();
    let response = response?;

    let total = response.report().summary.vulnerabilities.total;
    ctx.event.set(Property::TotalVulnerabilities, total);

    if json {
        println!("{}", report::json::render(response.report(), verbose)?);
        return Ok(());
    }

    let (report, html) = match response {
        AnalysisResponse::Mixed { report, html } => (report, html),
        AnalysisResponse::Json(report) => (report, None),
    };
    let uri = report_uri(html.as_deref(), manifest.ecosystem)?;
    report::terminal::render(&report, &uri, verbose)?;
    Ok(())
}

/// Location of the saved HTML report, or `unavailable` without one.
fn report_uri(html: Option<&[u8]>, ecosystem: &str) -> Result<String> {
    match html {
        Some(html) => report::html::save_report(html, ecosystem),
        None => {
            debug!("no html report in the response");
            Ok(UNAVAILABLE.to_string())
        }
    }
}

/// Spinner on stderr; hidden for JSON output so stdout stays parseable.
fn spinner(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ClientKind;
    use crate::config::Config;
    use tempfile::TempDir;

    const VALID_TOKEN: &str = "a012345B-123C-432d-B123-80123456789B";

    fn context(dir: &TempDir, snyk: Option<&'static str>) -> Context {
        let config = Config::load_from(dir.path(), move |name| match name {
            "CRDA_SNYK_TOKEN" => snyk.map(str::to_string),
            "CONSENT_TELEMETRY" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        Context::new(config, ClientKind::Terminal)
    }

    #[test]
    fn test_snyk_token_from_flag_wins() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, Some("configured-token"));
        let tokens = provider_tokens(&ctx, Some(VALID_TOKEN));
        assert_eq!(tokens.snyk.as_deref(), Some(VALID_TOKEN));
    }

    #[test]
    fn test_invalid_flag_falls_back_to_config() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, Some("configured-token"));
        let tokens = provider_tokens(&ctx, Some("garbage"));
        assert_eq!(tokens.snyk.as_deref(), Some("configured-token"));
    }

    #[test]
    fn test_no_snyk_token() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, None);
        assert!(provider_tokens(&ctx, None).snyk.is_none());
    }

    #[test]
    fn test_report_uri_without_html() {
        assert_eq!(report_uri(None, "maven").unwrap(), "unavailable");
    }

    #[tokio::test]
    async fn test_inactive_manifest_is_rejected() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("package.json");
        std::fs::write(&manifest, "{}").unwrap();

        let mut ctx = context(&dir, None);
        let err = run(&mut ctx, &manifest, false, false, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "sorry, this is a wip, support for package.json is not yet active"
        );
    }
}
