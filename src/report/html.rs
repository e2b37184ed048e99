use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Write the backend's HTML report under `<tmp>/crda` and return its `file://` URI.
pub fn save_report(html: &[u8], ecosystem: &str) -> Result<String> {
    save_report_in(&std::env::temp_dir().join("crda"), html, ecosystem)
}

/// Write the report as `stack-analysis-<ecosystem>-<unix-ts>.html` inside `dir`.
pub fn save_report_in(dir: &Path, html: &[u8], ecosystem: &str) -> Result<String> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;

    let file_name = format!(
        "stack-analysis-{}-{}.html",
        ecosystem,
        chrono::Utc::now().timestamp()
    );
    let path = dir.join(file_name);
    std::fs::write(&path, html)
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    debug!("html report saved to {}", path.display());
    Ok(format!("file://{}", path.display()))
}
