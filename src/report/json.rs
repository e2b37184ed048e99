use anyhow::Result;

use crate::models::AnalysisReport;

/// Pretty-printed JSON: the whole report when `verbose`, else only its summary.
pub fn render(report: &AnalysisReport, verbose: bool) -> Result<String> {
    let output = if verbose {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string_pretty(&report.summary)?
    };
    Ok(output)
}
