use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Dependency graph produced by a tree provider, forwarded to the backend as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGraph {
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Stack analysis report returned by the backend.
///
/// The schema is owned by the backend; every field defaults so that a partial
/// response still renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub dependencies: Vec<DependencyReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub dependencies: DependenciesSummary,
    pub vulnerabilities: VulnerabilitiesSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DependenciesSummary {
    pub scanned: u32,
    pub transitive: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilitiesSummary {
    pub direct: u32,
    pub total: u32,
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// A `name@version` package reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
}

impl std::fmt::Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DependencyReport {
    #[serde(rename = "ref")]
    pub reference: PackageRef,
    pub issues: Vec<Issue>,
    pub transitive: Vec<TransitiveReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_vulnerability: Option<Issue>,
    /// Remediations keyed by the CVE they fix.
    pub remediations: BTreeMap<String, Remediation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitiveReport {
    #[serde(rename = "ref")]
    pub reference: PackageRef,
    pub issues: Vec<Issue>,
    pub remediations: BTreeMap<String, Remediation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub source: String,
    pub severity: Severity,
    pub cves: Vec<String>,
    pub cvss_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Remediation {
    pub issue_ref: String,
    pub maven_package: PackageRef,
    pub product_status: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::High => write!(f, "High"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Low => write!(f, "Low"),
        }
    }
}

/// Backend response to a stack analysis request: plain JSON, or a multipart
/// body carrying the JSON report and, usually, a rendered HTML page.
#[derive(Debug, Clone)]
pub enum AnalysisResponse {
    Json(AnalysisReport),
    Mixed {
        report: AnalysisReport,
        html: Option<Vec<u8>>,
    },
}

impl AnalysisResponse {
    pub fn report(&self) -> &AnalysisReport {
        match self {
            AnalysisResponse::Json(report) => report,
            AnalysisResponse::Mixed { report, .. } => report,
        }
    }
}
