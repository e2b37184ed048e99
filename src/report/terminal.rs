use std::collections::BTreeMap;
use std::fmt::{self, Write};

use colored::*;

use crate::models::{AnalysisReport, Issue, Remediation, Severity};

const SNYK_VULN_URL: &str = "https://security.snyk.io/vuln/";

/// Print the summary, or the per-dependency breakdown when `verbose`.
pub fn render(report: &AnalysisReport, report_uri: &str, verbose: bool) -> fmt::Result {
    let out = if verbose {
        render_verbose(report, report_uri)?
    } else {
        render_summary(report, report_uri)?
    };
    print!("{}", out);
    Ok(())
}

/// Dependency and vulnerability counts followed by the full report location.
pub fn render_summary(report: &AnalysisReport, report_uri: &str) -> Result<String, fmt::Error> {
    let deps = &report.summary.dependencies;
    let vulns = &report.summary.vulnerabilities;

    let mut out = String::new();
    writeln!(out, "Summary Report for Dependency Analysis")?;
    writeln!(out)?;
    writeln!(out, "{}", format!("Total Scanned Dependencies: {}", deps.scanned).bright_white().bold())?;
    writeln!(
        out,
        "{}",
        format!("Total Scanned Transitive Dependencies: {}", deps.transitive).bright_white().bold()
    )?;
    writeln!(out, "{}", format!("Direct Vulnerable Dependencies: {}", vulns.direct).bright_white().bold())?;
    writeln!(out, "{}", format!("Total Vulnerabilities: {}", vulns.total).bright_white().bold())?;
    writeln!(out, "{}", format!("Critical Vulnerabilities: {}", vulns.critical).bright_red().bold())?;
    writeln!(out, "{}", format!("High Vulnerabilities: {}", vulns.high).bright_magenta().bold())?;
    writeln!(out, "{}", format!("Medium Vulnerabilities: {}", vulns.medium).bright_yellow().bold())?;
    writeln!(out, "{}", format!("Low Vulnerabilities: {}", vulns.low).bright_blue().bold())?;
    writeln!(out)?;
    writeln!(out, "{} {}", "Full Report:".bright_white().bold(), report_uri)?;
    Ok(out)
}

/// Per-dependency breakdown: direct and transitive issues plus remediations.
pub fn render_verbose(report: &AnalysisReport, report_uri: &str) -> Result<String, fmt::Error> {
    let deps = &report.summary.dependencies;
    let vulns = &report.summary.vulnerabilities;

    let mut out = String::new();
    writeln!(out, "Verbose Report for Dependency Analysis:")?;
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        format!("Scanned {} Dependencies and {} Transitives,", deps.scanned, deps.transitive)
            .white()
            .bold(),
        format!("Found {} Issues", vulns.total).red().bold()
    )?;
    writeln!(out)?;

    for dep in &report.dependencies {
        writeln!(
            out,
            "{}",
            format!("Direct dependency: {}", dep.reference).bright_white().bold()
        )?;

        if let Some(highest) = &dep.highest_vulnerability {
            writeln!(
                out,
                "\t{} {}",
                "\u{2212} Highest vulnerability:".white().bold(),
                describe_vulnerability(highest)
            )?;
        }

        if !dep.issues.is_empty() {
            writeln!(
                out,
                "{}",
                format!("\t\u{2212} {} Direct Vulnerabilities:", dep.issues.len()).bright_white().bold()
            )?;
            for issue in &dep.issues {
                writeln!(out, "\t\t\u{2718}  {}", describe_vulnerability(issue))?;
            }
        }

        if !dep.transitive.is_empty() {
            writeln!(
                out,
                "{}",
                format!("\t\u{2212} {} Transitive Vulnerabilities:", dep.transitive.len())
                    .bright_white()
                    .bold()
            )?;
            for transitive in &dep.transitive {
                if !transitive.issues.is_empty() {
                    writeln!(
                        out,
                        "\t\t{} {}",
                        "\u{2212} Transitive dependency:".white().bold(),
                        transitive.reference.to_string().bright_white().bold()
                    )?;
                    for issue in &transitive.issues {
                        writeln!(out, "\t\t\t\u{2718}  {}", describe_vulnerability(issue))?;
                    }
                }
                if !transitive.remediations.is_empty() {
                    writeln!(
                        out,
                        "{}",
                        format!(
                            "\t\t\u{2212} {} Remedying actions for transitive found:",
                            transitive.remediations.len()
                        )
                        .bright_white()
                        .bold()
                    )?;
                    write_remediations(&mut out, &transitive.remediations, "\t\t\t")?;
                }
            }
        }

        if !dep.remediations.is_empty() {
            writeln!(
                out,
                "{}",
                format!("\t\u{2212} {} Remedying actions found:", dep.remediations.len())
                    .bright_white()
                    .bold()
            )?;
            write_remediations(&mut out, &dep.remediations, "\t\t")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{} {}", "Full Report:".bright_white().bold(), report_uri)?;
    Ok(out)
}

fn write_remediations(
    out: &mut String,
    remediations: &BTreeMap<String, Remediation>,
    indent: &str,
) -> fmt::Result {
    for (cve, remediation) in remediations {
        writeln!(
            out,
            "{}",
            format!(
                "{}\u{2713}  {} can be remedied with {}",
                indent, cve, remediation.maven_package
            )
            .green()
            .bold()
        )?;
    }
    Ok(())
}

/// One-line description: `TITLE [Severity] [CVE...] (URL)`, colored by severity.
pub fn describe_vulnerability(issue: &Issue) -> ColoredString {
    let line = format!(
        "{} [{}] [{}] ({})",
        issue.title,
        issue.severity,
        issue.cves.join(" "),
        provider_url(&issue.source, &issue.id)
    );
    match issue.severity {
        Severity::Critical => line.red().bold(),
        Severity::High => line.bright_magenta().bold(),
        Severity::Medium => line.bright_yellow().bold(),
        Severity::Low => line.bright_blue().bold(),
    }
}

/// Link to the vulnerability on its provider's site.
pub fn provider_url(source: &str, id: &str) -> String {
    if source.eq_ignore_ascii_case("snyk") {
        format!("{}{}", SNYK_VULN_URL, id)
    } else {
        format!("{} not supported", source)
    }
}
