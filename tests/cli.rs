//! Integration tests for the `crda` binary.
//!
//! Every test runs with `HOME` pointing at a temporary directory so the
//! user's real configuration and telemetry id are never touched.

use std::path::Path;

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CRDA_ENV: [&str; 7] = [
    "CONSENT_TELEMETRY",
    "CRDA_BACKEND_HOST",
    "CRDA_AUTH_HOST",
    "CRDA_AUTH_TOKEN",
    "CRDA_KEY",
    "CRDA_SNYK_TOKEN",
    "CRDA_SEGMENT_WRITE_KEY",
];

fn crda(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_crda"));
    for var in CRDA_ENV {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_prints_build_info() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("v{}-", env!("CARGO_PKG_VERSION"))))
        .stdout(predicate::str::contains("BuildDate: "))
        .stdout(predicate::str::contains("Vendor: "));
}

#[test]
fn help_exits_zero() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyse"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn unknown_flag_exits_one() {
    let home = TempDir::new().unwrap();
    crda(home.path()).args(["version", "--bogus"]).assert().code(1);
}

#[test]
fn unsupported_client_exits_one() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .args(["--client", "emacs", "version"])
        .assert()
        .code(1);
}

#[test]
fn first_run_creates_config_file() {
    let home = TempDir::new().unwrap();
    crda(home.path()).arg("version").assert().success();

    let content = std::fs::read_to_string(home.path().join(".crda").join("config.yaml")).unwrap();
    assert!(content.contains("crda_backend_host"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();

    crda(home.path())
        .args(["config", "set", "crda_key", "my-crda-key"])
        .assert()
        .success()
        .stdout("crda_key: my-crda-key\n");

    crda(home.path())
        .args(["config", "get", "crda_key"])
        .assert()
        .success()
        .stdout("crda_key: my-crda-key\n");

    crda(home.path())
        .args(["config", "get"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crda_backend_host: "))
        .stdout(predicate::str::contains("crda_key: my-crda-key"));
}

#[test]
fn config_get_unset_key_fails_with_usage() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .args(["config", "get", "crda_snyk_token"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config key crda_snyk_token is not set"))
        .stderr(predicate::str::contains("Usage: crda config get"));
}

#[test]
fn config_set_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .args(["config", "set", "bogus", "value"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("supported config keys are consent_telemetry"));
}

#[test]
fn config_set_rejects_non_bool_consent() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .args(["config", "set", "consent_telemetry", "perhaps"])
        .assert()
        .code(1);
}

#[test]
fn completion_bash() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_crda"));
}

#[test]
fn analyse_directory_is_rejected() {
    let home = TempDir::new().unwrap();
    crda(home.path())
        .args(["analyse"])
        .arg(home.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("please use path to manifest file as input"));
}

#[test]
fn analyse_unknown_manifest_is_rejected() {
    let home = TempDir::new().unwrap();
    let manifest = home.path().join("build.gradle");
    std::fs::write(&manifest, "").unwrap();

    crda(home.path())
        .arg("analyse")
        .arg(&manifest)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("manifest build.gradle is not supported"));
}

#[test]
fn analyze_alias_reports_inactive_ecosystem() {
    let home = TempDir::new().unwrap();
    let manifest = home.path().join("go.mod");
    std::fs::write(&manifest, "module example.com/m\n").unwrap();

    crda(home.path())
        .env("CONSENT_TELEMETRY", "false")
        .arg("analyze")
        .arg(&manifest)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("support for go.mod is not yet active"));
}

#[cfg(unix)]
mod analyse_maven {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FAKE_MVN: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    -DoutputFile=*) printf 'digraph "g:a:jar:1" {}' > "${arg#-DoutputFile=}" ;;
  esac
done
exit 0
"#;

    fn install_fake_mvn(dir: &Path) {
        let bin = dir.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let mvn = bin.join("mvn");
        std::fs::write(&mvn, FAKE_MVN).unwrap();
        std::fs::set_permissions(&mvn, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn json_report_with_vulnerabilities_exits_two() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/dependency-analysis/maven"))
            .and(header("Client", "gh-actions"))
            .and(header("Uuid", "existing-key"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "summary": {
                    "dependencies": { "scanned": 3, "transitive": 12 },
                    "vulnerabilities": { "direct": 1, "total": 2, "high": 2 }
                },
                "dependencies": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let home = TempDir::new().unwrap();
        let mut cmd = analyse_cmd(home.path(), &server.uri());
        cmd.args(["analyse", "--json", "--client", "gh-actions"])
            .arg(home.path().join("pom.xml"));

        let output = tokio::task::spawn_blocking(move || cmd.output())
            .await
            .unwrap()
            .unwrap();

        let assert = output.assert().code(2);
        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(summary["vulnerabilities"]["total"], 2);
        assert_eq!(summary["dependencies"]["scanned"], 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn terminal_report_saves_html_and_exits_zero() {
        let server = mock_mixed_backend().await;
        let home = TempDir::new().unwrap();
        let mut cmd = analyse_cmd(home.path(), &server.uri());
        cmd.args(["analyse", "--no-color"]).arg(home.path().join("pom.xml"));

        let output = tokio::task::spawn_blocking(move || cmd.output())
            .await
            .unwrap()
            .unwrap();

        let assert = output.assert().success();
        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        assert!(stdout.starts_with("Summary Report for Dependency Analysis\n"));
        assert!(stdout.contains("Total Scanned Dependencies: 3\n"));
        assert!(stdout.contains("Total Vulnerabilities: 0\n"));
        assert_html_saved(home.path(), &stdout);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn verbose_terminal_report_lists_dependencies() {
        let server = mock_mixed_backend().await;
        let home = TempDir::new().unwrap();
        let mut cmd = analyse_cmd(home.path(), &server.uri());
        cmd.args(["analyse", "--verbose", "--no-color"])
            .arg(home.path().join("pom.xml"));

        let output = tokio::task::spawn_blocking(move || cmd.output())
            .await
            .unwrap()
            .unwrap();

        let assert = output.assert().success();
        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        assert!(stdout.starts_with("Verbose Report for Dependency Analysis:\n"));
        assert!(stdout.contains("Scanned 3 Dependencies and 12 Transitives, Found 0 Issues"));
        assert!(stdout.contains("Direct dependency: io.quarkus:quarkus-core@2.13.5.Final\n"));
        assert_html_saved(home.path(), &stdout);
    }

    const REPORT_HTML: &str = "<html><body><p>Fake Report</p></body></html>";

    /// Backend answering terminal runs with a JSON report and an HTML page.
    async fn mock_mixed_backend() -> MockServer {
        let report = serde_json::json!({
            "summary": {
                "dependencies": { "scanned": 3, "transitive": 12 },
                "vulnerabilities": { "direct": 0, "total": 0 }
            },
            "dependencies": [
                { "ref": { "name": "io.quarkus:quarkus-core", "version": "2.13.5.Final" } }
            ]
        });
        let body = format!(
            "--crda\r\nContent-Type: application/json\r\n\r\n{}\r\n\
             --crda\r\nContent-Type: text/html\r\n\r\n{}\r\n--crda--\r\n",
            report, REPORT_HTML
        );

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/dependency-analysis/maven"))
            .and(header("Accept", "multipart/mixed"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "multipart/mixed; boundary=crda"))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    /// `crda` with a fake `mvn` on `PATH`, a `pom.xml` and a private temp dir under `home`.
    fn analyse_cmd(home: &Path, backend: &str) -> std::process::Command {
        install_fake_mvn(home);
        std::fs::write(home.join("pom.xml"), "<project></project>").unwrap();
        let tmp = home.join("tmp");
        std::fs::create_dir_all(&tmp).unwrap();

        let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_crda"));
        for var in CRDA_ENV {
            cmd.env_remove(var);
        }
        cmd.env("HOME", home)
            .env("TMPDIR", &tmp)
            .env("PATH", format!("{}:/usr/bin:/bin", home.join("bin").display()))
            .env("CRDA_BACKEND_HOST", backend)
            .env("CRDA_KEY", "existing-key")
            .env("CONSENT_TELEMETRY", "false");
        cmd
    }

    fn assert_html_saved(home: &Path, stdout: &str) {
        let uri = stdout
            .lines()
            .find_map(|line| line.strip_prefix("Full Report: "))
            .expect("report location printed");
        let saved = uri.strip_prefix("file://").expect("file uri");
        assert!(Path::new(saved).starts_with(home.join("tmp").join("crda")));
        assert_eq!(std::fs::read_to_string(saved).unwrap(), REPORT_HTML);
    }
}
