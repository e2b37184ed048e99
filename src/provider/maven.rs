use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::models::DependencyGraph;

/// Content type of the graph written by `dependency:tree -DoutputType=dot`.
pub const GRAPHVIZ_CONTENT_TYPE: &str = "text/vnd.graphviz";

/// Marker comment excluding a `<dependency>` from the analysed tree.
const IGNORE_MARKER: &str = "crdaignore";

/// Tree provider for Maven projects.
///
/// Runs `mvn clean` followed by `mvn dependency:tree` in dot format and
/// returns the resulting graph. Dependencies annotated with a
/// `<!-- crdaignore -->` comment are passed to the plugin as excludes.
pub struct MavenTreeProvider {
    executable: Option<PathBuf>,
}

impl MavenTreeProvider {
    /// Provider resolving `mvn` from `PATH` at invocation time.
    pub const fn new() -> Self {
        Self { executable: None }
    }

    /// Provider using an explicit `mvn` executable.
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }

    fn locate(&self) -> Result<PathBuf> {
        if let Some(path) = &self.executable {
            return Ok(path.clone());
        }
        find_mvn(std::env::var_os("PATH"))
    }
}

impl Default for MavenTreeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::TreeProvider for MavenTreeProvider {
    async fn provide(&self, manifest_path: &Path) -> Result<DependencyGraph> {
        let mvn = self.locate()?;
        debug!(mvn = %mvn.display(), manifest = %manifest_path.display(), "building maven dependency tree");

        // Removed on drop, whatever the outcome.
        let workdir = tempfile::tempdir().context("failed to create temporary directory")?;
        let output = workdir.path().join("deps-tree.dot");

        let ignored = ignored_dependencies(manifest_path);
        if !ignored.is_empty() {
            debug!(count = ignored.len(), "excluding ignored dependencies");
        }

        run_mvn(&mvn, &clean_args(manifest_path)).await?;
        run_mvn(&mvn, &tree_args(manifest_path, &output, &ignored)).await?;

        let content = tokio::fs::read(&output)
            .await
            .with_context(|| format!("failed to read dependency tree {}", output.display()))?;

        Ok(DependencyGraph {
            content,
            content_type: GRAPHVIZ_CONTENT_TYPE.to_string(),
        })
    }
}

fn clean_args(manifest_path: &Path) -> Vec<String> {
    vec![
        "-q".to_string(),
        "clean".to_string(),
        "-f".to_string(),
        manifest_path.display().to_string(),
    ]
}

fn tree_args(manifest_path: &Path, output: &Path, ignored: &[String]) -> Vec<String> {
    let mut args = vec![
        "-q".to_string(),
        "dependency:tree".to_string(),
        "-DoutputType=dot".to_string(),
        format!("-DoutputFile={}", output.display()),
        "-f".to_string(),
        manifest_path.display().to_string(),
    ];
    if !ignored.is_empty() {
        args.push(format!("-Dexcludes={}", ignored.join(",")));
    }
    args
}

async fn run_mvn(mvn: &Path, args: &[String]) -> Result<()> {
    debug!(?args, "running mvn");
    let output = tokio::process::Command::new(mvn)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("failed to run {}", mvn.display()))?;

    if !output.status.success() {
        // `-q` sends build errors to stdout
        let mut detail = String::from_utf8_lossy(&output.stdout).into_owned();
        detail.push_str(&String::from_utf8_lossy(&output.stderr));
        let goal = args.get(1).map(String::as_str).unwrap_or_default();
        bail!("mvn {} failed ({}): {}", goal, output.status, detail.trim());
    }
    Ok(())
}

/// First executable `mvn` in `paths`, honoring `PATHEXT` on Windows.
fn find_mvn(paths: Option<OsString>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    which::which_in("mvn", paths, cwd).context("mvn executable not found in PATH")
}

/// Collect exclusion patterns for dependencies marked with `crdaignore`.
///
/// Only direct children of `/project/dependencies` are considered. Each
/// pattern has the form `groupId:artifactId:*:version`, with `*` standing in
/// for a missing version. An unreadable or malformed POM yields no exclusions.
pub fn ignored_dependencies(pom_path: &Path) -> Vec<String> {
    match std::fs::read_to_string(pom_path) {
        Ok(content) => parse_ignored(&content),
        Err(e) => {
            debug!("unable to read {} for ignore markers: {}", pom_path.display(), e);
            Vec::new()
        }
    }
}

fn parse_ignored(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut ignored = Vec::new();
    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    let mut marked = false;
    let mut group_id = String::new();
    let mut artifact_id = String::new();
    let mut version = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                stack.push(name);
                if in_dependency(&stack) && stack.len() == 3 {
                    marked = false;
                    group_id.clear();
                    artifact_id.clear();
                    version.clear();
                }
            }
            Ok(Event::End(_)) => {
                if in_dependency(&stack) && stack.len() == 3 && marked {
                    let ver = if version.is_empty() { "*" } else { version.as_str() };
                    ignored.push(format!("{}:{}:*:{}", group_id, artifact_id, ver));
                }
                stack.pop();
            }
            Ok(Event::Comment(ref e)) => {
                if in_dependency(&stack)
                    && stack.len() == 3
                    && String::from_utf8_lossy(e).contains(IGNORE_MARKER)
                {
                    marked = true;
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_dependency(&stack) && stack.len() == 4 {
                    let text = e.unescape().unwrap_or_default();
                    match stack[3].as_str() {
                        "groupId" => group_id = text.to_string(),
                        "artifactId" => artifact_id = text.to_string(),
                        "version" => version = text.to_string(),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("malformed pom, ignoring crdaignore markers: {}", e);
                return Vec::new();
            }
            _ => {}
        }
        buf.clear();
    }

    ignored
}

/// True while inside `/project/dependencies/dependency`.
fn in_dependency(stack: &[String]) -> bool {
    stack.len() >= 3 && stack[0] == "project" && stack[1] == "dependencies" && stack[2] == "dependency"
}
