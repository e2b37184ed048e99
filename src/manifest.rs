use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::provider::maven::MavenTreeProvider;
use crate::provider::TreeProvider;

static MAVEN: MavenTreeProvider = MavenTreeProvider::new();

/// A supported manifest file, bound to its ecosystem and, once the ecosystem
/// is active, the provider producing its dependency tree.
pub struct Manifest {
    pub filename: &'static str,
    pub ecosystem: &'static str,
    pub provider: Option<&'static dyn TreeProvider>,
}

impl std::fmt::Debug for Manifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manifest")
            .field("filename", &self.filename)
            .field("ecosystem", &self.ecosystem)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

static MANIFESTS: [Manifest; 4] = [
    Manifest {
        filename: "pom.xml",
        ecosystem: "maven",
        provider: Some(&MAVEN),
    },
    Manifest {
        filename: "requirements.txt",
        ecosystem: "pypi",
        provider: None,
    },
    Manifest {
        filename: "package.json",
        ecosystem: "npm",
        provider: None,
    },
    Manifest {
        filename: "go.mod",
        ecosystem: "go",
        provider: None,
    },
];

/// All manifests known to the CLI, active or not.
pub fn supported_manifests() -> &'static [Manifest] {
    &MANIFESTS
}

pub fn supported_filenames() -> Vec<&'static str> {
    MANIFESTS.iter().map(|m| m.filename).collect()
}

/// Look up a manifest by its bare file name.
pub fn get_manifest(filename: &str) -> Result<&'static Manifest> {
    match MANIFESTS.iter().find(|m| m.filename == filename) {
        Some(manifest) => Ok(manifest),
        None => bail!("manifest {} not supported", filename),
    }
}

/// Resolve the manifest for a path given on the command line.
///
/// The path must point at an existing file whose name is one of
/// [`supported_filenames`].
pub fn manifest_for_path(path: &Path) -> Result<&'static Manifest> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if metadata.is_dir() {
        bail!("please use path to manifest file as input");
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    get_manifest(name).map_err(|_| anyhow!("manifest {} is not supported", name))
}
