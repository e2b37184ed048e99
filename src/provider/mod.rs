use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::DependencyGraph;

pub mod maven;

/// Produces the dependency tree that is sent to the backend as the request
/// body, together with its content type.
#[async_trait]
pub trait TreeProvider: Send + Sync {
    async fn provide(&self, manifest_path: &Path) -> Result<DependencyGraph>;
}
