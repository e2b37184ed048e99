use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use uuid::Uuid;

/// `$HOME/.redhat/anonymousId`, shared with other Red Hat developer tools.
pub fn default_identity_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".redhat").join("anonymousId"))
}

/// Read the anonymous user id from `file`, generating a new one when the file
/// is missing or does not hold a UUID.
pub fn get_or_create_user_id(file: &Path) -> Result<String> {
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if !file.exists() {
        return Ok(create_user_id(file));
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    match Uuid::parse_str(content.trim()) {
        Ok(id) => Ok(id.to_string()),
        Err(_) => Ok(create_user_id(file)),
    }
}

/// The id is returned even if it could not be written.
fn create_user_id(file: &Path) -> String {
    let id = Uuid::new_v4().to_string();
    if let Err(err) = std::fs::write(file, &id) {
        debug!("failed writing new user id to {}: {}", file.display(), err);
    }
    id
}
