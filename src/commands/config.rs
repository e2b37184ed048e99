use anyhow::{bail, Result};
use tracing::debug;

use crate::config::{Config, ConfigKey};

/// Print `key: value` for `key`, or every key holding a value.
pub fn get(config: &Config, key: Option<&str>) -> Result<()> {
    debug!("executing config get command");
    for line in get_lines(config, key)? {
        println!("{}", line);
    }
    Ok(())
}

fn get_lines(config: &Config, key: Option<&str>) -> Result<Vec<String>> {
    let Some(key) = key else {
        return Ok(config
            .entries()
            .into_iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect());
    };

    let parsed = ConfigKey::parse(key).ok();
    match parsed.and_then(|k| config.get(k)) {
        Some(value) => Ok(vec![format!("{}: {}", key, value)]),
        None => bail!("config key {} is not set", key),
    }
}

/// Validate and persist `key`, echoing `key: value`.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    debug!("executing config set command");
    let key = ConfigKey::parse(key)?;
    config.set(key, value)?;
    config.save()?;
    debug!("saved {} to {}", key, config.path().display());
    println!("{}: {}", key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BACKEND_HOST;
    use tempfile::TempDir;

    fn load(dir: &TempDir) -> Config {
        Config::load_from(dir.path(), |_| None).unwrap()
    }

    #[test]
    fn test_get_single_key() {
        let dir = TempDir::new().unwrap();
        let lines = get_lines(&load(&dir), Some("crda_backend_host")).unwrap();
        assert_eq!(lines, vec![format!("crda_backend_host: {}", DEFAULT_BACKEND_HOST)]);
    }

    #[test]
    fn test_get_unset_or_unknown_key() {
        let dir = TempDir::new().unwrap();
        let config = load(&dir);
        assert_eq!(
            get_lines(&config, Some("crda_key")).unwrap_err().to_string(),
            "config key crda_key is not set"
        );
        assert_eq!(
            get_lines(&config, Some("bogus")).unwrap_err().to_string(),
            "config key bogus is not set"
        );
    }

    #[test]
    fn test_get_all() {
        let dir = TempDir::new().unwrap();
        let lines = get_lines(&load(&dir), None).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("crda_backend_host: "));
        assert!(lines[1].starts_with("crda_auth_host: "));
    }

    #[test]
    fn test_set_persists() {
        let dir = TempDir::new().unwrap();
        let mut config = load(&dir);
        set(&mut config, "crda_snyk_token", "abc").unwrap();

        let lines = get_lines(&load(&dir), Some("crda_snyk_token")).unwrap();
        assert_eq!(lines, vec!["crda_snyk_token: abc".to_string()]);
    }

    #[test]
    fn test_set_unknown_key() {
        let dir = TempDir::new().unwrap();
        let err = set(&mut load(&dir), "bogus", "x").unwrap_err();
        assert!(err.to_string().starts_with("supported config keys are "));
    }
}
