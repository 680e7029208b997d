//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::types::Config;
use super::validation::validate_config;

/// File names searched for, in order
const CONFIG_FILE_NAMES: [&str; 3] = ["gantry.yml", "gantry.yaml", ".gantry.yml"];

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    info!(path = %path.display(), "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: Config = serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?;

    validate_config(&config)?;
    debug!(path = %path.display(), apps = config.apps.len(), "config loaded and validated");
    Ok(config)
}

/// Find a configuration file in the directory or its parents.
///
/// The first matching name wins; parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from a directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gantry.yml");
        std::fs::write(
            &path,
            r#"
project_name: demo
apps:
  main:
    bundle_id: com.example.demo
    localizations:
      en-US:
        description: hello
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.project_name, "demo");
    }

    #[test]
    fn test_find_config_walks_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("gantry.yaml"), "project_name: x").unwrap();

        let found = find_config(&nested).unwrap();
        assert!(found.ends_with("gantry.yaml"));
    }

    #[test]
    fn test_missing_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gantry.yml");
        // App without bundle_id fails validation
        std::fs::write(
            &path,
            r#"
project_name: demo
apps:
  main: {}
"#,
        )
        .unwrap();

        assert!(load_config(&path).is_err());
    }
}
