//! keepsake.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::DEFAULT_KEY;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistConfig {
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_rehydrate")]
    pub rehydrate: bool,
    /// Keys to persist. Absent means the whole state tree.
    pub filter: Option<Vec<String>>,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Database file. Absent means an in-memory database.
    pub path: Option<PathBuf>,
}

fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

fn default_rehydrate() -> bool {
    true
}

impl Default for PersistConfig {
    fn default() -> Self {
        PersistConfig {
            key: default_key(),
            rehydrate: default_rehydrate(),
            filter: None,
            storage: StorageConfig::default(),
        }
    }
}

impl PersistConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: PersistConfig = toml::from_str(content)?;
        if config.key.is_empty() {
            anyhow::bail!("storage key must not be empty");
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = PersistConfig::from_toml_str("").unwrap();
        assert_eq!(config, PersistConfig::default());
        assert_eq!(config.key, "keepsake");
        assert!(config.rehydrate);
        assert!(config.filter.is_none());
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
key = "todo-app"
rehydrate = false
filter = ["todos", "user"]

[storage]
path = "/var/lib/todo/state.redb"
"#;
        let config = PersistConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.key, "todo-app");
        assert!(!config.rehydrate);
        assert_eq!(
            config.filter,
            Some(vec!["todos".to_string(), "user".to_string()])
        );
        assert_eq!(
            config.storage.path,
            Some(PathBuf::from("/var/lib/todo/state.redb"))
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(PersistConfig::from_toml_str(r#"key = """#).is_err());
    }

    #[test]
    fn test_to_toml_and_back() {
        let config = PersistConfig {
            key: "app".to_string(),
            filter: Some(vec!["a".to_string()]),
            ..PersistConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("app"));
        assert_eq!(PersistConfig::from_toml_str(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keepsake.toml");
        std::fs::write(&path, "key = \"from-disk\"\n").unwrap();

        let config = PersistConfig::from_file(&path).unwrap();
        assert_eq!(config.key, "from-disk");
    }
}
