//! Application configuration management

use std::path::PathBuf;

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Last opened vault path
    pub last_vault: Option<PathBuf>,
    /// Recent vaults
    pub recent_vaults: Vec<PathBuf>,
    /// People settings
    pub people: PeopleConfig,
}

/// Settings for the people collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeopleConfig {
    /// Folder inside the vault that holds person notes
    pub folder: String,
}

impl Default for PeopleConfig {
    fn default() -> Self {
        Self {
            folder: "People".to_string(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "kinnote", "Kinnote")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        tracing::debug!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Add a vault to recent vaults
    pub fn add_recent_vault(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_vaults.retain(|p| p != &path);
        // Add to front
        self.recent_vaults.insert(0, path);
        // Keep only last 10
        self.recent_vaults.truncate(10);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_vaults_dedup_and_cap() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_vault(PathBuf::from(format!("/vault/{i}")));
        }
        assert_eq!(config.recent_vaults.len(), 10);
        assert_eq!(config.recent_vaults[0], PathBuf::from("/vault/11"));

        config.add_recent_vault(PathBuf::from("/vault/5"));
        assert_eq!(config.recent_vaults[0], PathBuf::from("/vault/5"));
        assert_eq!(config.recent_vaults.len(), 10);
    }

    #[test]
    fn test_default_people_folder() {
        assert_eq!(AppConfig::default().people.folder, "People");
    }
}
