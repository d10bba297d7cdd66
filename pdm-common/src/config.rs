//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// TOML configuration file contents.
///
/// Environment variables take priority for every value here; the file is
/// the fallback for deployments where env injection is impractical.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub port: Option<u16>,
}

/// Generation provider settings (API keys fall back here when the
/// corresponding environment variable is unset)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl TomlConfig {
    /// Load the config file from the platform config directory, returning
    /// defaults when no file exists. A file that exists but fails to parse
    /// is an error, not a silent default.
    pub fn load() -> Result<Self> {
        let Some(path) = config_file_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Default configuration file path for the platform (`~/.config/pdm/config.toml`)
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdm").join("config.toml"))
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `PDM_ROOT` environment variable
/// 3. TOML config file `root_folder` key
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("PDM_ROOT") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return PathBuf::from(path);
    }

    default_root_folder()
}

/// OS-dependent default root folder (`~/.local/share/pdm` on Linux)
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pdm"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/pdm"))
}

/// Ensure the root folder exists, creating it if missing
pub fn ensure_root_folder(root: &PathBuf) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
        tracing::info!(root = %root.display(), "Created root folder");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let config = TomlConfig {
            root_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some("/from/cli"), &config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_toml_fallback() {
        let config = TomlConfig {
            root_folder: Some("/from/toml".to_string()),
            ..Default::default()
        };
        // Only deterministic when PDM_ROOT is unset in the test environment
        if std::env::var("PDM_ROOT").is_err() {
            let resolved = resolve_root_folder(None, &config);
            assert_eq!(resolved, PathBuf::from("/from/toml"));
        }
    }

    #[test]
    fn test_parse_generation_section() {
        let parsed: TomlConfig = toml::from_str(
            r#"
            root_folder = "/srv/pdm"

            [generation]
            anthropic_api_key = "sk-test"
            model = "claude-sonnet-4-20250514"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.root_folder.as_deref(), Some("/srv/pdm"));
        assert_eq!(parsed.generation.anthropic_api_key.as_deref(), Some("sk-test"));
        assert!(parsed.generation.openai_api_key.is_none());
    }
}
