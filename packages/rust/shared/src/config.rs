//! Application configuration for testsplit.
//!
//! User config lives at `~/.testsplit/testsplit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TestSplitError};
use crate::types::GroupBy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "testsplit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".testsplit";

// ---------------------------------------------------------------------------
// Config structs (matching testsplit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Artifacts forced into group 0.
    #[serde(default)]
    pub pinning: PinningConfig,

    /// Cost estimation options.
    #[serde(default)]
    pub estimation: EstimationConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Cost estimation strategy.
    #[serde(default)]
    pub group_by: GroupBy,

    /// Number of groups (parallel workers).
    #[serde(default = "default_num_groups")]
    pub num_groups: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            group_by: GroupBy::default(),
            num_groups: default_num_groups(),
        }
    }
}

fn default_num_groups() -> usize {
    4
}

/// `[pinning]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinningConfig {
    /// Regexes; matching artifacts run in a single process (group 0).
    #[serde(default)]
    pub single_process: Vec<String>,

    /// Keep group 0 for pinned artifacts only.
    #[serde(default)]
    pub isolate: bool,
}

/// `[estimation]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// Features/scenarios with a tag matching this regex are not counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_tag_pattern: Option<String>,
}

// ---------------------------------------------------------------------------
// Group config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime grouping configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Artifact files to group.
    pub files: Vec<PathBuf>,
    /// Cost estimation strategy.
    pub group_by: GroupBy,
    /// Number of groups to produce.
    pub num_groups: usize,
    /// Pinning regexes, applied in order.
    pub single_process: Vec<String>,
    /// Reserve group 0 for pinned artifacts.
    pub isolate: bool,
    /// Tag regex excluded from step/scenario counting.
    pub ignore_tag_pattern: Option<String>,
}

impl From<&AppConfig> for GroupConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            files: Vec::new(),
            group_by: config.defaults.group_by,
            num_groups: config.defaults.num_groups,
            single_process: config.pinning.single_process.clone(),
            isolate: config.pinning.isolate,
            ignore_tag_pattern: config.estimation.ignore_tag_pattern.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.testsplit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TestSplitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.testsplit/testsplit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TestSplitError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TestSplitError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TestSplitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TestSplitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TestSplitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("group_by = \"default\""));
        assert!(toml_str.contains("num_groups = 4"));
        assert!(!toml_str.contains("ignore_tag_pattern"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.num_groups, 4);
        assert_eq!(parsed.defaults.group_by, GroupBy::Default);
        assert!(!parsed.pinning.isolate);
    }

    #[test]
    fn config_with_pinning() {
        let toml_str = r#"
[defaults]
group_by = "steps"

[pinning]
single_process = ["payments", "^features/db/"]
isolate = true

[estimation]
ignore_tag_pattern = "@(wip|manual)"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.group_by, GroupBy::Steps);
        assert_eq!(config.defaults.num_groups, 4);
        assert_eq!(config.pinning.single_process.len(), 2);
        assert!(config.pinning.isolate);
        assert_eq!(
            config.estimation.ignore_tag_pattern.as_deref(),
            Some("@(wip|manual)")
        );
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let result: std::result::Result<AppConfig, _> =
            toml::from_str("[defaults]\ngroup_by = \"runtime\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn group_config_from_app_config() {
        let mut app = AppConfig::default();
        app.pinning.single_process = vec!["slow".into()];
        let group = GroupConfig::from(&app);
        assert!(group.files.is_empty());
        assert_eq!(group.num_groups, 4);
        assert_eq!(group.single_process, vec!["slow".to_string()]);
        assert!(group.ignore_tag_pattern.is_none());
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().expect("test: create tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[defaults]\nnum_groups = 8\n").expect("test: write config");

        let config = load_config_from(&path).expect("load config");
        assert_eq!(config.defaults.num_groups, 8);
    }

    #[test]
    fn load_config_reports_parse_failures() {
        let dir = tempfile::tempdir().expect("test: create tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[defaults\n").expect("test: write config");

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, TestSplitError::Config { .. }));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("test: create tempdir");
        let err = load_config_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, TestSplitError::Io { .. }));
    }
}
