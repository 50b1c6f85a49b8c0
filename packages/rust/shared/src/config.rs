//! Application configuration for NavSphere.
//!
//! User config lives at `~/.navsphere/navsphere.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NavSphereError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "navsphere.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".navsphere";

// ---------------------------------------------------------------------------
// Config structs (matching navsphere.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local data file locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Issue tracker used as the submission store.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Labels marking a submission's review state.
    #[serde(default)]
    pub labels: LabelsConfig,
}

/// `[data]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to `navigation.json`.
    #[serde(default = "default_navigation_path")]
    pub navigation_path: String,

    /// Path to `site.json`.
    #[serde(default = "default_site_path")]
    pub site_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            navigation_path: default_navigation_path(),
            site_path: default_site_path(),
        }
    }
}

fn default_navigation_path() -> String {
    "navsphere/content/navigation.json".into()
}
fn default_site_path() -> String {
    "navsphere/content/site.json".into()
}

/// `[tracker]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Repository owner.
    #[serde(default)]
    pub owner: String,

    /// Repository name.
    #[serde(default)]
    pub repo: String,

    /// Branch the navigation data is committed to.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Repository path of the navigation data file.
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Icon given to links created from approved submissions.
    #[serde(default = "default_icon")]
    pub default_icon: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            token_env: default_token_env(),
            data_path: default_data_path(),
            default_icon: default_icon(),
        }
    }
}

fn default_branch() -> String {
    "main".into()
}
fn default_token_env() -> String {
    "GITHUB_PAT".into()
}
fn default_data_path() -> String {
    "src/navsphere/content/navigation.json".into()
}
fn default_icon() -> String {
    "/assets/images/default-website-icon.png".into()
}

/// `[labels]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_pending_label")]
    pub pending: String,
    #[serde(default = "default_approved_label")]
    pub approved: String,
    #[serde(default = "default_rejected_label")]
    pub rejected: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            pending: default_pending_label(),
            approved: default_approved_label(),
            rejected: default_rejected_label(),
        }
    }
}

fn default_pending_label() -> String {
    "pending".into()
}
fn default_approved_label() -> String {
    "approved".into()
}
fn default_rejected_label() -> String {
    "rejected".into()
}

// ---------------------------------------------------------------------------
// Review config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration handed to the review workflow.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Path of the navigation data file inside the tracker's storage.
    pub data_path: String,
    /// Branch the data file lives on.
    pub branch: String,
    /// Review state labels.
    pub labels: LabelsConfig,
    /// Icon for newly added links.
    pub default_icon: String,
    /// Name recorded in review comments.
    pub reviewer: String,
}

impl From<&AppConfig> for ReviewConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            data_path: config.tracker.data_path.clone(),
            branch: config.tracker.branch.clone(),
            labels: config.labels.clone(),
            default_icon: config.tracker.default_icon.clone(),
            reviewer: "admin".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.navsphere/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NavSphereError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.navsphere/navsphere.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| NavSphereError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        NavSphereError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NavSphereError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NavSphereError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NavSphereError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the tracker is identified and its token env var is set and non-empty.
pub fn validate_token(config: &AppConfig) -> Result<()> {
    if config.tracker.owner.is_empty() || config.tracker.repo.is_empty() {
        return Err(NavSphereError::config(
            "tracker owner and repo must both be set in [tracker]",
        ));
    }

    let var_name = &config.tracker.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(NavSphereError::config(format!(
            "tracker token not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("navigation_path"));
        assert!(toml_str.contains("GITHUB_PAT"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.tracker.branch, "main");
        assert_eq!(parsed.labels.pending, "pending");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[tracker]
owner = "navsphere"
repo = "links"

[labels]
approved = "status: approved"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.tracker.owner, "navsphere");
        assert_eq!(config.tracker.data_path, "src/navsphere/content/navigation.json");
        assert_eq!(config.labels.approved, "status: approved");
        assert_eq!(config.labels.rejected, "rejected");
    }

    #[test]
    fn review_config_from_app_config() {
        let app = AppConfig::default();
        let review = ReviewConfig::from(&app);
        assert_eq!(review.branch, "main");
        assert_eq!(review.default_icon, "/assets/images/default-website-icon.png");
        assert_eq!(review.reviewer, "admin");
    }

    #[test]
    fn token_validation_requires_repo() {
        let config = AppConfig::default();
        let result = validate_token(&config);
        assert!(result.unwrap_err().to_string().contains("owner and repo"));
    }

    #[test]
    fn token_validation_requires_env_var() {
        let mut config = AppConfig::default();
        config.tracker.owner = "o".into();
        config.tracker.repo = "r".into();
        // Use a unique env var name to avoid interfering with other tests
        config.tracker.token_env = "NS_TEST_NONEXISTENT_TOKEN_12345".into();
        let result = validate_token(&config);
        assert!(result.unwrap_err().to_string().contains("token not found"));
    }
}
