use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AzureConfig {
    /// Organization URL, e.g. `https://dev.azure.com/my-org`.
    #[serde(default)]
    pub org_url: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    /// Personal access token. Environment variables are used when unset.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// About a hundred years.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

fn default_lookback_days() -> u32 {
    32
}
fn default_page_size() -> u32 {
    500
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            page_size: default_page_size(),
            output_dir: None,
        }
    }
}

pub const EXAMPLE_CONFIG: &str = "[azure]\n\
     org_url = \"https://dev.azure.com/my-org\"\n\
     project = \"MyProject\"\n\
     repository = \"my-repo\"";

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::read(path);
        }

        // Search candidate paths in order
        let mut candidates = Vec::new();

        // 1. ~/.config/reviewtrail/config.toml
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(PathBuf::from(home).join(".config/reviewtrail/config.toml"));
        }

        // 2. Platform-specific path from `directories` crate
        if let Some(proj_dirs) = ProjectDirs::from("", "", "reviewtrail") {
            candidates.push(proj_dirs.config_dir().join("config.toml"));
        }

        for config_path in &candidates {
            if config_path.exists() {
                return Self::read(config_path);
            }
        }

        Ok(AppConfig::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        Ok(config)
    }

    /// Check that everything a run needs is present and in range.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.azure.org_url.as_deref().is_none_or(str::is_empty) {
            missing.push("org_url");
        }
        if self.azure.project.as_deref().is_none_or(str::is_empty) {
            missing.push("project");
        }
        if self.azure.repository.as_deref().is_none_or(str::is_empty) {
            missing.push("repository");
        }
        if !missing.is_empty() {
            bail!(
                "Missing Azure DevOps settings: {}. Example config \
                 (~/.config/reviewtrail/config.toml):\n\n{}",
                missing.join(", "),
                EXAMPLE_CONFIG
            );
        }

        if self.report.lookback_days == 0 {
            bail!("report.lookback_days must be at least 1");
        }
        if self.report.lookback_days > MAX_LOOKBACK_DAYS {
            bail!("report.lookback_days must be at most {}", MAX_LOOKBACK_DAYS);
        }
        if self.report.page_size == 0 {
            bail!("report.page_size must be at least 1");
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.report
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn log_dir(&self) -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "reviewtrail") {
            return proj_dirs.data_dir().join("logs");
        }
        PathBuf::from(".local/share/reviewtrail/logs")
    }
}
