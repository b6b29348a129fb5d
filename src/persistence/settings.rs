use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::graph_utils::layered::RankDir;
use crate::graph_utils::layout::LayoutConfig;

const APP_DIR: &str = "Path-Loom";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // Backend the explore queries go to
    #[serde(default = "AppSettings::default_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    // If None, use OS temporary directory for exports
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    #[serde(default = "AppSettings::default_link_luminance")]
    pub link_luminance: f64,
    #[serde(default = "AppSettings::default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "AppSettings::default_layout")]
    pub layout: LayoutConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: Self::default_base_url(),
            api_token: None,
            export_override: None,
            link_luminance: Self::default_link_luminance(),
            request_timeout_secs: Self::default_timeout_secs(),
            layout: Self::default_layout(),
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Path-Loom
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join(APP_DIR);
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Path-Loom
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join(APP_DIR);
            }
            return PathBuf::from(APP_DIR);
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Path-Loom or ~/.config/Path-Loom
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join(APP_DIR);
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join(APP_DIR);
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_dir().join(SETTINGS_FILE))
    }

    // Missing file means defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let v: Self = serde_json::from_str(&s)?;
        Ok(v)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_dir().join(SETTINGS_FILE))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Return the directory where the settings file (settings.json) is stored.
    /// Shell history lives here too.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    /// Default export directory when no override is set: OS temporary directory.
    /// Example: {temp_dir}/Path-Loom/exports
    pub fn export_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(APP_DIR);
        p.push("exports");
        p
    }

    pub fn export_dir(&self) -> PathBuf {
        if let Some(p) = &self.export_override { return p.clone(); }
        Self::export_default_dir()
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub(crate) fn default_base_url() -> String { "http://127.0.0.1:8080".to_string() }
    pub(crate) fn default_link_luminance() -> f64 { 0.4 }
    pub(crate) fn default_timeout_secs() -> u64 { 30 }

    pub(crate) fn default_layout() -> LayoutConfig {
        let mut layout = LayoutConfig::new(RankDir::LR, 500.0);
        layout.nodesep = Some(50.0);
        layout
    }
}
