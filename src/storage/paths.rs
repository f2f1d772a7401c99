//! Application paths for config and profile files.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Config file name inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";
/// OAuth profiles file name.
pub const PROFILES_FILE: &str = "profiles.toml";
/// API profiles file name.
pub const API_PROFILES_FILE: &str = "api-profiles.json";

/// Application paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
}

impl AppPaths {
    /// Platform config directory for swapwatch.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("dev", "swapwatch", "swapwatch") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
            }
        } else {
            let home = directories::BaseDirs::new()
                .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                config: home.join(".config/swapwatch"),
            }
        }
    }

    /// Paths rooted at an explicit directory.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn profiles_file(&self) -> PathBuf {
        self.config.join(PROFILES_FILE)
    }

    #[must_use]
    pub fn api_profiles_file(&self) -> PathBuf {
        self.config.join(API_PROFILES_FILE)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
