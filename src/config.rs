//! Application configuration.
//!
//! Every field has a default, so running without a configuration file is valid. The
//! file is TOML; secrets are never read from it, only the *names* of the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{animation::AnimationSettings, error::ConfigError, layout::LayoutSettings};

/// File looked up in the working directory when no `--config` is passed.
pub const DEFAULT_CONFIG_FILE: &str = "gallery.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub records: RecordsConfig,
    pub assets: AssetsConfig,
    pub layout: LayoutSettings,
    pub animation: AnimationSettings,
    pub export: ExportConfig,
    pub share: ShareConfig,
    pub window: WindowConfig,
}

impl GalleryConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Loads `path` if given, otherwise [`DEFAULT_CONFIG_FILE`] if it exists, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load_from_file(fallback)
                } else {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Base URL of the hosted backend. Empty means: use the bundled demo records.
    pub url: String,
    pub table: String,
    /// Environment variable holding a read-only access key.
    pub key_env: String,
    /// Server endpoint that issues short-lived access tokens; preferred over `key_env`.
    pub token_endpoint: Option<String>,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            table: "models".to_string(),
            key_env: "GALLERY_RECORDS_KEY".to_string(),
            token_endpoint: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory or `http(s)://` base URL that relative asset paths are resolved against.
    pub base: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base: "assets".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Where screenshots go. Defaults to the user's download directory.
    pub screenshot_dir: Option<PathBuf>,
}

impl ExportConfig {
    pub fn screenshot_dir(&self) -> PathBuf {
        self.screenshot_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Environment variable holding the sharing SDK application key.
    pub app_key_env: String,
    /// Web endpoint the feed payload is handed to.
    pub endpoint: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// Link back to the gallery page.
    pub link: String,
    pub button_title: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        let page = "https://hyeonseong2023.github.io/3D-Share-Test".to_string();
        Self {
            app_key_env: "GALLERY_SHARE_APP_KEY".to_string(),
            endpoint: "https://sharer.kakao.com/talk/friends/picker/link".to_string(),
            title: "봄의 감성을 담은 분홍 꽃다발💐".to_string(),
            description: "#핑크무드 #고백선물 #향기한줌 #설렘가득".to_string(),
            image_url: format!("{page}/study/images/flower.png"),
            link: page,
            button_title: "꽃다발 감상하기".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: [f32; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "model-gallery".to_string(),
            width: 1280,
            height: 720,
            background: [1.0, 1.0, 1.0],
        }
    }
}
