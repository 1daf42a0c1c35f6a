use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::enhance::{MAX_FACTOR, MIN_FACTOR};
use crate::core::params::{DEFAULT_DIMENSION, MAX_IMAGES};
use crate::core::{EnhancementSettings, Style};

/// Environment variable that overrides `api.token`
pub const TOKEN_ENV_VAR: &str = "HF_API_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub filters: EnhancementSettings,
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(skip)]
    pub config_path: PathBuf,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub response_shape: ResponseShape,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `HF_API_TOKEN` override, never serialized
    #[serde(skip)]
    pub env_token: Option<String>,
}

// Token never reaches logs or debug output
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("token", &self.token.as_ref().map(|_| "****"))
            .field("env_token", &self.env_token.as_ref().map(|_| "****"))
            .field("endpoint", &"<configured>")
            .field("response_shape", &self.response_shape)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Body layout the configured endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// `{"inputs", "options": {"wait_for_model"}}`, answered with raw image bytes
    #[default]
    RawBytes,
    /// `{"inputs", "parameters": {...}}`, answered with `{"images": [base64, ...]}`
    Base64Json,
}

impl ResponseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseShape::RawBytes => "raw_bytes",
            ResponseShape::Base64Json => "base64_json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "raw_bytes" | "raw" => Some(ResponseShape::RawBytes),
            "base64_json" | "json" => Some(ResponseShape::Base64Json),
            _ => None,
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["raw_bytes", "base64_json"]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub style: Style,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default)]
    pub inference_steps: Option<u32>,
    #[serde(default = "default_num_images")]
    pub num_images: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default = "default_display")]
    pub display: DisplayMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Terminal,
    None,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Terminal => "terminal",
            DisplayMode::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => DisplayMode::None,
            _ => DisplayMode::Terminal,
        }
    }
}

// Default value functions
fn default_endpoint() -> String {
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_dimension() -> u32 {
    DEFAULT_DIMENSION
}

fn default_num_images() -> u8 {
    1
}

fn default_output_directory() -> String {
    "./pixelgenius-output".to_string()
}

fn default_true() -> bool {
    true
}

fn default_display() -> DisplayMode {
    DisplayMode::Terminal
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: default_endpoint(),
            response_shape: ResponseShape::default(),
            timeout_secs: default_timeout_secs(),
            env_token: None,
        }
    }
}

impl ApiConfig {
    /// Token to send, if one is configured and non-blank.
    ///
    /// The environment override wins over the file value.
    pub fn bearer_token(&self) -> Option<&str> {
        self.env_token
            .as_deref()
            .or(self.token.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            style: Style::default(),
            width: default_dimension(),
            height: default_dimension(),
            inference_steps: None,
            num_images: default_num_images(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            auto_save: true,
            display: DisplayMode::Terminal,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            defaults: DefaultsConfig::default(),
            filters: EnhancementSettings::default(),
            output: OutputConfig::default(),
            config_path: PathBuf::new(),
        }
    }
}

/// Non-blank value of `HF_API_TOKEN`, if set
pub fn env_token() -> Option<String> {
    std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.trim().is_empty())
}

fn parse_factor(key: &str, value: &str) -> Result<f32> {
    let factor: f32 = value
        .parse()
        .with_context(|| format!("Invalid number for {}", key))?;
    if !(MIN_FACTOR..=MAX_FACTOR).contains(&factor) {
        anyhow::bail!("{} must be between {} and {}", key, MIN_FACTOR, MAX_FACTOR);
    }
    Ok(factor)
}

fn parse_dimension(key: &str, value: &str) -> Result<u32> {
    let dim: u32 = value
        .parse()
        .with_context(|| format!("Invalid number for {}", key))?;
    if !(64..=4096).contains(&dim) {
        anyhow::bail!("{} must be between 64 and 4096", key);
    }
    Ok(dim)
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "pixelgenius", "pixelgenius")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location or create it
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path()?)
    }

    /// Load config from `path`, writing defaults there if it does not exist
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        Self::load_with_env_token(path, env_token())
    }

    fn load_with_env_token(path: &Path, env_token: Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&content).context("Failed to parse config file")?;
            config.config_path = path.to_path_buf();
            config
        } else {
            let mut config = Config::default();
            config.config_path = path.to_path_buf();
            config.save()?;
            config
        };

        config.api.env_token = env_token;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Set a config value by key path (e.g., "api.token", "filters.contrast")
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.token" => self.api.token = Some(value.to_string()),
            "api.endpoint" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    anyhow::bail!("Endpoint must be an http(s) URL");
                }
                self.api.endpoint = value.to_string();
            }
            "api.response_shape" => {
                self.api.response_shape = ResponseShape::from_str(value).with_context(|| {
                    format!(
                        "Invalid response shape. Valid values: {}",
                        ResponseShape::variants().join(", ")
                    )
                })?;
            }
            "api.timeout_secs" => {
                self.api.timeout_secs = value.parse().context("Invalid number of seconds")?;
            }
            "defaults.style" => self.defaults.style = value.parse()?,
            "defaults.width" => self.defaults.width = parse_dimension(key, value)?,
            "defaults.height" => self.defaults.height = parse_dimension(key, value)?,
            "defaults.inference_steps" => {
                self.defaults.inference_steps = match value {
                    "" | "none" => None,
                    v => Some(v.parse().context("Invalid number of steps")?),
                };
            }
            "defaults.num_images" => {
                let n: u8 = value.parse().context("Invalid number of images")?;
                if !(1..=MAX_IMAGES).contains(&n) {
                    anyhow::bail!("Number of images must be between 1 and {}", MAX_IMAGES);
                }
                self.defaults.num_images = n;
            }
            "filters.brightness" => self.filters.brightness = parse_factor(key, value)?,
            "filters.contrast" => self.filters.contrast = parse_factor(key, value)?,
            "filters.sharpness" => self.filters.sharpness = parse_factor(key, value)?,
            "output.directory" => self.output.directory = value.to_string(),
            "output.auto_save" => {
                self.output.auto_save = value.parse().context("Invalid boolean value")?;
            }
            "output.display" => {
                self.output.display = DisplayMode::from_str(value);
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value by key path
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api.token" => self.api.bearer_token().map(|_| "****".to_string()), // Mask API token
            "api.endpoint" => Some(self.api.endpoint.clone()),
            "api.response_shape" => Some(self.api.response_shape.as_str().to_string()),
            "api.timeout_secs" => Some(self.api.timeout_secs.to_string()),
            "defaults.style" => Some(self.defaults.style.label().to_string()),
            "defaults.width" => Some(self.defaults.width.to_string()),
            "defaults.height" => Some(self.defaults.height.to_string()),
            "defaults.inference_steps" => Some(
                self.defaults
                    .inference_steps
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            "defaults.num_images" => Some(self.defaults.num_images.to_string()),
            "filters.brightness" => Some(format!("{:.1}", self.filters.brightness)),
            "filters.contrast" => Some(format!("{:.1}", self.filters.contrast)),
            "filters.sharpness" => Some(format!("{:.1}", self.filters.sharpness)),
            "output.directory" => Some(self.output.directory.clone()),
            "output.auto_save" => Some(self.output.auto_save.to_string()),
            "output.display" => Some(self.output.display.as_str().to_string()),
            _ => None,
        }
    }

    /// Get all config keys
    pub fn keys() -> &'static [&'static str] {
        &[
            "api.token",
            "api.endpoint",
            "api.response_shape",
            "api.timeout_secs",
            "defaults.style",
            "defaults.width",
            "defaults.height",
            "defaults.inference_steps",
            "defaults.num_images",
            "filters.brightness",
            "filters.contrast",
            "filters.sharpness",
            "output.directory",
            "output.auto_save",
            "output.display",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hosted_sdxl() {
        let config = Config::default();
        assert!(config.api.endpoint.contains("stable-diffusion-xl-base-1.0"));
        assert_eq!(config.api.response_shape, ResponseShape::RawBytes);
        assert_eq!(config.defaults.width, 1024);
        assert_eq!(config.defaults.height, 1024);
        assert!(config.filters.is_identity());
        assert!(config.api.bearer_token().is_none());
    }

    #[test]
    fn test_token_is_masked() {
        let mut config = Config::default();
        config.set("api.token", "hf_secret").unwrap();

        assert_eq!(config.get("api.token").as_deref(), Some("****"));
        assert_eq!(config.api.bearer_token(), Some("hf_secret"));
        assert!(!format!("{:?}", config).contains("hf_secret"));
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();

        config.set("filters.contrast", "1.5").unwrap();
        assert_eq!(config.filters.contrast, 1.5);
        assert!(config.set("filters.contrast", "2.5").is_err());
        assert!(config.set("filters.brightness", "bright").is_err());

        config.set("defaults.style", "cyberpunk").unwrap();
        assert_eq!(config.defaults.style, Style::Cyberpunk);
        assert!(config.set("defaults.style", "oil").is_err());

        config.set("api.response_shape", "base64_json").unwrap();
        assert_eq!(config.api.response_shape, ResponseShape::Base64Json);
        assert!(config.set("api.response_shape", "xml").is_err());

        assert!(config.set("defaults.num_images", "5").is_err());
        assert!(config.set("api.endpoint", "ftp://example.com").is_err());
        assert!(config.set("no.such.key", "1").is_err());
    }

    #[test]
    fn test_every_key_is_readable() {
        let config = Config::default();
        for key in Config::keys().iter().filter(|k| **k != "api.token") {
            assert!(config.get(key).is_some(), "missing value for {}", key);
        }
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create_at(&path).unwrap();
        assert!(path.exists());

        let mut config = created.clone();
        config.set("defaults.style", "3D Art").unwrap();
        config.set("filters.sharpness", "2.0").unwrap();
        config.set("api.response_shape", "base64_json").unwrap();
        config.save().unwrap();

        let loaded = Config::load_or_create_at(&path).unwrap();
        assert_eq!(loaded.defaults.style, Style::ThreeDArt);
        assert_eq!(loaded.filters.sharpness, 2.0);
        assert_eq!(loaded.api.response_shape, ResponseShape::Base64Json);
    }

    #[test]
    fn test_env_token_is_used_but_never_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::load_with_env_token(&path, None).unwrap();

        let mut config =
            Config::load_with_env_token(&path, Some("hf_from_env_secret".to_string())).unwrap();
        assert_eq!(config.api.bearer_token(), Some("hf_from_env_secret"));
        assert_eq!(config.get("api.token").as_deref(), Some("****"));

        config.set("filters.contrast", "1.3").unwrap();
        config.save().unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("hf_from_env_secret"));
        assert!(!on_disk.contains("env_token"));

        let reloaded = Config::load_with_env_token(&path, None).unwrap();
        assert!(reloaded.api.bearer_token().is_none());
    }

    #[test]
    fn test_env_token_overrides_file_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::load_with_env_token(&path, None).unwrap();
        config.set("api.token", "hf_file").unwrap();
        config.save().unwrap();

        let config = Config::load_with_env_token(&path, Some("hf_env".to_string())).unwrap();
        assert_eq!(config.api.bearer_token(), Some("hf_env"));
        assert_eq!(config.api.token.as_deref(), Some("hf_file"));
    }
}
