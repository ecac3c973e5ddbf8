//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crease_ai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Longest message the input accepts by default
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1000;

/// Configuration for crease
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address of the Ollama server
    pub base_url: Option<String>,
    /// Model to chat with
    pub model: Option<String>,
    /// Whether to stream replies (true by default)
    pub stream: Option<bool>,
    /// Longer input is cut to this many characters
    pub max_input_chars: Option<usize>,
    /// Keep an HTML transcript of the conversation at this path
    pub transcript: Option<PathBuf>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crease")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CREASE_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, falling back to defaults if it is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            model: Some(DEFAULT_MODEL.to_string()),
            stream: Some(true),
            max_input_chars: Some(DEFAULT_MAX_INPUT_CHARS),
            transcript: None,
        };

        default_config.save_to(&path)?;
        Ok(path)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn stream(&self) -> bool {
        self.stream.unwrap_or(true)
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars.unwrap_or(DEFAULT_MAX_INPUT_CHARS)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# crease configuration file
# Place at ~/.config/crease/config.toml (Linux/Mac) or %APPDATA%\crease\config.toml (Windows)
# or point CREASE_CONFIG_PATH at it

# Ollama server address
base_url = "http://localhost:11434"

# Model to chat with
model = "cricket-coach"

# Stream replies as they are generated (true by default)
# Set to false to wait for the whole reply
stream = true

# Longer messages are cut to this many characters
max_input_chars = 1000

# Keep an HTML transcript of the conversation (optional)
# transcript = "/tmp/crease.html"
"#
}
