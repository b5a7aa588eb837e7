//! TOML-based configuration.
//!
//! Everything the pipeline treats as policy rather than code lives here:
//! the fuzzy-match acceptance cutoff, the default leaderboard size, the
//! minimum PA/IP thresholds for "qualified" leaderboards, the model call
//! timeout, the result-cache TTL, and the asset file locations.
//!
//! Example configuration:
//! ```toml
//! [resolver]
//! score_cutoff = 70
//!
//! [leaderboard]
//! default_top_n = 10
//! qualified_min_pa = 300
//! qualified_min_ip = 100.0
//!
//! [model]
//! timeout_seconds = 30
//! model = "gpt-4o-mini"
//!
//! [cache]
//! result_ttl_seconds = 300
//!
//! [assets]
//! templates = "assets/sql_templates.yaml"
//! schema_description = "assets/schema_description.txt"
//! prompt = "assets/base_prompt.txt"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub resolver: ResolverSettings,
    pub leaderboard: LeaderboardSettings,
    pub model: ModelSettings,
    pub cache: CacheSettings,
    pub assets: AssetSettings,
}

/// Stat-resolver settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Minimum similarity score (0-100) to accept a fuzzy stat match.
    pub score_cutoff: u8,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self { score_cutoff: 70 }
    }
}

/// Leaderboard rendering settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// Result count when the question names none.
    pub default_top_n: i64,

    /// Minimum plate appearances for a "qualified" batting leaderboard.
    pub qualified_min_pa: i64,

    /// Minimum innings pitched for a "qualified" pitching leaderboard.
    pub qualified_min_ip: f64,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            default_top_n: 10,
            qualified_min_pa: 300,
            qualified_min_ip: 100.0,
        }
    }
}

/// Model-fallback settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Timeout for a single model call, in seconds.
    pub timeout_seconds: u64,

    /// Model identifier passed to the backend.
    pub model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Executed-result cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Time-to-live for cached result sets, in seconds.
    pub result_ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            result_ttl_seconds: 300,
        }
    }
}

/// Locations of the declarative assets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetSettings {
    /// SQL template definitions (YAML).
    pub templates: PathBuf,

    /// Plain-text schema description embedded into model prompts.
    pub schema_description: PathBuf,

    /// Prompt skeleton for the model fallback.
    pub prompt: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            templates: PathBuf::from("assets/sql_templates.yaml"),
            schema_description: PathBuf::from("assets/schema_description.txt"),
            prompt: PathBuf::from("assets/base_prompt.txt"),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `DUGOUT_CONFIG`
    /// 2. `./dugout.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("DUGOUT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("dugout.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }
}
