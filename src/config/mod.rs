//! Configuration module for the atlas builder

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::GridSpec;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub gaseous: PairJobSettings,
    pub jungle: ListJobSettings,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Atlas output configuration shared by all jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasSettings {
    pub columns: u32,
    pub rows: u32,
    pub padding: u32,
    pub image: String,
    pub json: String,
}

impl AtlasSettings {
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.columns, self.rows, self.padding)
    }
}

/// Layered sprite pairs flattened and packed into one atlas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairJobSettings {
    pub dir: PathBuf,
    pub category: String,
    pub atlas: AtlasSettings,
}

/// Fixed list of sprites packed into one atlas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobSettings {
    pub dir: PathBuf,
    pub inputs: Vec<String>,
    pub atlas: AtlasSettings,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with CASCADE_)
    /// 2. <config_dir>/local.toml (gitignored)
    /// 3. <config_dir>/default.toml
    /// 4. Built-in defaults
    ///
    /// `config_dir` falls back to `CONFIG_PATH`, then `config`.
    pub fn load(config_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let config_dir = config_dir
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("CONFIG_PATH").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("config"));

        let builder = Config::builder()
            // Start with built-in defaults
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local overrides (gitignored)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables (CASCADE_GASEOUS__ATLAS__PADDING, etc.)
            .add_source(
                Environment::with_prefix("CASCADE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            logging: LoggingSettings {
                filter: "cascade_atlas=info".to_string(),
                json: false,
            },
            gaseous: PairJobSettings {
                dir: PathBuf::from("."),
                category: "Gaseous".to_string(),
                atlas: AtlasSettings {
                    columns: 4,
                    rows: 3,
                    padding: 4,
                    image: "Gaseous_atlas.png".to_string(),
                    json: "Gaseous_atlas.json".to_string(),
                },
            },
            jungle: ListJobSettings {
                dir: PathBuf::from("."),
                inputs: (1..=5).map(|i| format!("Jungle{:02}.png", i)).collect(),
                atlas: AtlasSettings {
                    columns: 3,
                    rows: 2,
                    padding: 4,
                    image: "Jungle_atlas.png".to_string(),
                    json: "Jungle_atlas.json".to_string(),
                },
            },
        }
    }
}
