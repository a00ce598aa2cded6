//! Runner configuration: where the assets live and how the overlay fades.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Asset locations and overlay timing. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub asset_dir: PathBuf,
    pub environment: String,
    pub card_front: String,
    pub card_back: String,
    pub fade_seconds: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("./assets/"),
            environment: "kloofendal_misty_morning_puresky_4k.exr".into(),
            card_front: "card_top.png".into(),
            card_back: "card_bottom.png".into(),
            fade_seconds: 1.0,
        }
    }
}

impl StageConfig {
    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
            ConfigError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn with_asset_dir(self, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            ..self
        }
    }

    pub fn environment_path(&self) -> PathBuf {
        self.asset_dir.join(&self.environment)
    }

    pub fn card_front_path(&self) -> PathBuf {
        self.asset_dir.join(&self.card_front)
    }

    pub fn card_back_path(&self) -> PathBuf {
        self.asset_dir.join(&self.card_back)
    }
}
