use crate::cell_state::CellState;
use crate::snapshot::SnapshotFormat;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Grid dimensions, fixed for a session
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GridConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

// Scheduler timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

// Snapshot file settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StorageConfig {
    /// Appended to save paths that lack it. Must start with a dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub format: SnapshotFormat,
}

/// What the headless runner does with the grid.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct RunConfig {
    /// Number of manual steps to perform.
    #[serde(default)]
    pub steps: Option<u32>,
    /// Length of a scheduled run, used when `steps` is absent.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub load_from: Option<PathBuf>,
    #[serde(default)]
    pub save_to: Option<PathBuf>,
}

/// One initial cell placed on a fresh grid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SeedCell {
    pub x: u32,
    pub y: u32,
    pub state: CellState,
}

// Session configuration, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WireworldConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub seed: Vec<SeedCell>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            extension: default_extension(),
            format: SnapshotFormat::default(),
        }
    }
}

impl Default for WireworldConfig {
    fn default() -> Self {
        WireworldConfig {
            grid: GridConfig::default(),
            timing: TimingConfig::default(),
            storage: StorageConfig::default(),
            run: RunConfig::default(),
            seed: Vec::new(),
        }
    }
}

impl WireworldConfig {
    /// Loads the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates configuration text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: WireworldConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            anyhow::bail!("grid width and height must be positive.");
        }
        if self.timing.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be greater than 0.");
        }
        if !self.storage.extension.starts_with('.') || self.storage.extension.len() < 2 {
            anyhow::bail!("storage extension '{}' must start with a dot.", self.storage.extension);
        }
        Ok(())
    }
}

fn default_width() -> u32 {
    40
}

fn default_height() -> u32 {
    30
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_extension() -> String {
    ".wire".to_string()
}
