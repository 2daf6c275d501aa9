use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_WIDTH: usize = 10;
pub const DEFAULT_HEIGHT: usize = 20;

// Timing (in milliseconds)
const DEFAULT_FALL_INTERVAL_MS: u64 = 800;
const DEFAULT_MIN_FALL_INTERVAL_MS: u64 = 100;
const DEFAULT_SPEEDUP_PER_LEVEL_MS: u64 = 50;
const DEFAULT_LOCK_DELAY_MS: u64 = 500;
const DEFAULT_SOFT_DROP_FACTOR: u32 = 10;
pub const DEFAULT_LINES_PER_LEVEL: u32 = 10;

/// Smallest grid every shape kind fits into in any rotation.
pub const MIN_GRID_SIDE: usize = 4;
pub const MAX_GRID_SIDE: usize = 256;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// EngineConfig
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// Row whose occupancy ends the game. `None` means `height - 1`.
    pub top_row: Option<usize>,
    pub fall_interval_ms: u64,
    pub min_fall_interval_ms: u64,
    pub fall_speedup_per_level_ms: u64,
    pub lock_delay_ms: u64,
    pub soft_drop_factor: u32,
    pub lines_per_level: u32,
    pub cell_size: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            top_row: None,
            fall_interval_ms: DEFAULT_FALL_INTERVAL_MS,
            min_fall_interval_ms: DEFAULT_MIN_FALL_INTERVAL_MS,
            fall_speedup_per_level_ms: DEFAULT_SPEEDUP_PER_LEVEL_MS,
            lock_delay_ms: DEFAULT_LOCK_DELAY_MS,
            soft_drop_factor: DEFAULT_SOFT_DROP_FACTOR,
            lines_per_level: DEFAULT_LINES_PER_LEVEL,
            cell_size: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

impl EngineConfig {
    /// The 4x5 player grid.
    pub fn compact() -> Self {
        Self {
            width: 4,
            height: 5,
            ..Self::default()
        }
    }

    /// The 32x24 arena grid.
    pub fn wide() -> Self {
        Self {
            width: 32,
            height: 24,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_GRID_SIDE || self.height < MIN_GRID_SIDE {
            return Err(ConfigError::Invalid(format!(
                "grid {}x{} is smaller than {MIN_GRID_SIDE}x{MIN_GRID_SIDE}",
                self.width, self.height
            )));
        }
        if self.width > MAX_GRID_SIDE || self.height > MAX_GRID_SIDE {
            return Err(ConfigError::Invalid(format!(
                "grid {}x{} is larger than {MAX_GRID_SIDE}x{MAX_GRID_SIDE}",
                self.width, self.height
            )));
        }
        if let Some(top) = self.top_row {
            if top >= self.height {
                return Err(ConfigError::Invalid(format!(
                    "top row {top} outside grid of height {}",
                    self.height
                )));
            }
        }
        if self.fall_interval_ms == 0 || self.min_fall_interval_ms == 0 {
            return Err(ConfigError::Invalid("fall interval must be positive".into()));
        }
        if self.soft_drop_factor == 0 {
            return Err(ConfigError::Invalid("soft drop factor must be at least 1".into()));
        }
        if self.lines_per_level == 0 {
            return Err(ConfigError::Invalid("lines per level must be positive".into()));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "cell size {} must be finite and positive",
                self.cell_size
            )));
        }
        Ok(())
    }

    pub fn top_row(&self) -> usize {
        self.top_row.unwrap_or(self.height.saturating_sub(1))
    }

    pub fn lock_delay(&self) -> Duration {
        Duration::from_millis(self.lock_delay_ms)
    }

    pub fn fall_interval(&self, level: u32) -> Duration {
        let speedup = u64::from(level.saturating_sub(1)) * self.fall_speedup_per_level_ms;
        let ms = self
            .fall_interval_ms
            .saturating_sub(speedup)
            .max(self.min_fall_interval_ms);
        Duration::from_millis(ms)
    }
}
