/// Tunable parameters for gesture handling and orientation integration
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotatorError};

/// Rotator settings, usually read from a TOML file.
///
/// Every key is optional in the file; missing keys take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatorConfig {
    /// Converts gesture velocity (screen units per second) into rad/s
    pub velocity_scale: f32,
    /// Upper bound on angular speed in rad/s
    pub max_angular_speed: f32,
    /// Exponential decay rate of angular velocity per second
    pub damping: f32,
    /// Weight of the newest gesture sample in the moving average, in (0, 1]
    pub smoothing: f32,
    pub target_fps: u32,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            velocity_scale: 0.01,
            max_angular_speed: 25.0,
            damping: 0.0,
            smoothing: 1.0,
            target_fps: 30,
        }
    }
}

impl RotatorConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|source| RotatorError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.velocity_scale.is_finite() {
            return Err(RotatorError::InvalidConfig(
                "velocity_scale must be finite".into(),
            ));
        }
        if !self.max_angular_speed.is_finite() || self.max_angular_speed <= 0.0 {
            return Err(RotatorError::InvalidConfig(
                "max_angular_speed must be a positive number".into(),
            ));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(RotatorError::InvalidConfig(
                "damping must be zero or positive".into(),
            ));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(RotatorError::InvalidConfig(
                "smoothing must lie in (0, 1]".into(),
            ));
        }
        if self.target_fps == 0 {
            return Err(RotatorError::InvalidConfig(
                "target_fps must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
