use std::path::Path;

use framepipe_common::PoolPolicy;
use framepipe_uniform::DEFAULT_UNIFORM_BUFFER_SIZE;
use serde::{Deserialize, Serialize};

/// Errors from loading a [`FrameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Frame pipeline sizing. Missing YAML keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Submit commands a frame may hold before the policy applies.
    pub command_capacity: usize,
    pub command_policy: PoolPolicy,
    /// Bytes in each per-pass uniform buffer.
    pub uniform_buffer_size: usize,
    /// Buffers the mesh buffer pool may hand out before the policy applies.
    pub buffer_pool_blocks: usize,
    pub buffer_pool_policy: PoolPolicy,
    /// Frames the producer may have outstanding at the consumer.
    pub frames_in_flight: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            command_capacity: 500,
            command_policy: PoolPolicy::Reject,
            uniform_buffer_size: DEFAULT_UNIFORM_BUFFER_SIZE,
            buffer_pool_blocks: 4096,
            buffer_pool_policy: PoolPolicy::Grow,
            frames_in_flight: 2,
        }
    }
}

impl FrameConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading frame config");
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_capacity == 0 {
            return Err(ConfigError::Invalid("command_capacity must be non-zero"));
        }
        if self.frames_in_flight == 0 {
            return Err(ConfigError::Invalid("frames_in_flight must be non-zero"));
        }
        Ok(())
    }
}
