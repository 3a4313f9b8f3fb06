use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::policy::DEFAULT_MAGNET_RADIUS;

/// Tool configuration, read from a YAML file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Search radius, in pixels, for magnetic connection completion
    #[serde(default = "default_magnet_radius")]
    pub magnet_radius: f64,
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_magnet_radius() -> f64 {
    DEFAULT_MAGNET_RADIUS
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            magnet_radius: default_magnet_radius(),
        }
    }
}

impl ToolConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ToolConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
