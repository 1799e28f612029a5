// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{
    APP_DIR_NAME, DEFAULT_DECODE_REGION, DEFAULT_RESOLUTION, DEFAULT_SCAN_FPS, DEFAULT_TARGET_ID,
};
use crate::errors::{AppError, AppResult};
use crate::frame_processor::DecodeRegion;
use crate::scanner::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// User configuration, stored as JSON
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decode attempts per second
    pub frame_rate: u32,
    /// Centred decode region; `null` searches the whole frame
    pub decode_region: Option<DecodeRegion>,
    /// Capture resolution requested from the camera
    pub resolution: (u32, u32),
    /// Scan target sessions bind to
    pub target_id: String,
    /// Print the provenance record after a successful scan
    pub print_trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_SCAN_FPS,
            decode_region: Some(DecodeRegion::square(DEFAULT_DECODE_REGION)),
            resolution: DEFAULT_RESOLUTION,
            target_id: DEFAULT_TARGET_ID.to_string(),
            print_trace: true,
        }
    }
}

impl Config {
    /// `<config dir>/ayurtrace-scanner/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.json"))
    }

    /// Load from `path`, falling back to defaults when the file is missing
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Session parameters derived from this config
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            target_id: self.target_id.clone(),
            frame_rate: self.frame_rate,
            decode_region: self.decode_region,
            resolution: self.resolution,
        }
    }
}
