use std::fs;
use std::path::{Path, PathBuf};

use netmeter_core::Transport;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// User-editable settings stored next to the database.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Transports whose history is backfilled on first start.
    pub bootstrap_transports: Vec<Transport>,
    pub parallel_backfill: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bootstrap_transports: vec![Transport::Wifi, Transport::Cellular],
            parallel_backfill: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConfigLoad {
    pub config: TrackerConfig,
    pub path: PathBuf,
    pub created: bool,
}

pub fn load_or_create(path: &Path) -> Result<ConfigLoad> {
    if path.exists() {
        let contents = fs::read_to_string(path).map_err(|err| {
            AppError::Message(format!("read config {}: {}", path.display(), err))
        })?;
        let config: TrackerConfig = toml::from_str(&contents)?;
        return Ok(ConfigLoad {
            config,
            path: path.to_path_buf(),
            created: false,
        });
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let config = TrackerConfig::default();
    let contents = toml::to_string_pretty(&config)?;
    fs::write(path, contents).map_err(|err| {
        AppError::Message(format!("write config {}: {}", path.display(), err))
    })?;
    Ok(ConfigLoad {
        config,
        path: path.to_path_buf(),
        created: true,
    })
}
