use std::path::PathBuf;

use crate::{AppError, Result};

const DATA_DIR_ENV: &str = "NETMETER_DATA_DIR";

#[derive(Clone, Debug)]
pub struct AppPaths {
    pub app_data_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new(app_data_dir: PathBuf) -> Self {
        let db_path = app_data_dir.join("netmeter.sqlite");
        let config_path = app_data_dir.join("netmeter.toml");
        Self {
            app_data_dir,
            db_path,
            config_path,
        }
    }
}

pub fn ensure_app_data_dir(paths: &AppPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.app_data_dir)?;
    Ok(())
}

/// `$NETMETER_DATA_DIR`, or `~/.local/share/netmeter`.
pub fn default_app_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var_os("HOME")
        .ok_or_else(|| AppError::Message("resolve HOME: not set".to_string()))?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("netmeter"))
}
