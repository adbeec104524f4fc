use std::path::PathBuf;

use anyhow::{Context, Result};

const APP_DIR_NAME: &str = "tellme";
const CONFIG_FILE_NAME: &str = "config";
const LEGACY_CACHE_DIR_NAME: &str = "cache";

/// `~/.tellme` is honored when it already exists; otherwise the platform
/// config directory is used.
pub fn config_file_path() -> Result<PathBuf> {
    if let Some(legacy) = legacy_dir().filter(|dir| dir.is_dir()) {
        return Ok(legacy.join(CONFIG_FILE_NAME));
    }
    let base = dirs::config_dir().context("unable to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn default_cache_dir() -> Result<PathBuf> {
    if let Some(legacy) = legacy_dir()
        .map(|dir| dir.join(LEGACY_CACHE_DIR_NAME))
        .filter(|dir| dir.is_dir())
    {
        return Ok(legacy);
    }
    let base = dirs::cache_dir().context("unable to resolve cache directory")?;
    Ok(base.join(APP_DIR_NAME))
}

fn legacy_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(format!(".{APP_DIR_NAME}")))
}
