use crate::{AppConfig, CatDiffError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "catdiff.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

/// Load the configuration from the standard locations
pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    load_from(path, portable)
}

/// Load the configuration from an explicit file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<LoadedConfig> {
    if !path.exists() {
        return Err(CatDiffError::Config(format!(
            "Config file does not exist: {}",
            path.display()
        )));
    }
    load_from(path.to_path_buf(), false)
}

fn load_from(path: PathBuf, portable: bool) -> Result<LoadedConfig> {
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).map_err(|e| CatDiffError::Serialization(e.to_string()))?
    } else {
        AppConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

/// Load the configuration, writing the defaults out first if no file exists yet
pub fn ensure_config(prefer_portable: bool) -> Result<LoadedConfig> {
    let loaded = load_config(prefer_portable)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| CatDiffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool)> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "catdiff", "catdiff")
        .ok_or_else(|| CatDiffError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
