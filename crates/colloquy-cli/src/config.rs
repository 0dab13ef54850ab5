//! Configuration for a CLI run.
//!
//! A run's [`AppConfig`] is put together in three steps:
//!
//! 1. [`locate`] picks the file: `--config`, then `colloquy/config.toml` in
//!    the working directory, then `config.toml` in the platform config
//!    directory. Without any of them the built-in defaults are used.
//! 2. The file is parsed as TOML.
//! 3. [`ConfigOverrides`] from the command line are applied on top, so
//!    `--store` always wins over `[store] root`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use colloquy::config::AppConfig;

const LOCAL_CONFIG: &str = "colloquy/config.toml";
const CONFIG_FILE: &str = "config.toml";

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--config` names a file that does not exist.
    #[error("missing configuration file `{}`", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to read configuration file `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration file `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Returns the configuration file the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::MissingFile(path) | Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Where a run's configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`. It must exist.
    Explicit(PathBuf),
    /// `colloquy/config.toml` below the working directory.
    Local(PathBuf),
    /// `config.toml` in the platform config directory.
    System(PathBuf),
    /// No file; built-in defaults.
    Default,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Local(path) | Self::System(path) => Some(path.as_path()),
            Self::Default => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Explicit(_) => "explicit",
            Self::Local(_) => "local",
            Self::System(_) => "system",
            Self::Default => "default",
        }
    }
}

/// Settings given on the command line that win over the configuration file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides<'a> {
    /// Replaces `[store] root`.
    pub store_root: Option<&'a Path>,
}

/// Picks the configuration file for this run.
pub fn locate(explicit: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.is_file() {
        return ConfigSource::Local(local.to_path_buf());
    }

    match ProjectDirs::from("com", "colloquy", "colloquy") {
        Some(dirs) => {
            let system = dirs.config_dir().join(CONFIG_FILE);
            if system.is_file() {
                return ConfigSource::System(system);
            }
            debug!(path = system.display().to_string(); "System configuration file not found");
        }
        None => debug!("Could not determine platform-specific config directory"),
    }

    ConfigSource::Default
}

/// Loads the configuration for this run and applies `overrides`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the located file is missing, unreadable or not
/// valid TOML for [`AppConfig`].
pub fn load_config(
    explicit: Option<&Path>,
    overrides: ConfigOverrides<'_>,
) -> Result<AppConfig, ConfigError> {
    let source = locate(explicit);

    let config = match source.path() {
        Some(path) => {
            info!(source = source.label(), path = path.display().to_string(); "Loading configuration");
            read_config_file(path)?
        }
        None => {
            debug!("No configuration file found, using default configuration");
            AppConfig::default()
        }
    };

    Ok(apply_overrides(config, overrides))
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::MissingFile(path.to_path_buf()),
        _ => ConfigError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_overrides(config: AppConfig, overrides: ConfigOverrides<'_>) -> AppConfig {
    let Some(root) = overrides.store_root else {
        return config;
    };

    debug!(root = root.display().to_string(); "Store root set on the command line");
    let store = config.store().clone().with_root(root);
    config.with_store(store)
}
