use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
    time::Duration,
};

use pkgsync_utils::{
    path::{resolve_path, xdg_config_home},
    time::parse_timeout,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    repository::RepositoryConfig,
};

pub const DEFAULT_SOURCE_URL: &str = "https://pypi.org";
pub const DEFAULT_TIMEOUT: &str = "60s";

/// Application's configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Index packages are read from.
    /// Default: https://pypi.org
    #[serde(default = "default_source")]
    pub source: RepositoryConfig,

    /// Index packages are registered and uploaded to.
    pub destination: Option<RepositoryConfig>,

    /// Directory artifacts are downloaded into before upload.
    /// Default: $TMPDIR/pkgsync
    pub tmp_dir: Option<String>,

    /// Timeout applied to every network call, e.g. "30s", "2m".
    /// Default: 60s
    pub timeout: Option<String>,

    /// Only sync the highest matching version of each package.
    /// Default: false
    pub latest: Option<bool>,

    /// Release specifiers that are never synced.
    pub exclude: Option<Vec<String>>,

    /// User agent sent with every request.
    pub user_agent: Option<String>,
}

fn default_source() -> RepositoryConfig {
    RepositoryConfig::new(DEFAULT_SOURCE_URL)
}

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("PKGSYNC_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("pkgsync").join("config.toml"),
    })
});

/// Points [`Config::new`] at another file, e.g. from `--config`.
pub fn set_config_path(path: PathBuf) {
    match CONFIG_PATH.write() {
        Ok(mut guard) => *guard = path,
        Err(poisoned) => *poisoned.into_inner() = path,
    }
}

fn config_path() -> PathBuf {
    match CONFIG_PATH.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            destination: None,
            tmp_dir: None,
            timeout: None,
            latest: None,
            exclude: None,
            user_agent: None,
        }
    }
}

impl Config {
    /// Creates a new configuration by loading it from the configuration file.
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("loading configuration from {}", path.display());
                toml::from_str(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        Ok(config)
    }

    /// Validates repository URLs and the timeout. Run after CLI overrides are applied.
    pub fn resolve(&mut self) -> Result<()> {
        self.source.resolve()?;

        match self.destination.as_mut() {
            Some(destination) => destination.resolve()?,
            None => return Err(ConfigError::MissingDestination),
        }

        self.get_timeout()?;
        Ok(())
    }

    pub fn destination(&self) -> Result<&RepositoryConfig> {
        self.destination
            .as_ref()
            .ok_or(ConfigError::MissingDestination)
    }

    pub fn get_timeout(&self) -> Result<Duration> {
        let raw = self.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT);
        parse_timeout(raw).ok_or_else(|| ConfigError::InvalidTimeout(raw.to_string()))
    }

    pub fn get_tmp_dir(&self) -> Result<PathBuf> {
        match self.tmp_dir.as_deref() {
            Some(dir) => Ok(resolve_path(dir)?),
            None => Ok(std::env::temp_dir().join("pkgsync")),
        }
    }

    pub fn latest(&self) -> bool {
        self.latest.unwrap_or(false)
    }

    pub fn exclude(&self) -> &[String] {
        self.exclude.as_deref().unwrap_or_default()
    }
}
