//! Handles the configuration of the daemon.
//!
//! this module is responsible for parsing the Songboard.toml file and the
//! environment, and applying cli argument overrides.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use std::path::PathBuf;

pub static DEFAULT_CONFIG: &str = include_str!("../../Songboard.toml");

#[derive(Clone, Debug, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// General Daemon Settings
    #[serde(default)]
    pub daemon: DaemonSettings,
}

impl Settings {
    /// Load settings from the config file, environment variables, and CLI
    /// arguments.
    ///
    /// The config file is located at the path specified by the `--config`
    /// flag.
    ///
    /// The environment variables are prefixed with `SONGBOARD_`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config file is not found or
    /// if the config file is invalid.
    #[inline]
    pub fn init(
        config: PathBuf,
        port: Option<u16>,
        log_level: Option<log::LevelFilter>,
    ) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(config))
            .add_source(Environment::with_prefix("SONGBOARD"))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        if let Some(path) = &mut settings.daemon.db_path {
            *path = shellexpand::tilde(&path.to_string_lossy())
                .into_owned()
                .into();
        }

        if let Some(port) = port {
            settings.daemon.rpc_port = port;
        }

        if let Some(log_level) = log_level {
            settings.daemon.log_level = log_level;
        }

        Ok(settings)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DaemonSettings {
    /// The port to listen for RPC connections on.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    /// The minimum log level emitted by the daemon.
    #[serde(default = "default_log_level")]
    pub log_level: log::LevelFilter,
    /// Where the catalog database lives; the platform data directory when
    /// unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            db_path: None,
        }
    }
}

const fn default_rpc_port() -> u16 {
    6611
}

const fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}
