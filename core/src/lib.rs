pub mod errors;
pub mod import;
pub mod logger;
#[cfg(feature = "rpc")]
pub mod rpc;
pub mod search;
pub mod state;
pub mod sync;

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::errors::DirectoryError;

/// Get the path to the directory where the daemon's config file lives.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined for this
/// platform.
pub fn get_config_dir() -> Result<PathBuf, DirectoryError> {
    ProjectDirs::from("com", "songboard", "songboard")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(DirectoryError::Config)
}

/// Get the path to the directory where the database and log file live.
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined for this
/// platform.
pub fn get_data_dir() -> Result<PathBuf, DirectoryError> {
    ProjectDirs::from("com", "songboard", "songboard")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(DirectoryError::Data)
}
