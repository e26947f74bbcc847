use crate::{APP_AUTHOR, APP_NAME, APP_QUALIFIER, HISTORY_RELATIVE_PATH};
use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl AppDirs {
    pub fn discover() -> Result<Self, DirsError> {
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_AUTHOR, APP_NAME)
            .ok_or(DirsError::MissingProjectDirs)?;
        let log_dir = dirs.data_dir().join("logs");
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
            log_dir,
        })
    }

    pub fn ensure_exists(&self) -> Result<(), DirsError> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| DirsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Where the Netease client keeps its playback history for the current user.
///
/// On Windows this resolves under `%LOCALAPPDATA%`; other platforms use their
/// local data directory so the same layout can be mirrored for testing.
pub fn default_history_path() -> Result<PathBuf, DirsError> {
    let base = BaseDirs::new().ok_or(DirsError::MissingHomeDir)?;
    Ok(base.data_local_dir().join(HISTORY_RELATIVE_PATH))
}

#[derive(Debug, Error)]
pub enum DirsError {
    #[error("unable to determine project directories for netease-playing")]
    MissingProjectDirs,
    #[error("unable to determine the local application data directory")]
    MissingHomeDir,
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}
