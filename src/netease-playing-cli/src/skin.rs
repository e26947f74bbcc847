//! Skin files: a TOML list of measure blocks sharing one scope.
//!
//! ```toml
//! [[measure]]
//! name = "Playing"
//! Type = "name"
//!
//! [[measure]]
//! name = "Artist"
//! Type = "artists"
//! ParentName = "Playing"
//! ```

use netease_playing_core::ScopeHandle;
use netease_playing_measure::MeasureOptions;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkinError {
    #[error("failed to read skin {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse skin {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("skin {path} defines no measures")]
    Empty { path: PathBuf },
    #[error("skin {path} defines measure {name} more than once")]
    DuplicateMeasure { path: PathBuf, name: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasureBlock {
    pub name: String,
    #[serde(flatten)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SkinFile {
    #[serde(default)]
    measure: Vec<MeasureBlock>,
}

#[derive(Debug, Clone)]
pub struct Skin {
    pub path: PathBuf,
    pub scope: ScopeHandle,
    pub measures: Vec<MeasureBlock>,
}

impl Skin {
    pub fn load(path: &Path, scope: ScopeHandle) -> Result<Self, SkinError> {
        let contents = fs::read_to_string(path).map_err(|source| SkinError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path, scope)
    }

    pub fn parse(contents: &str, path: &Path, scope: ScopeHandle) -> Result<Self, SkinError> {
        let file: SkinFile = toml::from_str(contents).map_err(|source| SkinError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if file.measure.is_empty() {
            return Err(SkinError::Empty {
                path: path.to_path_buf(),
            });
        }
        let mut seen = HashSet::new();
        for block in &file.measure {
            if !seen.insert(block.name.as_str()) {
                return Err(SkinError::DuplicateMeasure {
                    path: path.to_path_buf(),
                    name: block.name.clone(),
                });
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            scope,
            measures: file.measure,
        })
    }

    /// Host-side option tables, in declaration order.
    pub fn options(&self) -> Vec<MeasureOptions> {
        self.measures
            .iter()
            .map(|block| {
                block.options.iter().fold(
                    MeasureOptions::new(self.scope, block.name.clone()),
                    |options, (key, value)| options.with(key, value.clone()),
                )
            })
            .collect()
    }
}
