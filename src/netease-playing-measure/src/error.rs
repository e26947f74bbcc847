use netease_playing_core::FieldKindError;
use thiserror::Error;

/// Problems found while applying a measure's options.
///
/// These never reach the host as failures; the measure logs them and falls
/// back to its defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    InvalidType(#[from] FieldKindError),
    #[error("ParentName={name} not valid")]
    UnresolvedParent { name: String },
}
