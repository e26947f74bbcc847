pub mod config;
pub mod field;
pub mod history;
pub mod logging;
pub mod models;
pub mod paths;

pub use config::{Config, ConfigError, LogLevel, LoggingConfig, ValidationError};
pub use field::{FieldKind, FieldKindError};
pub use history::{
    now_epoch_ms, Album, Artist, HistoryEntry, HistoryError, HistoryRecord, HistoryResult, Track,
};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{ScopeHandle, Severity};
pub use paths::{default_history_path, AppDirs, DirsError};

pub const APP_NAME: &str = "netease-playing";
pub const APP_AUTHOR: &str = "NeteasePlaying";
pub const APP_QUALIFIER: &str = "io";

/// Location of the history file relative to the per-user local app data dir.
pub const HISTORY_RELATIVE_PATH: &str = "Netease/CloudMusic/webdata/file/history";
