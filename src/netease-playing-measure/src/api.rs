//! The narrow surface a host exposes to each measure.

use netease_playing_core::{ScopeHandle, Severity};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Option naming the field a measure exposes.
pub const OPTION_TYPE: &str = "Type";
/// Option naming the source a consumer binds to. Empty means "I am a source".
pub const OPTION_PARENT_NAME: &str = "ParentName";
/// Source-only override of the history file location.
pub const OPTION_HISTORY_JSON_PATH: &str = "HistoryJsonPath";

/// Per-measure view of the host.
///
/// Implementations must return a stable [`ScopeHandle`] for the lifetime of a
/// measure; lookups between sources and consumers rely on it.
pub trait MeasureApi {
    /// Reads an option, falling back to `default` when it is not set.
    fn read_string(&self, key: &str, default: &str) -> String;

    /// Name of the measure block being configured.
    fn measure_name(&self) -> String;

    /// Configuration context the measure belongs to.
    fn scope(&self) -> ScopeHandle;

    /// Writes to the host's log.
    fn log(&self, severity: Severity, message: &str);
}

/// A [`MeasureApi`] backed by an in-memory option table.
///
/// Keys are matched case-insensitively. Every message passed to
/// [`MeasureApi::log`] is kept so callers can inspect it; nothing is forwarded
/// to `tracing`, measures already trace what they report.
#[derive(Debug, Clone)]
pub struct MeasureOptions {
    scope: ScopeHandle,
    name: String,
    options: BTreeMap<String, String>,
    logged: RefCell<Vec<(Severity, String)>>,
}

impl MeasureOptions {
    pub fn new(scope: ScopeHandle, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
            options: BTreeMap::new(),
            logged: RefCell::new(Vec::new()),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.options.insert(key.to_lowercase(), value.into());
    }

    /// Messages logged so far, oldest first.
    pub fn logged(&self) -> Vec<(Severity, String)> {
        self.logged.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.logged.borrow_mut().clear();
    }
}

impl MeasureApi for MeasureOptions {
    fn read_string(&self, key: &str, default: &str) -> String {
        self.options
            .get(&key.to_lowercase())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn measure_name(&self) -> String {
        self.name.clone()
    }

    fn scope(&self) -> ScopeHandle {
        self.scope
    }

    fn log(&self, severity: Severity, message: &str) {
        self.logged
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}
