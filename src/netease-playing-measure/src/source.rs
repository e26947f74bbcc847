//! The parent side: owns the history path and the last good record.

use crate::registry::InstanceRegistry;
use netease_playing_core::{
    default_history_path, now_epoch_ms, FieldKind, HistoryRecord, ScopeHandle,
};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Identity a source is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    pub scope: ScopeHandle,
    pub name: String,
}

impl SourceIdentity {
    pub fn new(scope: ScopeHandle, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }

    pub fn matches(&self, scope: ScopeHandle, name: &str) -> bool {
        self.scope == scope && self.name == name
    }
}

#[derive(Debug, Default)]
struct SourceSettings {
    identity: Option<SourceIdentity>,
    history_path: Option<PathBuf>,
}

/// Reads the history file on every refresh and answers queries from the
/// most recent successful read.
///
/// Failed reads are expected (the client rewrites the file in place) and
/// leave the previous record untouched.
#[derive(Debug)]
pub struct ValueSource {
    registry: Arc<InstanceRegistry>,
    settings: RwLock<SourceSettings>,
    record: RwLock<Option<Arc<HistoryRecord>>>,
}

impl ValueSource {
    pub fn new(registry: Arc<InstanceRegistry>) -> Arc<Self> {
        Arc::new(Self {
            registry,
            settings: RwLock::new(SourceSettings::default()),
            record: RwLock::new(None),
        })
    }

    /// Sets identity and file path, then (re)registers.
    ///
    /// An absent or empty `path_override` selects the per-user default
    /// location. Calling this again replaces the previous identity.
    pub fn configure(
        self: &Arc<Self>,
        scope: ScopeHandle,
        name: impl Into<String>,
        path_override: Option<PathBuf>,
    ) {
        let identity = SourceIdentity::new(scope, name);
        let history_path = match path_override.filter(|path| !path.as_os_str().is_empty()) {
            Some(path) => Some(path),
            None => match default_history_path() {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(
                        scope = %identity.scope,
                        measure = %identity.name,
                        error = %err,
                        "no default history location; source will stay empty"
                    );
                    None
                }
            },
        };

        tracing::debug!(
            scope = %identity.scope,
            measure = %identity.name,
            path = ?history_path,
            "configured history source"
        );

        {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            settings.identity = Some(identity);
            settings.history_path = history_path;
        }
        self.registry.register(self);
    }

    /// Re-reads the history file. Never fails: on any error the previous
    /// record stays in place and the next refresh tries again.
    pub fn refresh(&self) {
        let Some(path) = self.history_path() else {
            return;
        };
        match HistoryRecord::load(&path) {
            Ok(record) => {
                *self.record.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::new(record));
            }
            Err(err) => {
                tracing::trace!(error = %err, "history unavailable; keeping previous record");
            }
        }
    }

    pub fn query_numeric(&self, kind: FieldKind) -> f64 {
        match self.record() {
            Some(record) => numeric_value(&record, kind, now_epoch_ms()),
            None => 0.0,
        }
    }

    pub fn query_string(&self, kind: FieldKind) -> Option<String> {
        let record = self.record()?;
        string_value(&record, kind)
    }

    /// Removes this source from the registry. Safe to call more than once.
    pub fn teardown(&self) {
        self.registry.unregister(self);
    }

    /// Snapshot of the last good record.
    pub fn record(&self) -> Option<Arc<HistoryRecord>> {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn identity(&self) -> Option<SourceIdentity> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .identity
            .clone()
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history_path
            .clone()
    }

    pub(crate) fn matches(&self, scope: ScopeHandle, name: &str) -> bool {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .identity
            .as_ref()
            .is_some_and(|identity| identity.matches(scope, name))
    }
}

impl Drop for ValueSource {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn numeric_value(record: &HistoryRecord, kind: FieldKind, now_ms: i64) -> f64 {
    match kind {
        FieldKind::Duration => record.duration_ms() as f64,
        FieldKind::PlayedTime => record.played_ms_at(now_ms) as f64,
        _ => 0.0,
    }
}

fn string_value(record: &HistoryRecord, kind: FieldKind) -> Option<String> {
    if kind.is_placeholder() {
        return Some(String::new());
    }
    let text = match kind {
        FieldKind::Name => record.track_name(),
        FieldKind::Artists => record.first_artist(),
        FieldKind::Album => record.album_name(),
        _ => None,
    };
    text.map(str::to_owned)
}
