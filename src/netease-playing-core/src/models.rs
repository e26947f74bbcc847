use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the configuration context (skin) that owns a measure.
///
/// Two measures with the same name in different scopes never see each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeHandle(pub u64);

impl ScopeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<u64> for ScopeHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Severity levels understood by the host's log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Notice,
    Debug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Debug => "DEBUG",
        };
        f.write_str(label)
    }
}
