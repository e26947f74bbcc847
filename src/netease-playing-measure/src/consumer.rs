//! The child side: resolves a source once per reload and forwards to it.

use crate::error::ConfigurationError;
use crate::registry::InstanceRegistry;
use crate::source::ValueSource;
use netease_playing_core::{FieldKind, ScopeHandle};
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Default)]
pub struct ConsumerBinding {
    field: FieldKind,
    parent_name: String,
    source: Option<Weak<ValueSource>>,
}

impl ConsumerBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `parent_name` in `scope` from scratch, discarding any earlier
    /// binding. On failure the binding stays unresolved until the next call.
    pub fn configure(
        &mut self,
        field: FieldKind,
        scope: ScopeHandle,
        parent_name: &str,
        registry: &InstanceRegistry,
    ) -> Result<(), ConfigurationError> {
        self.field = field;
        self.parent_name = parent_name.to_string();
        self.source = registry
            .find(scope, parent_name)
            .map(|source| Arc::downgrade(&source));

        if self.source.is_none() {
            return Err(ConfigurationError::UnresolvedParent {
                name: parent_name.to_string(),
            });
        }
        Ok(())
    }

    pub fn query_numeric(&self) -> f64 {
        self.bound()
            .map(|source| source.query_numeric(self.field))
            .unwrap_or(0.0)
    }

    pub fn query_string(&self) -> Option<String> {
        self.bound()?.query_string(self.field)
    }

    /// The source this binding currently forwards to, if it is still alive.
    pub fn bound(&self) -> Option<Arc<ValueSource>> {
        self.source.as_ref()?.upgrade()
    }

    pub fn is_resolved(&self) -> bool {
        self.bound().is_some()
    }

    pub fn field(&self) -> FieldKind {
        self.field
    }

    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unresolved_binding_returns_defaults() {
        let registry = InstanceRegistry::new();
        let mut binding = ConsumerBinding::new();
        let err = binding
            .configure(FieldKind::Duration, ScopeHandle(1), "Missing", &registry)
            .unwrap_err();
        assert_eq!(err.to_string(), "ParentName=Missing not valid");
        assert!(!binding.is_resolved());
        assert_eq!(binding.query_numeric(), 0.0);
        assert_eq!(binding.query_string(), None);
    }

    #[test]
    fn forwards_to_bound_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        fs::write(
            &path,
            r#"[{"track":{"name":"Song A","duration":1234,"album":{"name":"Album Y"}}}]"#,
        )
        .unwrap();

        let registry = Arc::new(InstanceRegistry::new());
        let source = ValueSource::new(Arc::clone(&registry));
        source.configure(ScopeHandle(1), "Parent", Some(path));
        source.refresh();

        let mut binding = ConsumerBinding::new();
        binding
            .configure(FieldKind::Duration, ScopeHandle(1), "Parent", &registry)
            .unwrap();
        assert_eq!(binding.query_numeric(), 1234.0);
        assert_eq!(binding.query_string(), None);

        binding
            .configure(FieldKind::Album, ScopeHandle(1), "Parent", &registry)
            .unwrap();
        assert_eq!(binding.query_string().as_deref(), Some("Album Y"));
        assert_eq!(binding.parent_name(), "Parent");
    }

    #[test]
    fn reconfigure_drops_previous_binding() {
        let registry = Arc::new(InstanceRegistry::new());
        let source = ValueSource::new(Arc::clone(&registry));
        source.configure(ScopeHandle(1), "Parent", None);

        let mut binding = ConsumerBinding::new();
        binding
            .configure(FieldKind::Name, ScopeHandle(1), "Parent", &registry)
            .unwrap();
        assert!(binding.is_resolved());

        assert!(binding
            .configure(FieldKind::Name, ScopeHandle(2), "Parent", &registry)
            .is_err());
        assert!(!binding.is_resolved());
    }

    #[test]
    fn binding_does_not_keep_source_alive() {
        let registry = Arc::new(InstanceRegistry::new());
        let source = ValueSource::new(Arc::clone(&registry));
        source.configure(ScopeHandle(1), "Parent", None);

        let mut binding = ConsumerBinding::new();
        binding
            .configure(FieldKind::Name, ScopeHandle(1), "Parent", &registry)
            .unwrap();
        drop(source);

        assert!(!binding.is_resolved());
        assert_eq!(binding.query_string(), None);
    }
}
