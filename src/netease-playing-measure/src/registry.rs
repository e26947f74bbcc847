//! Lookup table consumers use to find their source.

use crate::source::ValueSource;
use netease_playing_core::ScopeHandle;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// All live sources known to one host, in registration order.
///
/// Entries are non-owning; a source that is dropped without calling
/// [`ValueSource::teardown`] simply stops matching.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    sources: Mutex<Vec<Weak<ValueSource>>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `source` if it is not already present. A source that is already
    /// registered keeps its position, so reconfiguring does not reorder.
    pub fn register(&self, source: &Arc<ValueSource>) {
        let mut sources = self.lock();
        sources.retain(|entry| entry.strong_count() > 0);
        let target = Arc::as_ptr(source);
        if !sources.iter().any(|entry| entry.as_ptr() == target) {
            sources.push(Arc::downgrade(source));
        }
        let candidates = sources.clone();
        drop(sources);

        let Some(identity) = source.identity() else {
            return;
        };
        let duplicates = candidates
            .iter()
            .filter(|entry| entry.as_ptr() != target)
            .filter_map(Weak::upgrade)
            .filter(|other| other.matches(identity.scope, &identity.name))
            .count();
        if duplicates > 0 {
            tracing::warn!(
                scope = %identity.scope,
                measure = %identity.name,
                duplicates,
                "several sources share this name; lookups use the last registered"
            );
        }
    }

    pub fn unregister(&self, source: &ValueSource) {
        let target: *const ValueSource = source;
        self.lock()
            .retain(|entry| entry.as_ptr() != target && entry.strong_count() > 0);
    }

    /// Finds the source registered as `name` in `scope`. When several match,
    /// the one registered last wins.
    pub fn find(&self, scope: ScopeHandle, name: &str) -> Option<Arc<ValueSource>> {
        // Upgrade outside the lock: dropping the last strong reference here
        // would re-enter `unregister`.
        let candidates = self.lock().clone();
        candidates
            .iter()
            .rev()
            .filter_map(Weak::upgrade)
            .find(|source| source.matches(scope, name))
    }

    /// Number of live sources.
    pub fn len(&self) -> usize {
        self.lock()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<ValueSource>>> {
        self.sources.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
