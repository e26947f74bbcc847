//! Host-facing lifecycle adapter.
//!
//! Translates the host's per-measure calls (initialize, reload, update,
//! get-string, finalize) into operations on [`Measure`]s. No call fails: an
//! unknown id or an unconfigured measure yields the default value.

use crate::api::MeasureApi;
use crate::measure::{HostContext, Measure};
use crate::registry::InstanceRegistry;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Handle the host keeps for each measure it created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeasureId(u64);

impl fmt::Display for MeasureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "measure#{}", self.0)
    }
}

/// Holds the most recent string handed to the host.
///
/// The previous value is only released once its replacement exists, and the
/// buffer stays valid until the next [`PluginHost::get_string`] call.
#[derive(Debug, Default)]
pub struct StringBuffer {
    text: Option<String>,
    wide: Vec<u16>,
}

impl StringBuffer {
    fn replace(&mut self, value: Option<String>) {
        let wide = value
            .as_deref()
            .map(|text| text.encode_utf16().chain(std::iter::once(0)).collect())
            .unwrap_or_default();
        self.text = value;
        self.wide = wide;
    }

    pub fn as_str(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// NUL-terminated UTF-16 copy for wide-character hosts.
    pub fn as_wide(&self) -> Option<&[u16]> {
        self.text.as_ref().map(|_| self.wide.as_slice())
    }
}

#[derive(Debug, Default)]
pub struct PluginHost {
    context: HostContext,
    measures: HashMap<MeasureId, Measure>,
    next_id: u64,
    buffer: StringBuffer,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources without `HistoryJsonPath` read `path` instead of the per-user
    /// default.
    pub fn with_history_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.history_fallback = Some(path.into());
        self
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.context.registry
    }

    pub fn initialize<A: MeasureApi>(&mut self, api: &A) -> MeasureId {
        self.next_id += 1;
        let id = MeasureId(self.next_id);
        let measure = Measure::create(api, &self.context);
        tracing::debug!(
            %id,
            measure = %api.measure_name(),
            scope = %api.scope(),
            source = measure.is_source(),
            "measure created"
        );
        self.measures.insert(id, measure);
        id
    }

    pub fn reload<A: MeasureApi>(&mut self, id: MeasureId, api: &A) {
        match self.measures.get_mut(&id) {
            Some(measure) => measure.reload(api, &self.context),
            None => tracing::warn!(%id, "reload for unknown measure"),
        }
    }

    pub fn update(&mut self, id: MeasureId) -> f64 {
        self.measures
            .get(&id)
            .map(Measure::update)
            .unwrap_or(0.0)
    }

    /// Fetches the measure's string into the host buffer.
    pub fn get_string(&mut self, id: MeasureId) -> Option<&str> {
        self.fill_buffer(id);
        self.buffer.as_str()
    }

    /// Like [`PluginHost::get_string`], for hosts that want UTF-16.
    pub fn get_wide_string(&mut self, id: MeasureId) -> Option<&[u16]> {
        self.fill_buffer(id);
        self.buffer.as_wide()
    }

    pub fn finalize(&mut self, id: MeasureId) {
        match self.measures.remove(&id) {
            Some(measure) => {
                measure.teardown();
                tracing::debug!(%id, "measure finalized");
            }
            None => tracing::warn!(%id, "finalize for unknown measure"),
        }
    }

    pub fn measure(&self, id: MeasureId) -> Option<&Measure> {
        self.measures.get(&id)
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    fn fill_buffer(&mut self, id: MeasureId) {
        let value = self.measures.get(&id).and_then(Measure::get_string);
        self.buffer.replace(value);
    }
}
