use crate::api::{MeasureApi, OPTION_HISTORY_JSON_PATH, OPTION_PARENT_NAME, OPTION_TYPE};
use crate::consumer::ConsumerBinding;
use crate::error::ConfigurationError;
use crate::registry::InstanceRegistry;
use crate::source::ValueSource;
use netease_playing_core::{FieldKind, Severity};
use std::path::PathBuf;
use std::sync::Arc;

/// What every measure needs from the host adapter besides its own options.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    pub registry: Arc<InstanceRegistry>,
    /// Used by sources that leave `HistoryJsonPath` unset, ahead of the
    /// per-user default.
    pub history_fallback: Option<PathBuf>,
}

impl HostContext {
    pub fn new(registry: Arc<InstanceRegistry>) -> Self {
        Self {
            registry,
            history_fallback: None,
        }
    }
}

#[derive(Debug)]
pub enum Role {
    Source(Arc<ValueSource>),
    Consumer(ConsumerBinding),
}

/// One configured measure block.
#[derive(Debug)]
pub struct Measure {
    field: FieldKind,
    role: Role,
}

impl Measure {
    /// Picks the role from `ParentName`; nothing is registered until
    /// [`Measure::reload`].
    pub fn create<A: MeasureApi>(api: &A, context: &HostContext) -> Self {
        Self {
            field: FieldKind::default(),
            role: new_role(&parent_name(api), context),
        }
    }

    /// Re-reads every option. Configuration problems are logged to the host
    /// and leave the measure on its defaults.
    pub fn reload<A: MeasureApi>(&mut self, api: &A, context: &HostContext) {
        let raw_type = api.read_string(OPTION_TYPE, "");
        self.field = match raw_type.parse::<FieldKind>() {
            Ok(field) => field,
            Err(err) => {
                report(api, &ConfigurationError::from(err));
                FieldKind::default()
            }
        };

        let parent = parent_name(api);
        let wants_source = parent.is_empty();
        if wants_source != self.is_source() {
            tracing::debug!(
                measure = %api.measure_name(),
                source = wants_source,
                "measure role changed on reload"
            );
            self.teardown_source();
            self.role = new_role(&parent, context);
        }

        match &mut self.role {
            Role::Source(source) => {
                let path = api.read_string(OPTION_HISTORY_JSON_PATH, "");
                let path = if path.is_empty() {
                    context.history_fallback.clone()
                } else {
                    Some(PathBuf::from(path))
                };
                source.configure(api.scope(), api.measure_name(), path);
            }
            Role::Consumer(binding) => {
                if let Err(err) =
                    binding.configure(self.field, api.scope(), &parent, &context.registry)
                {
                    report(api, &err);
                }
            }
        }
    }

    /// Refreshes a source, then returns this measure's numeric value.
    pub fn update(&self) -> f64 {
        match &self.role {
            Role::Source(source) => {
                source.refresh();
                source.query_numeric(self.field)
            }
            Role::Consumer(binding) => binding.query_numeric(),
        }
    }

    pub fn get_string(&self) -> Option<String> {
        match &self.role {
            Role::Source(source) => source.query_string(self.field),
            Role::Consumer(binding) => binding.query_string(),
        }
    }

    /// Final call; a source leaves the registry here.
    pub fn teardown(mut self) {
        self.teardown_source();
    }

    pub fn field(&self) -> FieldKind {
        self.field
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_source(&self) -> bool {
        matches!(self.role, Role::Source(_))
    }

    fn teardown_source(&mut self) {
        if let Role::Source(source) = &self.role {
            source.teardown();
        }
    }
}

fn parent_name<A: MeasureApi>(api: &A) -> String {
    api.read_string(OPTION_PARENT_NAME, "")
}

fn new_role(parent: &str, context: &HostContext) -> Role {
    if parent.is_empty() {
        Role::Source(ValueSource::new(Arc::clone(&context.registry)))
    } else {
        Role::Consumer(ConsumerBinding::new())
    }
}

fn report<A: MeasureApi>(api: &A, err: &ConfigurationError) {
    tracing::warn!(
        measure = %api.measure_name(),
        scope = %api.scope(),
        error = %err,
        "invalid measure configuration"
    );
    api.log(Severity::Error, &err.to_string());
}
