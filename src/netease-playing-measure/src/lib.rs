//! Parent/child measures over the Netease Cloud Music playback history.
//!
//! A host creates one [`Measure`] per configured block:
//! - blocks without `ParentName` become sources: they own the history file
//!   path, re-read it on every update and keep the last good record
//! - blocks with `ParentName` become consumers: on each reload they look up
//!   the named source in the same scope and forward queries to it
//!
//! Sources are found through an [`InstanceRegistry`] owned by the host
//! adapter ([`PluginHost`]) rather than a process global.
//!
//! # Usage
//!
//! ```rust,no_run
//! use netease_playing_core::ScopeHandle;
//! use netease_playing_measure::{MeasureOptions, PluginHost};
//!
//! let scope = ScopeHandle::new(1);
//! let parent = MeasureOptions::new(scope, "Playing").with("Type", "name");
//! let artist = MeasureOptions::new(scope, "Artist")
//!     .with("Type", "artists")
//!     .with("ParentName", "Playing");
//!
//! let mut host = PluginHost::new();
//! let parent_id = host.initialize(&parent);
//! host.reload(parent_id, &parent);
//! let artist_id = host.initialize(&artist);
//! host.reload(artist_id, &artist);
//!
//! host.update(parent_id);
//! println!("{:?}", host.get_string(artist_id));
//! ```

mod api;
mod consumer;
mod error;
mod measure;
mod plugin;
mod registry;
mod source;
#[cfg(test)]
mod test_log;

pub use api::{
    MeasureApi, MeasureOptions, OPTION_HISTORY_JSON_PATH, OPTION_PARENT_NAME, OPTION_TYPE,
};
pub use consumer::ConsumerBinding;
pub use error::ConfigurationError;
pub use measure::{HostContext, Measure, Role};
pub use plugin::{MeasureId, PluginHost, StringBuffer};
pub use registry::InstanceRegistry;
pub use source::{SourceIdentity, ValueSource};
