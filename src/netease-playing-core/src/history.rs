//! Typed view of the Netease client's playback history file.
//!
//! The file is a JSON array ordered most-recent-first. Only the root is
//! strict: it must be an array. The first element is the only one decoded,
//! the rest are skipped unread. A first element that is not an object counts
//! as "no track", and anything nested inside it is decoded leniently, so a
//! malformed field shows up as a default at query time instead of failing
//! the whole read.

use serde::de::{DeserializeOwned, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed history file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// The most recent play plus the number of plays the file listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRecord {
    latest: Option<HistoryEntry>,
    len: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub track: Option<Track>,
    /// Playback start, epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Track {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub duration: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub artists: Option<Vec<Artist>>,
    #[serde(default, deserialize_with = "lenient")]
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Artist {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Album {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

impl HistoryRecord {
    /// Reads and parses the whole file. The client may be mid-write, so
    /// callers should expect transient failures here.
    pub fn load(path: &Path) -> HistoryResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| HistoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents).map_err(|source| HistoryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
        serde_json::from_str(contents)
    }

    /// The most recent play, if any.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.latest.as_ref()
    }

    /// Number of plays in the file, including ones that were skipped.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn latest_track(&self) -> Option<&Track> {
        self.latest()?.track.as_ref()
    }

    pub fn track_name(&self) -> Option<&str> {
        self.latest_track()?.name.as_deref()
    }

    /// First listed artist only; the list is never joined.
    pub fn first_artist(&self) -> Option<&str> {
        self.latest_track()?.artists.as_ref()?.first()?.name.as_deref()
    }

    pub fn album_name(&self) -> Option<&str> {
        self.latest_track()?.album.as_ref()?.name.as_deref()
    }

    pub fn duration_ms(&self) -> i64 {
        self.latest_track().map(|track| track.duration).unwrap_or(0)
    }

    pub fn started_at_ms(&self) -> i64 {
        self.latest().map(|entry| entry.time).unwrap_or(0)
    }

    /// Milliseconds between the latest play's start and `now_ms`.
    ///
    /// A missing or malformed start time counts as 0, so the result is then
    /// `now_ms` itself.
    pub fn played_ms_at(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.started_at_ms())
    }
}

impl<'de> Deserialize<'de> for HistoryRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = HistoryRecord;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an array of plays, most recent first")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let Some(first) = seq.next_element::<Value>()? else {
            return Ok(HistoryRecord::default());
        };
        let mut len = 1;
        while seq.next_element::<IgnoredAny>()?.is_some() {
            len += 1;
        }

        let latest = match first {
            Value::Object(_) => serde_json::from_value(first).ok(),
            _ => None,
        };
        Ok(HistoryRecord { latest, len })
    }
}

/// Current UTC time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_i64().unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"[{"track":{"name":"Song A","duration":"210000","artists":[{"name":"Artist X"}],"album":{"name":"Album Y"}},"time":"1700000000000"}]"#;

    #[test]
    fn parses_sample_entry() {
        let record = HistoryRecord::from_json_str(SAMPLE).unwrap();
        assert_eq!(record.track_name(), Some("Song A"));
        assert_eq!(record.first_artist(), Some("Artist X"));
        assert_eq!(record.album_name(), Some("Album Y"));
        assert_eq!(record.duration_ms(), 210_000);
        assert_eq!(record.started_at_ms(), 1_700_000_000_000);
        assert_eq!(record.played_ms_at(1_700_000_005_000), 5_000);
    }

    #[test]
    fn only_latest_entry_is_consulted() {
        let record = HistoryRecord::from_json_str(
            r#"[
                {"track":{"name":"Newest","duration":1000,"artists":[{"name":"First"},{"name":"Second"}]},"time":5},
                {"track":{"name":"Older","duration":2000},"time":1}
            ]"#,
        )
        .unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.track_name(), Some("Newest"));
        assert_eq!(record.first_artist(), Some("First"));
        assert_eq!(record.duration_ms(), 1000);
        assert_eq!(record.started_at_ms(), 5);
    }

    #[test]
    fn numeric_fields_default_to_zero() {
        let record = HistoryRecord::from_json_str(
            r#"[{"track":{"name":"x","duration":"12.5s"},"time":{"nested":true}}]"#,
        )
        .unwrap();
        assert_eq!(record.duration_ms(), 0);
        assert_eq!(record.started_at_ms(), 0);
        assert_eq!(record.played_ms_at(42), 42);
    }

    #[test]
    fn whitespace_around_numeric_strings_is_tolerated() {
        let record =
            HistoryRecord::from_json_str(r#"[{"track":{"duration":" 300 "},"time":"  7 "}]"#)
                .unwrap();
        assert_eq!(record.duration_ms(), 300);
        assert_eq!(record.started_at_ms(), 7);
    }

    #[test]
    fn missing_nested_fields_are_absent() {
        let record = HistoryRecord::from_json_str(
            r#"[{"track":{"name":"Lonely","artists":[],"album":"not an object"}}]"#,
        )
        .unwrap();
        assert_eq!(record.track_name(), Some("Lonely"));
        assert_eq!(record.first_artist(), None);
        assert_eq!(record.album_name(), None);

        let record = HistoryRecord::from_json_str(r#"[{"time":1}]"#).unwrap();
        assert_eq!(record.track_name(), None);
        assert_eq!(record.duration_ms(), 0);
    }

    #[test]
    fn scalar_names_render_as_text() {
        let record = HistoryRecord::from_json_str(
            r#"[{"track":{"name":1999,"artists":[{"name":true}],"album":{"name":null}}}]"#,
        )
        .unwrap();
        assert_eq!(record.track_name(), Some("1999"));
        assert_eq!(record.first_artist(), Some("true"));
        assert_eq!(record.album_name(), None);
    }

    #[test]
    fn empty_array_has_no_latest() {
        let record = HistoryRecord::from_json_str("[]").unwrap();
        assert!(record.is_empty());
        assert!(record.latest().is_none());
        assert_eq!(record.track_name(), None);
        assert_eq!(record.duration_ms(), 0);
    }

    #[test]
    fn root_must_be_an_array() {
        assert!(HistoryRecord::from_json_str(r#"{"track":{}}"#).is_err());
        assert!(HistoryRecord::from_json_str("\"history\"").is_err());
        assert!(HistoryRecord::from_json_str("").is_err());
        assert!(HistoryRecord::from_json_str(r#"[{"track":{"name":"cut"#).is_err());
        assert!(HistoryRecord::from_json_str(r#"[{"track":{}}, {"#).is_err());
    }

    #[test]
    fn later_entries_of_any_shape_are_skipped() {
        for tail in ["null", "\"garbage\"", "[1, {\"x\": []}]", "42"] {
            let contents = format!(r#"[{{"track":{{"name":"Song A","duration":5}}}}, {tail}]"#);
            let record = HistoryRecord::from_json_str(&contents).unwrap();
            assert_eq!(record.len(), 2, "{tail}");
            assert_eq!(record.track_name(), Some("Song A"), "{tail}");
            assert_eq!(record.duration_ms(), 5, "{tail}");
        }
    }

    #[test]
    fn non_object_first_entry_means_no_track() {
        for first in ["null", "1", "\"text\"", "[]"] {
            let contents = format!(r#"[{first}, {{"track":{{"name":"Older"}}}}]"#);
            let record = HistoryRecord::from_json_str(&contents).unwrap();
            assert_eq!(record.len(), 2, "{first}");
            assert!(record.latest().is_none(), "{first}");
            assert_eq!(record.track_name(), None, "{first}");
            assert_eq!(record.duration_ms(), 0, "{first}");
            assert_eq!(record.played_ms_at(10), 10, "{first}");
        }
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let with_bom = format!("\u{feff}{SAMPLE}");
        let record = HistoryRecord::from_json_str(&with_bom).unwrap();
        assert_eq!(record.track_name(), Some("Song A"));
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("history");
        match HistoryRecord::load(&missing) {
            Err(HistoryError::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected read error, got {other:?}"),
        }

        fs::write(&missing, "{ not json").unwrap();
        assert!(matches!(
            HistoryRecord::load(&missing),
            Err(HistoryError::Parse { .. })
        ));

        fs::write(&missing, SAMPLE).unwrap();
        let record = HistoryRecord::load(&missing).unwrap();
        assert_eq!(record.album_name(), Some("Album Y"));
    }

    #[test]
    fn now_is_after_2023() {
        assert!(now_epoch_ms() > 1_700_000_000_000);
    }
}
