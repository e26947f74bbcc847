use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of values a measure can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldKind {
    #[default]
    Name,
    Artists,
    Album,
    Duration,
    PlayedTime,
    Lyric,
    IsLyricTranslated,
    TranslatedLyric,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Type={value} not valid")]
pub struct FieldKindError {
    pub value: String,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Name,
        FieldKind::Artists,
        FieldKind::Album,
        FieldKind::Duration,
        FieldKind::PlayedTime,
        FieldKind::Lyric,
        FieldKind::IsLyricTranslated,
        FieldKind::TranslatedLyric,
    ];

    /// Lowercase spelling accepted for the `Type` option.
    pub fn config_name(&self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::Artists => "artists",
            FieldKind::Album => "album",
            FieldKind::Duration => "duration",
            FieldKind::PlayedTime => "playedtime",
            FieldKind::Lyric => "lyric",
            FieldKind::IsLyricTranslated => "islyrictranslated",
            FieldKind::TranslatedLyric => "translatedlyric",
        }
    }

    /// Whether `update` yields a meaningful number for this kind.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Duration | FieldKind::PlayedTime)
    }

    /// Lyric kinds are reserved; they answer with an empty string.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            FieldKind::Lyric | FieldKind::IsLyricTranslated | FieldKind::TranslatedLyric
        )
    }
}

impl FromStr for FieldKind {
    type Err = FieldKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.config_name() == lowered)
            .ok_or_else(|| FieldKindError {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}
