//! Metadata describing one candidate media item.
//!
//! A [`ModuleInfo`] is what the file source hands to the playback loop together
//! with an open [`FileHandle`](crate::filehandle::FileHandle). The type tag is
//! the key used to look up a player interface; everything else is display data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of a play-list entry. Used to purge entries that cannot be played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryId(pub u32);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Short type tag such as `AY`, `MPx` or `DRO`. An empty tag means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleType(String);

impl ModuleType {
    pub fn new(tag: &str) -> Self {
        Self(tag.trim().to_string())
    }

    pub fn unknown() -> Self {
        Self(String::new())
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("?")
        } else {
            f.write_str(&self.0)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleInfo {
    pub entry: EntryId,
    pub mod_type: ModuleType,
    /// File name as shown in the selector (no directory part).
    pub name: String,
    pub title: String,
    pub composer: String,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playtime: Option<Duration>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, mod_type: ModuleType) -> Self {
        Self {
            name: name.into(),
            mod_type,
            ..Default::default()
        }
    }

    /// Title if the header had one, otherwise the file name.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}
