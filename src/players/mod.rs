//! Format players hosted by the console interface.
//!
//! A player owns the decoded state of one tune and its play clock. It does not
//! produce audio itself; it tracks position, subsongs and pause state, and
//! reports when the tune has ended.

pub mod ay;
pub mod fade;
pub mod mpeg;
pub mod names;
pub mod opl;

pub use fade::{Fade, Transport};
pub use names::short_name;

use crossterm::event::KeyEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::PlayerError;
use crate::filehandle::FileHandle;
use crate::module_info::ModuleInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Ay,
    Mpeg,
    Opl,
}

impl PlayerKind {
    pub fn create(self, settings: &PlayerSettings) -> Box<dyn Player> {
        match self {
            PlayerKind::Ay => Box::new(ay::AyPlayer::new(*settings)),
            PlayerKind::Mpeg => Box::new(mpeg::MpegPlayer::new(*settings)),
            PlayerKind::Opl => Box::new(opl::OplPlayer::new(*settings)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerKind::Ay => "ay",
            PlayerKind::Mpeg => "mpeg",
            PlayerKind::Opl => "opl",
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSettings {
    pub loop_modules: bool,
    /// Length assumed for tunes that do not carry one.
    pub default_song: Duration,
    pub max_file_size: u64,
}

impl PlayerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            loop_modules: config.loop_modules,
            default_song: Duration::from_secs(config.default_song_secs),
            max_file_size: config.max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Unhandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPosition {
    pub pos: u64,
    pub len: u64,
    pub kbps: u32,
}

/// Everything the status screen shows about the running tune.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatus {
    pub paused: bool,
    pub fade_level: u8,
    pub play_time: Duration,
    pub length: Option<Duration>,
    /// (current, count), one-based.
    pub song: Option<(u32, u32)>,
    pub song_name: String,
    pub stream: Option<StreamPosition>,
}

pub trait Player {
    fn name(&self) -> &'static str;

    fn open(&mut self, info: &ModuleInfo, file: &FileHandle, now: Instant) -> Result<(), PlayerError>;

    fn close(&mut self);

    /// Advance one slice. Returns true once the tune has ended; never while
    /// looping is enabled or the player is paused.
    fn idle(&mut self, now: Instant) -> bool;

    fn process_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome;

    fn status(&self, now: Instant) -> PlayerStatus;

    fn key_help(&self) -> Vec<(&'static str, &'static str)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_kind_serde_names() {
        let kind: PlayerKind = serde_json::from_str("\"opl\"").unwrap();
        assert_eq!(kind, PlayerKind::Opl);
        assert_eq!(serde_json::to_string(&PlayerKind::Mpeg).unwrap(), "\"mpeg\"");
        assert_eq!(PlayerKind::Ay.to_string(), "ay");
    }

    #[test]
    fn test_create_matches_kind() {
        let settings = PlayerSettings {
            loop_modules: false,
            default_song: Duration::from_secs(1),
            max_file_size: 1024,
        };
        assert_eq!(PlayerKind::Ay.create(&settings).name(), "AY");
        assert_eq!(PlayerKind::Mpeg.create(&settings).name(), "MPEG");
        assert_eq!(PlayerKind::Opl.create(&settings).name(), "OPL");
    }
}
