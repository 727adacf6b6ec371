//! AdLib/OPL register dumps and trackers: DOSBox raw OPL (DRO), Reality
//! AdLib Tracker (RAD) and id Software music format (IMF/WLF).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::Path;
use std::time::{Duration, Instant};

use super::fade::{PAUSE_KEYS, Transport};
use super::{KeyOutcome, Player, PlayerSettings, PlayerStatus};
use crate::error::PlayerError;
use crate::filehandle::FileHandle;
use crate::module_info::ModuleInfo;

pub const DRO_MAGIC: &[u8; 8] = b"DBRAWOPL";
pub const RAD_MAGIC: &[u8; 16] = b"RAD by REALiTY!!";

/// OPL files are never loaded past this size, whatever the configured limit.
pub const OPL_FILE_LIMIT: u64 = 16 * 1024 * 1024;

const IMF_RATE: u64 = 560;
const WLF_RATE: u64 = 700;

const KEYS: &[(&str, &str)] = &[
    ("<", "Jump to previous song"),
    (">", "Jump to next song"),
    ("Ctrl-Home", "Restart song"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OplFormat {
    Dro { major: u16, minor: u16 },
    Rad { version: u8 },
    Imf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OplTune {
    pub format: OplFormat,
    pub length: Option<Duration>,
    pub songs: u32,
}

fn le_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn le_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn parse_dro(data: &[u8]) -> Result<OplTune, PlayerError> {
    let truncated = || PlayerError::BadFormat("truncated DRO header".to_string());
    let major = le_u16(data, 8).ok_or_else(truncated)?;
    let minor = le_u16(data, 10).ok_or_else(truncated)?;
    let length_ms = match (major, minor) {
        (2, _) => le_u32(data, 16).ok_or_else(truncated)?,
        (0, 1) | (1, 0) => le_u32(data, 12).ok_or_else(truncated)?,
        _ => {
            return Err(PlayerError::BadFormat(format!(
                "unsupported DRO version {major}.{minor}"
            )));
        }
    };
    Ok(OplTune {
        format: OplFormat::Dro { major, minor },
        length: (length_ms > 0).then(|| Duration::from_millis(u64::from(length_ms))),
        songs: 1,
    })
}

/// Sum the delay words of an IMF command stream. Type-1 files start with the
/// byte length of the stream; type-0 files are commands to the end.
fn imf_length(data: &[u8], rate: u64) -> Option<Duration> {
    let (start, end) = match le_u16(data, 0)? {
        0 => (0, data.len()),
        len => (2, (2 + len as usize).min(data.len())),
    };
    let ticks: u64 = data[start..end]
        .chunks_exact(4)
        .map(|command| u64::from(u16::from_le_bytes([command[2], command[3]])))
        .sum();
    (ticks > 0).then(|| Duration::from_millis(ticks * 1000 / rate))
}

impl OplTune {
    /// Identify the format by signature, falling back to the file extension
    /// for the headerless IMF family.
    pub fn parse(name: &str, data: &[u8]) -> Result<Self, PlayerError> {
        if data.is_empty() {
            return Err(PlayerError::Empty);
        }
        if data.starts_with(DRO_MAGIC) {
            return parse_dro(data);
        }
        if data.starts_with(RAD_MAGIC) {
            return Ok(Self {
                format: OplFormat::Rad {
                    version: data.get(RAD_MAGIC.len()).copied().unwrap_or(0),
                },
                length: None,
                songs: 1,
            });
        }

        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let rate = match ext.as_deref() {
            Some("imf") => IMF_RATE,
            Some("wlf") => WLF_RATE,
            _ => return Err(PlayerError::BadFormat(format!("{name}: unknown OPL format"))),
        };
        Ok(Self {
            format: OplFormat::Imf,
            length: imf_length(data, rate),
            songs: 1,
        })
    }
}

struct Loaded {
    tune: OplTune,
    /// One-based.
    song: u32,
    transport: Transport,
}

pub struct OplPlayer {
    settings: PlayerSettings,
    loaded: Option<Loaded>,
}

impl OplPlayer {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            loaded: None,
        }
    }

    fn length(&self, loaded: &Loaded) -> Duration {
        loaded.tune.length.unwrap_or(self.settings.default_song)
    }
}

impl Player for OplPlayer {
    fn name(&self) -> &'static str {
        "OPL"
    }

    fn open(&mut self, info: &ModuleInfo, file: &FileHandle, now: Instant) -> Result<(), PlayerError> {
        let limit = self.settings.max_file_size.min(OPL_FILE_LIMIT);
        let data = file.read_limited(limit)?;
        let tune = OplTune::parse(&info.name, &data)?;
        log::info!("OPL: {} loaded as {:?}", info.name, tune.format);
        self.loaded = Some(Loaded {
            tune,
            song: 1,
            transport: Transport::new(now),
        });
        Ok(())
    }

    fn close(&mut self) {
        self.loaded = None;
    }

    fn idle(&mut self, now: Instant) -> bool {
        let Some(length) = self.loaded.as_ref().map(|loaded| self.length(loaded)) else {
            return false;
        };
        let loop_modules = self.settings.loop_modules;
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };

        loaded.transport.update(now);
        if loaded.transport.is_paused() || loaded.transport.play_time(now) < length {
            return false;
        }
        if loop_modules {
            loaded.transport.restart(now);
            return false;
        }
        true
    }

    fn process_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        let Some(loaded) = self.loaded.as_mut() else {
            return KeyOutcome::Unhandled;
        };
        if loaded.transport.process_key(key, now) == KeyOutcome::Handled {
            return KeyOutcome::Handled;
        }

        let target = match key.code {
            KeyCode::Char('<') => loaded.song.saturating_sub(1),
            KeyCode::Char('>') => loaded.song + 1,
            KeyCode::Home if key.modifiers.contains(KeyModifiers::CONTROL) => loaded.song,
            _ => return KeyOutcome::Unhandled,
        };
        if (1..=loaded.tune.songs).contains(&target) {
            loaded.song = target;
            loaded.transport.restart(now);
        }
        KeyOutcome::Handled
    }

    fn status(&self, now: Instant) -> PlayerStatus {
        let Some(loaded) = self.loaded.as_ref() else {
            return PlayerStatus::default();
        };
        PlayerStatus {
            paused: loaded.transport.is_paused(),
            fade_level: loaded.transport.level(),
            play_time: loaded.transport.play_time(now),
            length: Some(self.length(loaded)),
            song: Some((loaded.song, loaded.tune.songs)),
            song_name: String::new(),
            stream: None,
        }
    }

    fn key_help(&self) -> Vec<(&'static str, &'static str)> {
        PAUSE_KEYS.iter().chain(KEYS).copied().collect()
    }
}
