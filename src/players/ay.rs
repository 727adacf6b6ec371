//! ZX Spectrum AY (`ZXAYEMUL`) tunes.
//!
//! Header pointers are signed big-endian 16-bit offsets relative to the
//! pointer's own position. Song lengths are stored in 1/50 s ticks; zero means
//! "unknown" and falls back to the configured default length.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use super::fade::{PAUSE_KEYS, Transport};
use super::{KeyOutcome, Player, PlayerSettings, PlayerStatus};
use crate::error::PlayerError;
use crate::filehandle::FileHandle;
use crate::module_info::ModuleInfo;

pub const MAGIC: &[u8; 8] = b"ZXAYEMUL";

const OFF_AUTHOR: usize = 12;
const OFF_MISC: usize = 14;
const OFF_NUM_SONGS: usize = 16;
const OFF_FIRST_SONG: usize = 17;
const OFF_SONGS: usize = 18;
const TICKS_PER_SECOND: u64 = 50;

const KEYS: &[(&str, &str)] = &[
    ("<", "Jump to previous track"),
    ("Ctrl-Left", "Jump to previous track"),
    (">", "Jump to next track"),
    ("Ctrl-Right", "Jump to next track"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct AySong {
    pub name: String,
    pub length: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AyHeader {
    pub author: String,
    pub misc: String,
    /// Zero-based index of the song to start with.
    pub first_song: usize,
    pub songs: Vec<AySong>,
}

fn be_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Follow the self-relative pointer stored at `offset`.
fn follow(data: &[u8], offset: usize) -> Option<usize> {
    let relative = be_u16(data, offset)? as i16;
    let target = offset as isize + relative as isize;
    if target < 0 || target as usize >= data.len() {
        return None;
    }
    Some(target as usize)
}

fn c_string(data: &[u8], offset: Option<usize>) -> String {
    let Some(start) = offset else {
        return String::new();
    };
    let tail = &data[start..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).trim().to_string()
}

impl AyHeader {
    pub fn parse(data: &[u8]) -> Result<Self, PlayerError> {
        if data.is_empty() {
            return Err(PlayerError::Empty);
        }
        if !data.starts_with(MAGIC) || data.len() <= OFF_SONGS + 1 {
            return Err(PlayerError::BadFormat("not a ZXAYEMUL file".to_string()));
        }

        let count = data[OFF_NUM_SONGS] as usize + 1;
        let first_song = (data[OFF_FIRST_SONG] as usize).min(count - 1);
        let table = follow(data, OFF_SONGS)
            .ok_or_else(|| PlayerError::BadFormat("song table outside file".to_string()))?;

        let mut songs = Vec::with_capacity(count);
        for index in 0..count {
            let entry = table + index * 4;
            if entry + 4 > data.len() {
                return Err(PlayerError::BadFormat(format!("song {} truncated", index + 1)));
            }
            let name = c_string(data, follow(data, entry));
            let length = follow(data, entry + 2)
                .and_then(|song_data| be_u16(data, song_data + 4))
                .filter(|&ticks| ticks > 0)
                .map(|ticks| Duration::from_millis(u64::from(ticks) * 1000 / TICKS_PER_SECOND));
            songs.push(AySong { name, length });
        }

        Ok(Self {
            author: c_string(data, follow(data, OFF_AUTHOR)),
            misc: c_string(data, follow(data, OFF_MISC)),
            first_song,
            songs,
        })
    }
}

struct Loaded {
    header: AyHeader,
    /// One-based current song.
    track: usize,
    transport: Transport,
}

pub struct AyPlayer {
    settings: PlayerSettings,
    loaded: Option<Loaded>,
}

impl Loaded {
    fn song(&self) -> &AySong {
        &self.header.songs[self.track - 1]
    }

    fn length(&self, default_song: Duration) -> Duration {
        self.song().length.unwrap_or(default_song)
    }
}

impl AyPlayer {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            loaded: None,
        }
    }
}

impl Player for AyPlayer {
    fn name(&self) -> &'static str {
        "AY"
    }

    fn open(&mut self, info: &ModuleInfo, file: &FileHandle, now: Instant) -> Result<(), PlayerError> {
        let data = file.read_limited(self.settings.max_file_size)?;
        let header = AyHeader::parse(&data)?;
        log::info!(
            "AY: {} has {} song(s), starting at {}",
            info.name,
            header.songs.len(),
            header.first_song + 1
        );
        self.loaded = Some(Loaded {
            track: header.first_song + 1,
            header,
            transport: Transport::new(now),
        });
        Ok(())
    }

    fn close(&mut self) {
        self.loaded = None;
    }

    fn idle(&mut self, now: Instant) -> bool {
        let default_song = self.settings.default_song;
        let loop_modules = self.settings.loop_modules;
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };

        loaded.transport.update(now);
        if loaded.transport.is_paused() || loaded.transport.play_time(now) < loaded.length(default_song) {
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

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let target = match key.code {
            KeyCode::Char('<') => loaded.track - 1,
            KeyCode::Left if ctrl => loaded.track - 1,
            KeyCode::Char('>') => loaded.track + 1,
            KeyCode::Right if ctrl => loaded.track + 1,
            _ => return KeyOutcome::Unhandled,
        };
        if (1..=loaded.header.songs.len()).contains(&target) {
            loaded.track = target;
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
            length: Some(loaded.length(self.settings.default_song)),
            song: Some((loaded.track as u32, loaded.header.songs.len() as u32)),
            song_name: loaded.song().name.clone(),
            stream: None,
        }
    }

    fn key_help(&self) -> Vec<(&'static str, &'static str)> {
        PAUSE_KEYS.iter().chain(KEYS).copied().collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::module_info::{EntryId, ModuleType};

    fn push_ptr(buf: &mut [u8], at: usize, target: usize) {
        let relative = (target as isize - at as isize) as i16;
        buf[at..at + 2].copy_from_slice(&relative.to_be_bytes());
    }

    /// Build a minimal AY image with the given (name, ticks) songs.
    pub(crate) fn build_ay(author: &str, songs: &[(&str, u16)]) -> Vec<u8> {
        let mut buf = vec![0u8; 20];
        buf[..8].copy_from_slice(MAGIC);
        buf[OFF_NUM_SONGS] = (songs.len() - 1) as u8;
        buf[OFF_FIRST_SONG] = 0;

        let author_at = buf.len();
        buf.extend_from_slice(author.as_bytes());
        buf.push(0);
        push_ptr(&mut buf, OFF_AUTHOR, author_at);
        push_ptr(&mut buf, OFF_MISC, author_at);

        let table = buf.len();
        buf.resize(table + songs.len() * 4, 0);
        push_ptr(&mut buf, OFF_SONGS, table);

        for (index, (name, ticks)) in songs.iter().enumerate() {
            let name_at = buf.len();
            buf.extend_from_slice(name.as_bytes());
            buf.push(0);
            let data_at = buf.len();
            buf.extend_from_slice(&[0, 1, 2, 3]);
            buf.extend_from_slice(&ticks.to_be_bytes());
            buf.extend_from_slice(&[0, 0]);
            push_ptr(&mut buf, table + index * 4, name_at);
            push_ptr(&mut buf, table + index * 4 + 2, data_at);
        }
        buf
    }

    fn settings() -> PlayerSettings {
        PlayerSettings {
            loop_modules: false,
            default_song: Duration::from_secs(180),
            max_file_size: 1 << 20,
        }
    }

    fn open(data: Vec<u8>, now: Instant) -> AyPlayer {
        let mut player = AyPlayer::new(settings());
        let file = FileHandle::from_bytes(EntryId(0), "tune.ay", data);
        let info = ModuleInfo::new("tune.ay", ModuleType::new("AY"));
        player.open(&info, &file, now).unwrap();
        player
    }

    #[test]
    fn test_parse_header() {
        let data = build_ay("Tim Follin", &[("Intro", 100), ("Main", 0)]);
        let header = AyHeader::parse(&data).unwrap();

        assert_eq!(header.author, "Tim Follin");
        assert_eq!(header.songs.len(), 2);
        assert_eq!(header.songs[0].name, "Intro");
        assert_eq!(header.songs[0].length, Some(Duration::from_secs(2)));
        assert_eq!(header.songs[1].length, None);
    }

    #[test]
    fn test_parse_rejects_other_files() {
        assert!(matches!(AyHeader::parse(b""), Err(PlayerError::Empty)));
        assert!(matches!(
            AyHeader::parse(b"RIFF0000WAVEfmt 0000000000"),
            Err(PlayerError::BadFormat(_))
        ));
    }

    #[test]
    fn test_subsong_keys_stay_in_range() {
        let t0 = Instant::now();
        let mut player = open(build_ay("x", &[("a", 50), ("b", 50), ("c", 50)]), t0);
        let next = KeyEvent::new(KeyCode::Char('>'), KeyModifiers::NONE);
        let prev = KeyEvent::new(KeyCode::Left, KeyModifiers::CONTROL);

        assert_eq!(player.process_key(prev, t0), KeyOutcome::Handled);
        assert_eq!(player.status(t0).song, Some((1, 3)));

        player.process_key(next, t0);
        player.process_key(next, t0);
        player.process_key(next, t0);
        let status = player.status(t0);
        assert_eq!(status.song, Some((3, 3)));
        assert_eq!(status.song_name, "c");
    }

    #[test]
    fn test_idle_reports_end_of_song() {
        let t0 = Instant::now();
        let mut player = open(build_ay("x", &[("a", 50)]), t0);

        assert!(!player.idle(t0 + Duration::from_millis(500)));
        assert!(player.idle(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn test_idle_loops_when_configured() {
        let t0 = Instant::now();
        let mut player = AyPlayer::new(PlayerSettings {
            loop_modules: true,
            ..settings()
        });
        let file = FileHandle::from_bytes(EntryId(0), "tune.ay", build_ay("x", &[("a", 50)]));
        player
            .open(&ModuleInfo::new("tune.ay", ModuleType::new("AY")), &file, t0)
            .unwrap();

        assert!(!player.idle(t0 + Duration::from_secs(1)));
        assert_eq!(player.status(t0 + Duration::from_secs(1)).play_time, Duration::ZERO);
    }
}
