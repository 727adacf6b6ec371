//! MPEG audio streams (Layer I/II/III, MPEG-1/2/2.5).
//!
//! Only the head of the file is read. Frames inside it are walked to find the
//! average bitrate, and the duration of a longer stream is extrapolated from
//! the file size. The play position is a byte offset that advances with play
//! time at that byte rate.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use super::fade::{PAUSE_KEYS, Transport};
use super::{KeyOutcome, Player, PlayerSettings, PlayerStatus, StreamPosition};
use crate::error::PlayerError;
use crate::filehandle::FileHandle;
use crate::module_info::ModuleInfo;

/// How far past the ID3 tag a first frame is searched for.
const SYNC_SEARCH: usize = 64 * 1024;
/// Audio read past the ID3 tag to measure the bitrate.
const SCAN_HEAD: usize = 256 * 1024;

const KEYS: &[(&str, &str)] = &[
    ("<", "Jump back (big)"),
    ("Ctrl-Left", "Jump back (big)"),
    (">", "Jump forward (big)"),
    ("Ctrl-Right", "Jump forward (big)"),
    ("Ctrl-Up", "Jump back (small)"),
    ("Ctrl-Down", "Jump forward (small)"),
    ("Ctrl-Home", "Jump to start of track"),
];

#[rustfmt::skip]
const BITRATES_V1: [[u32; 15]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];

#[rustfmt::skip]
const BITRATES_V2: [[u32; 15]; 3] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: u8,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
}

impl FrameHeader {
    /// Decode the four header bytes at the start of `bytes`. Free-format and
    /// reserved values are rejected.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let &[b0, b1, b2, _] = bytes.get(..4)? else {
            return None;
        };
        if b0 != 0xFF || b1 & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (b1 >> 3) & 0x03 {
            0 => MpegVersion::V25,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (b1 >> 1) & 0x03 {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return None,
        };

        let bitrate_index = (b2 >> 4) as usize;
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let table = match version {
            MpegVersion::V1 => &BITRATES_V1,
            MpegVersion::V2 | MpegVersion::V25 => &BITRATES_V2,
        };
        let bitrate_kbps = table[layer as usize - 1][bitrate_index];

        let base_rate = match (b2 >> 2) & 0x03 {
            0 => 44100,
            1 => 48000,
            2 => 32000,
            _ => return None,
        };
        let sample_rate = match version {
            MpegVersion::V1 => base_rate,
            MpegVersion::V2 => base_rate / 2,
            MpegVersion::V25 => base_rate / 4,
        };

        Some(Self {
            version,
            layer,
            bitrate_kbps,
            sample_rate,
            padding: (b2 >> 1) & 0x01 == 1,
        })
    }

    pub fn frame_len(&self) -> usize {
        let bitrate = self.bitrate_kbps as usize * 1000;
        let rate = self.sample_rate as usize;
        let pad = usize::from(self.padding);
        match (self.layer, self.version) {
            (1, _) => (12 * bitrate / rate + pad) * 4,
            (2, _) | (3, MpegVersion::V1) => 144 * bitrate / rate + pad,
            _ => 72 * bitrate / rate + pad,
        }
    }

    pub fn samples(&self) -> u32 {
        match (self.layer, self.version) {
            (1, _) => 384,
            (2, _) | (3, MpegVersion::V1) => 1152,
            _ => 576,
        }
    }
}

fn syncsafe(bytes: &[u8]) -> usize {
    bytes.iter().fold(0, |acc, &b| (acc << 7) | (b & 0x7F) as usize)
}

/// Size of a leading ID3v2 tag, header and footer included; 0 if there is none.
pub fn id3v2_len(data: &[u8]) -> usize {
    if data.len() < 10 || !data.starts_with(b"ID3") {
        return 0;
    }
    let footer = if data[5] & 0x10 != 0 { 10 } else { 0 };
    10 + syncsafe(&data[6..10]) + footer
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Id3Tags {
    pub title: Option<String>,
    pub artist: Option<String>,
}

fn decode_text(frame: &[u8]) -> Option<String> {
    let (&encoding, text) = frame.split_first()?;
    let decoded = match encoding {
        0 => text.iter().map(|&b| b as char).collect(),
        1 | 2 => {
            let (big_endian, body) = match text {
                [0xFE, 0xFF, rest @ ..] => (true, rest),
                [0xFF, 0xFE, rest @ ..] => (false, rest),
                _ => (encoding == 2, text),
            };
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|c| {
                    if big_endian {
                        u16::from_be_bytes([c[0], c[1]])
                    } else {
                        u16::from_le_bytes([c[0], c[1]])
                    }
                })
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(text).into_owned(),
    };
    let trimmed = decoded.trim_end_matches('\0').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Pull title and artist out of an ID3v2.3/2.4 tag.
pub fn read_id3v2(data: &[u8]) -> Id3Tags {
    let mut tags = Id3Tags::default();
    let end = id3v2_len(data).min(data.len());
    if end == 0 || !matches!(data[3], 3 | 4) {
        return tags;
    }
    let syncsafe_sizes = data[3] == 4;

    let mut pos = 10;
    while pos + 10 <= end {
        let id = &data[pos..pos + 4];
        if id[0] == 0 {
            break;
        }
        let size_bytes = &data[pos + 4..pos + 8];
        let size = if syncsafe_sizes {
            syncsafe(size_bytes)
        } else {
            u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]]) as usize
        };
        let body_start = pos + 10;
        let body_end = (body_start + size).min(end);
        let body = &data[body_start..body_end];
        match id {
            b"TIT2" => tags.title = decode_text(body),
            b"TPE1" => tags.artist = decode_text(body),
            _ => {}
        }
        pos = body_start + size;
    }
    tags
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub first_frame: usize,
    /// Whole file length in bytes.
    pub len: u64,
    pub kbps: u32,
    pub sample_rate: u32,
    pub layer: u8,
    pub version: MpegVersion,
    pub frames: u32,
    pub duration: Duration,
}

fn find_first_frame(data: &[u8], from: usize) -> Option<(usize, FrameHeader)> {
    let limit = data.len().min(from.saturating_add(SYNC_SEARCH));
    (from..limit).find_map(|offset| {
        let header = FrameHeader::parse(&data[offset..])?;
        let next = offset + header.frame_len();
        // A second frame right behind the first guards against stray sync bytes.
        if next + 4 <= data.len() && FrameHeader::parse(&data[next..]).is_none() {
            return None;
        }
        Some((offset, header))
    })
}

impl StreamInfo {
    /// Scan a stream held completely in memory.
    pub fn scan(data: &[u8]) -> Result<Self, PlayerError> {
        Self::scan_head(data, data.len() as u64)
    }

    /// Scan the first bytes of a stream that is `len` bytes long. Frames are
    /// only counted while they fit in `head`.
    pub fn scan_head(head: &[u8], len: u64) -> Result<Self, PlayerError> {
        if head.is_empty() || len == 0 {
            return Err(PlayerError::Empty);
        }
        let start = id3v2_len(head).min(head.len());
        let (first_frame, first) = find_first_frame(head, start)
            .ok_or_else(|| PlayerError::BadFormat("no MPEG audio frames found".to_string()))?;

        let mut pos = first_frame;
        let mut frames = 0u64;
        let mut micros = 0u64;
        while let Some(header) = head.get(pos..).and_then(FrameHeader::parse) {
            let frame_len = header.frame_len();
            if frame_len < 4 || pos + frame_len > head.len() {
                break;
            }
            frames += 1;
            micros += u64::from(header.samples()) * 1_000_000 / u64::from(header.sample_rate);
            pos += frame_len;
        }

        let scanned = (pos - first_frame) as u64;
        let audio = len.saturating_sub(first_frame as u64);
        let (kbps, frames, micros) = if scanned == 0 || micros == 0 {
            let kbps = first.bitrate_kbps.max(1);
            (kbps, 1, audio * 8000 / u64::from(kbps))
        } else if audio > scanned && (head.len() as u64) < len {
            // Whatever lies past the head is assumed to keep the same rate.
            let kbps = (scanned * 8000 / micros) as u32;
            (kbps, frames * audio / scanned, micros * audio / scanned)
        } else {
            ((scanned * 8000 / micros) as u32, frames, micros)
        };

        Ok(Self {
            first_frame,
            len,
            kbps,
            sample_rate: first.sample_rate,
            layer: first.layer,
            version: first.version,
            frames: u32::try_from(frames).unwrap_or(u32::MAX),
            duration: Duration::from_micros(micros),
        })
    }

    pub fn byte_rate(&self) -> u64 {
        u64::from(self.kbps) * 1000 / 8
    }
}

struct Loaded {
    stream: StreamInfo,
    transport: Transport,
    base_pos: u64,
    /// Play time at which `base_pos` was set.
    base_time: Duration,
}

impl Loaded {
    fn position(&self, now: Instant) -> u64 {
        let elapsed = self.transport.play_time(now).saturating_sub(self.base_time);
        let advanced = elapsed.as_millis() as u64 * self.stream.byte_rate() / 1000;
        (self.base_pos + advanced).min(self.stream.len)
    }

    fn seek(&mut self, pos: u64, now: Instant) {
        self.base_pos = pos.min(self.stream.len);
        self.base_time = self.transport.play_time(now);
    }
}

pub struct MpegPlayer {
    settings: PlayerSettings,
    loaded: Option<Loaded>,
}

impl MpegPlayer {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            loaded: None,
        }
    }
}

impl Player for MpegPlayer {
    fn name(&self) -> &'static str {
        "MPEG"
    }

    fn open(&mut self, info: &ModuleInfo, file: &FileHandle, now: Instant) -> Result<(), PlayerError> {
        let len = file.size()?;
        let mut head = file.read_head(SYNC_SEARCH + SCAN_HEAD)?;
        let tag_len = id3v2_len(&head);
        if tag_len > SYNC_SEARCH && (head.len() as u64) < len {
            head = file.read_head(tag_len + SYNC_SEARCH + SCAN_HEAD)?;
        }
        let stream = StreamInfo::scan_head(&head, len)?;
        log::info!(
            "MPEG: {} layer {} at {} kbps, {} frames",
            info.name,
            stream.layer,
            stream.kbps,
            stream.frames
        );
        self.loaded = Some(Loaded {
            base_pos: stream.first_frame as u64,
            base_time: Duration::ZERO,
            stream,
            transport: Transport::new(now),
        });
        Ok(())
    }

    fn close(&mut self) {
        self.loaded = None;
    }

    fn idle(&mut self, now: Instant) -> bool {
        let loop_modules = self.settings.loop_modules;
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };

        loaded.transport.update(now);
        if loaded.transport.is_paused() || loaded.position(now) < loaded.stream.len {
            return false;
        }
        if loop_modules {
            loaded.seek(0, now);
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
        let pos = loaded.position(now);
        let len = loaded.stream.len;
        let big = len / 32;
        let small = loaded.stream.byte_rate();

        let target = match key.code {
            KeyCode::Char('<') => pos.saturating_sub(big),
            KeyCode::Left if ctrl => pos.saturating_sub(big),
            KeyCode::Char('>') => forward(pos, big, len),
            KeyCode::Right if ctrl => forward(pos, big, len),
            KeyCode::Up if ctrl => pos.saturating_sub(small),
            KeyCode::Down if ctrl => (pos + small).min(len),
            KeyCode::Home if ctrl => 0,
            _ => return KeyOutcome::Unhandled,
        };
        loaded.seek(target, now);
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
            length: Some(loaded.stream.duration),
            song: None,
            song_name: String::new(),
            stream: Some(StreamPosition {
                pos: loaded.position(now),
                len: loaded.stream.len,
                kbps: loaded.stream.kbps,
            }),
        }
    }

    fn key_help(&self) -> Vec<(&'static str, &'static str)> {
        PAUSE_KEYS.iter().chain(KEYS).copied().collect()
    }
}

/// Big forward jump; past the end lands just before it.
fn forward(pos: u64, step: u64, len: u64) -> u64 {
    let target = pos + step;
    if target > len { len.saturating_sub(4) } else { target }
}
