//! Ordered play-list with a cursor.
//!
//! `pos` points just past the entry handed out last. Going forward takes the
//! entry at `pos` (wrapping to the start); going back steps the cursor back
//! once and hands out the entry before it, so "previous" after "next" replays
//! the entry that came before the current one. With `play_once` set, entries
//! leave the list as they are handed out.

use std::path::{Path, PathBuf};

use crate::console::Console;
use crate::filehandle::FileHandle;
use crate::module_info::{EntryId, ModuleInfo};

use super::{FileSource, SelectorOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub path: PathBuf,
    pub info: ModuleInfo,
}

impl PlaylistEntry {
    pub fn id(&self) -> EntryId {
        self.info.entry
    }
}

#[derive(Debug, Default)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    pos: usize,
    next_id: u32,
    play_once: bool,
}

impl Playlist {
    pub fn new(play_once: bool) -> Self {
        Self {
            play_once,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn new_entry(&mut self, path: &Path, mut info: ModuleInfo) -> PlaylistEntry {
        info.entry = EntryId(self.next_id);
        self.next_id += 1;
        PlaylistEntry {
            path: path.to_path_buf(),
            info,
        }
    }

    /// Append to the end of the list.
    pub fn push(&mut self, path: &Path, info: ModuleInfo) -> EntryId {
        let entry = self.new_entry(path, info);
        let id = entry.id();
        self.entries.push(entry);
        id
    }

    /// Insert at the cursor, so the entry is the next one handed out.
    pub fn insert_next(&mut self, path: &Path, info: ModuleInfo) -> EntryId {
        let entry = self.new_entry(path, info);
        let id = entry.id();
        let at = self.pos.min(self.entries.len());
        self.entries.insert(at, entry);
        id
    }

    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.id() == id) else {
            return false;
        };
        self.entries.remove(index);
        if index < self.pos {
            self.pos -= 1;
        }
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pos = 0;
    }

    fn take(&mut self, pick: usize) -> Option<(ModuleInfo, FileHandle)> {
        let entry = if self.play_once {
            let entry = self.entries.remove(pick);
            if pick < self.pos {
                self.pos -= 1;
            }
            entry
        } else {
            self.entries[pick].clone()
        };

        match FileHandle::open_path(entry.id(), &entry.path) {
            Ok(file) => Some((entry.info, file)),
            Err(e) => {
                log::warn!("Cannot open {}: {e}, dropping it", entry.path.display());
                self.remove(entry.id());
                None
            }
        }
    }
}

impl FileSource for Playlist {
    fn files_left(&self) -> bool {
        !self.entries.is_empty()
    }

    fn next_file(&mut self) -> Option<(ModuleInfo, FileHandle)> {
        if self.entries.is_empty() {
            return None;
        }
        let pick = if self.pos >= self.entries.len() { 0 } else { self.pos };
        self.pos = pick + 1;
        self.take(pick)
    }

    fn prev_file(&mut self) -> Option<(ModuleInfo, FileHandle)> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }
        self.pos = if self.pos > 0 { self.pos - 1 } else { len - 1 };
        let pick = if self.pos > 0 { self.pos - 1 } else { len - 1 };
        self.take(pick)
    }

    fn force_remove(&mut self, entry: EntryId) {
        if self.remove(entry) {
            log::debug!("Removed {entry} from the play-list");
        }
    }

    fn run_interactive_selector(&mut self, _console: &mut dyn Console) -> SelectorOutcome {
        SelectorOutcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_info::ModuleType;
    use std::fs;
    use tempfile::TempDir;

    fn playlist_of(dir: &TempDir, names: &[&str], play_once: bool) -> Playlist {
        let mut playlist = Playlist::new(play_once);
        for name in names {
            let path = dir.path().join(name);
            fs::write(&path, b"data").unwrap();
            playlist.push(&path, ModuleInfo::new(*name, ModuleType::new("AY")));
        }
        playlist
    }

    fn name(fetched: Option<(ModuleInfo, FileHandle)>) -> String {
        fetched.unwrap().0.name
    }

    #[test]
    fn test_next_wraps_around() {
        let dir = TempDir::new().unwrap();
        let mut playlist = playlist_of(&dir, &["a", "b"], false);

        assert_eq!(name(playlist.next_file()), "a");
        assert_eq!(name(playlist.next_file()), "b");
        assert_eq!(name(playlist.next_file()), "a");
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn test_prev_replays_entry_before_current() {
        let dir = TempDir::new().unwrap();
        let mut playlist = playlist_of(&dir, &["a", "b", "c"], false);

        playlist.next_file();
        playlist.next_file();
        assert_eq!(name(playlist.prev_file()), "a");
        assert_eq!(name(playlist.next_file()), "b");
    }

    #[test]
    fn test_play_once_consumes_entries() {
        let dir = TempDir::new().unwrap();
        let mut playlist = playlist_of(&dir, &["a", "b"], true);

        assert_eq!(name(playlist.next_file()), "a");
        assert_eq!(playlist.len(), 1);
        assert_eq!(name(playlist.next_file()), "b");
        assert!(!playlist.files_left());
        assert!(playlist.next_file().is_none());
    }

    #[test]
    fn test_insert_next_goes_to_cursor() {
        let dir = TempDir::new().unwrap();
        let mut playlist = playlist_of(&dir, &["a", "b"], false);
        playlist.next_file();

        let path = dir.path().join("new");
        fs::write(&path, b"data").unwrap();
        playlist.insert_next(&path, ModuleInfo::new("new", ModuleType::new("AY")));

        assert_eq!(name(playlist.next_file()), "new");
        assert_eq!(name(playlist.next_file()), "b");
    }

    #[test]
    fn test_unopenable_entry_is_dropped() {
        let dir = TempDir::new().unwrap();
        let mut playlist = playlist_of(&dir, &["gone", "b"], false);
        fs::remove_file(dir.path().join("gone")).unwrap();

        assert!(playlist.next_file().is_none());
        assert_eq!(playlist.len(), 1);
        assert_eq!(name(playlist.next_file()), "b");
    }

    #[test]
    fn test_force_remove_keeps_cursor_on_next_entry() {
        let dir = TempDir::new().unwrap();
        let mut playlist = playlist_of(&dir, &["a", "b", "c"], false);
        let (info, _) = playlist.next_file().unwrap();

        playlist.force_remove(info.entry);
        assert_eq!(playlist.len(), 2);
        assert_eq!(name(playlist.next_file()), "b");
    }
}
