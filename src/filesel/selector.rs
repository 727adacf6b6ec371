//! Interactive file selector wrapped around the play-list.
//!
//! The subsystem comes up in three stages so each failure can be reported on
//! its own: `pre_init` checks the configuration, `init` resolves the start
//! directory, `late_init` lists it.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::browser::{Browser, ItemKind};
use super::playlist::Playlist;
use super::{FileSource, SelectorOutcome, m3u, scan, ui};
use crate::config::Config;
use crate::console::Console;
use crate::error::FileSelError;
use crate::filehandle::FileHandle;
use crate::mdb::Detector;
use crate::module_info::{EntryId, ModuleInfo};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Stay,
    /// Entries were appended to the play-list.
    Enqueued,
    /// An entry was placed at the cursor to be played next.
    PlayNow,
    Leave,
}

pub struct FileSelector {
    detector: Detector,
    playlist: Playlist,
    browser: Browser,
    start_dir: PathBuf,
    recursive: bool,
    status: String,
}

impl FileSelector {
    pub fn pre_init(config: &Config) -> Result<Self, FileSelError> {
        if config.filetypes.is_empty() {
            return Err(FileSelError::PreInit("no file types configured".to_string()));
        }
        for filetype in &config.filetypes {
            if filetype.mod_type.is_unknown() {
                return Err(FileSelError::PreInit("file type with an empty type tag".to_string()));
            }
            if filetype.extensions.iter().all(|e| e.trim().is_empty()) {
                return Err(FileSelError::PreInit(format!(
                    "file type {} has no extensions",
                    filetype.mod_type
                )));
            }
        }

        let start_dir = config.start_dir_path().map_err(|e| {
            FileSelError::PreInit(format!("start directory {}: {e}", config.start_dir))
        })?;

        Ok(Self {
            detector: Detector::from_config(config),
            playlist: Playlist::new(config.play_once),
            browser: Browser::new(),
            start_dir,
            recursive: config.scan_recursive,
            status: String::new(),
        })
    }

    pub fn init(&mut self) -> Result<(), FileSelError> {
        let resolved = self.start_dir.canonicalize().map_err(|e| {
            FileSelError::Init(format!("start directory {}: {e}", self.start_dir.display()))
        })?;
        if !resolved.is_dir() {
            return Err(FileSelError::Init(format!(
                "start directory {} is not a directory",
                resolved.display()
            )));
        }
        log::info!("File selector starts in {}", resolved.display());
        self.start_dir = resolved;
        Ok(())
    }

    pub fn late_init(&mut self) -> Result<(), FileSelError> {
        self.browser
            .read_dir(&self.start_dir, &self.detector)
            .map_err(|e| FileSelError::LateInit(format!("cannot list {}: {e}", self.start_dir.display())))
    }

    pub fn close(&mut self) {
        log::info!("File selector closed with {} entries queued", self.playlist.len());
        self.playlist.clear();
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Append a file, a directory tree or the entries of an M3U file.
    /// Returns how many entries were added.
    pub fn enqueue_path(&mut self, path: &Path) -> Result<usize, Box<dyn Error>> {
        self.enqueue(path, false)
    }

    fn enqueue(&mut self, path: &Path, front: bool) -> Result<usize, Box<dyn Error>> {
        let paths = if path.is_dir() {
            scan::collect_module_files(path, &self.detector, self.recursive).map_err(|e| e.to_string())?
        } else if m3u::is_playlist(path) {
            m3u::read(path)?.into_iter().filter(|p| p.is_file()).collect()
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(format!("{} does not exist", path.display()).into());
        };

        let detected = scan::detect_all(&paths, &self.detector);
        let added = detected.len();
        if front {
            for (path, info) in detected.into_iter().rev() {
                self.playlist.insert_next(&path, info);
            }
        } else {
            for (path, info) in detected {
                self.playlist.push(&path, info);
            }
        }
        log::info!("Enqueued {added} entries from {}", path.display());
        Ok(added)
    }

    fn enqueue_selected(&mut self, front: bool) -> Option<usize> {
        let item = self.browser.selected_item()?.clone();
        if item.kind == ItemKind::Parent {
            return None;
        }
        match self.enqueue(&item.path, front) {
            Ok(added) => {
                self.status = format!("Added {added} from {}", item.name);
                Some(added)
            }
            Err(e) => {
                log::warn!("Cannot enqueue {}: {e}", item.path.display());
                self.status = format!("Cannot add {}: {e}", item.name);
                None
            }
        }
    }

    fn change_dir(&mut self, dir: &Path) {
        if let Err(e) = self.browser.read_dir(dir, &self.detector) {
            log::warn!("Cannot list {}: {e}", dir.display());
            self.status = format!("Cannot open {}: {e}", dir.display());
        }
    }

    fn go_up(&mut self) {
        if let Err(e) = self.browser.enter_parent(&self.detector) {
            log::warn!("Cannot list parent of {}: {e}", self.browser.cwd.display());
            self.status = format!("Cannot open parent directory: {e}");
        }
    }

    fn activate(&mut self) -> KeyAction {
        let Some(item) = self.browser.selected_item().cloned() else {
            return KeyAction::Stay;
        };
        match item.kind {
            ItemKind::Parent => {
                self.go_up();
                KeyAction::Stay
            }
            ItemKind::Directory => {
                self.change_dir(&item.path);
                KeyAction::Stay
            }
            ItemKind::Playlist | ItemKind::Module => match self.enqueue_selected(true) {
                Some(added) if added > 0 => KeyAction::PlayNow,
                _ => KeyAction::Stay,
            },
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if self.browser.searching {
            match key.code {
                KeyCode::Esc => self.browser.clear_search(),
                KeyCode::Enter => {
                    self.browser.end_search();
                    return self.activate();
                }
                KeyCode::Backspace => self.browser.pop_char(),
                KeyCode::Up => self.browser.select_previous(),
                KeyCode::Down => self.browser.select_next(),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.browser.push_char(c),
                _ => {}
            }
            return KeyAction::Stay;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => KeyAction::Leave,
            KeyCode::Enter => self.activate(),
            KeyCode::Insert | KeyCode::Char('+') => match self.enqueue_selected(false) {
                Some(added) if added > 0 => KeyAction::Enqueued,
                _ => KeyAction::Stay,
            },
            KeyCode::Backspace | KeyCode::Left => {
                self.go_up();
                KeyAction::Stay
            }
            KeyCode::Char('/') => {
                self.browser.start_search();
                KeyAction::Stay
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.browser.select_previous();
                KeyAction::Stay
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.browser.select_next();
                KeyAction::Stay
            }
            KeyCode::Home => {
                self.browser.select_first();
                KeyAction::Stay
            }
            KeyCode::End => {
                self.browser.select_last();
                KeyAction::Stay
            }
            _ => KeyAction::Stay,
        }
    }

    fn outcome_on_error(changed: bool) -> SelectorOutcome {
        if changed {
            SelectorOutcome::Changed
        } else {
            SelectorOutcome::Failed
        }
    }
}

impl Drop for FileSelector {
    fn drop(&mut self) {
        self.close();
    }
}

impl FileSource for FileSelector {
    fn files_left(&self) -> bool {
        self.playlist.files_left()
    }

    fn next_file(&mut self) -> Option<(ModuleInfo, FileHandle)> {
        self.playlist.next_file()
    }

    fn prev_file(&mut self) -> Option<(ModuleInfo, FileHandle)> {
        self.playlist.prev_file()
    }

    fn force_remove(&mut self, entry: EntryId) {
        self.playlist.force_remove(entry);
    }

    fn run_interactive_selector(&mut self, console: &mut dyn Console) -> SelectorOutcome {
        let mut changed = false;
        self.status = format!("{} entries queued", self.playlist.len());

        loop {
            let (browser, playlist, status) = (&self.browser, &self.playlist, &self.status);
            if let Err(e) = console.draw(&mut |f| ui::draw_selector(f, browser, playlist, status)) {
                log::error!("Cannot draw the file selector: {e}");
                return Self::outcome_on_error(changed);
            }

            let key = match console.poll_key(POLL_INTERVAL) {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("File selector input failed: {e}");
                    return Self::outcome_on_error(changed);
                }
            };

            match self.handle_key(key) {
                KeyAction::Stay => {}
                KeyAction::Enqueued => changed = true,
                KeyAction::PlayNow => return SelectorOutcome::Changed,
                KeyAction::Leave if changed => return SelectorOutcome::Changed,
                KeyAction::Leave => return SelectorOutcome::Unchanged,
            }
        }
    }
}
