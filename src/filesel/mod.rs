//! File source: the play-list, directory browsing and the interactive
//! selector that fills the play-list.

pub mod browser;
pub mod m3u;
pub mod playlist;
pub mod scan;
pub mod selector;
mod ui;

pub use browser::{Browser, BrowserItem, ItemKind};
pub use playlist::{Playlist, PlaylistEntry};
pub use selector::{FileSelector, KeyAction};

use crate::console::Console;
use crate::filehandle::FileHandle;
use crate::module_info::{EntryId, ModuleInfo};

/// What the interactive selector reports when it hands control back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOutcome {
    /// The user left without touching the play-list.
    Unchanged,
    /// Entries were added, or the user picked something to play now.
    Changed,
    /// The selector could not run (display or input error).
    Failed,
}

/// Contract between the selector coordinator and whatever holds the play-list.
pub trait FileSource {
    fn files_left(&self) -> bool;

    /// Open the entry at the cursor and move forward. `None` means the entry
    /// could not be handed out; it is dropped from the list when that happens.
    fn next_file(&mut self) -> Option<(ModuleInfo, FileHandle)>;

    fn prev_file(&mut self) -> Option<(ModuleInfo, FileHandle)>;

    /// Drop an entry that turned out to be unplayable.
    fn force_remove(&mut self, entry: EntryId);

    fn run_interactive_selector(&mut self, console: &mut dyn Console) -> SelectorOutcome;
}
