//! Project-wide constants used across multiple modules.

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Playlist files expanded into their entries
pub const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "m3u8"];

/// Directories to skip during file system traversal
pub const SKIP_DIRECTORIES: &[&str] = &[".git", "node_modules", "lost+found"];

/// Bytes read from the start of a file for signature sniffing
pub const DETECT_HEAD_LEN: usize = 64 * 1024;
