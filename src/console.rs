//! Display backend shared by the file selector and the player interface.
//!
//! [`Console`] is the swappable display contract. `save` takes the terminal
//! over for player output, `restore` hands it back in a neutral state. The
//! ordering rule callers follow: `restore` before anything else takes over the
//! full screen (a shell), `save` again before stepping resumes.

use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{CrosstermBackend, TestBackend},
};
use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

pub trait Console {
    /// Take over the terminal (raw mode, alternate screen). Idempotent.
    fn save(&mut self) -> io::Result<()>;
    /// Give the terminal back to the shell it came from. Idempotent.
    fn restore(&mut self) -> io::Result<()>;
    /// Reset to a blank text screen of the current size.
    fn reset_text_mode(&mut self) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
    /// Wait up to `timeout` for one key press.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()>;
}

pub struct TerminalConsole {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    saved: bool,
}

impl TerminalConsole {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Self {
            terminal: Terminal::new(backend)?,
            saved: false,
        })
    }
}

impl Console for TerminalConsole {
    fn save(&mut self) -> io::Result<()> {
        if self.saved {
            return Ok(());
        }
        enable_raw_mode()?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        self.saved = true;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.saved {
            return Ok(());
        }
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        self.saved = false;
        Ok(())
    }

    fn reset_text_mode(&mut self) -> io::Result<()> {
        self.terminal.autoresize()?;
        if self.saved {
            self.terminal.clear()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            return Ok(Some(key));
        }
        Ok(None)
    }

    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(|f| render(f))?;
        Ok(())
    }
}

impl Drop for TerminalConsole {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::error!("Failed to restore terminal: {e}");
        }
    }
}

/// Off-screen console fed from a key script. Drawing lands in an in-memory
/// buffer that can be inspected afterwards. Polling past the end of the script
/// fails with `UnexpectedEof`, so a scripted session cannot wait forever.
pub struct HeadlessConsole {
    terminal: Terminal<TestBackend>,
    keys: VecDeque<KeyEvent>,
    saved: bool,
}

impl HeadlessConsole {
    pub fn new(width: u16, height: u16) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(TestBackend::new(width, height))?,
            keys: VecDeque::new(),
            saved: false,
        })
    }

    pub fn with_keys(mut self, keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        self.keys.extend(keys);
        self
    }

    pub fn push_key(&mut self, key: KeyEvent) {
        self.keys.push_back(key);
    }

    pub fn pending_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Screen contents, one line per row, trailing blanks trimmed.
    pub fn screen(&self) -> String {
        let buffer = self.terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width.max(1))
            .map(|row| {
                let line: String = row.iter().map(|cell| cell.symbol()).collect();
                line.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Console for HeadlessConsole {
    fn save(&mut self) -> io::Result<()> {
        self.saved = true;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        self.saved = false;
        Ok(())
    }

    fn reset_text_mode(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    fn poll_key(&mut self, _timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.keys.pop_front() {
            Some(key) => Ok(Some(key)),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "key script exhausted")),
        }
    }

    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(|f| render(f))?;
        Ok(())
    }
}
