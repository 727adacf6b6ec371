//! Scripted collaborators for exercising the playback core.
//!
//! Every fake writes into one shared [`Trace`], so tests can assert on the
//! relative order of console, shell, selector and interface calls.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::console::{Console, HeadlessConsole};
use crate::filehandle::FileHandle;
use crate::filesel::{FileSource, SelectorOutcome};
use crate::interface::{Interface, InterfaceBinding, InterfaceParams, InterfaceRegistry};
use crate::module_info::{EntryId, ModuleInfo, ModuleType};
use crate::players::PlayerKind;
use crate::preprocess::PreprocessChain;
use crate::shell::Shell;
use crate::signal::{ControlSignal, Direction};

use super::Session;

pub fn entry(name: &str, tag: &str) -> ModuleInfo {
    ModuleInfo::new(name, ModuleType::new(tag))
}

#[derive(Default)]
pub struct Trace {
    pub entries: Vec<ModuleInfo>,
    pub pos: usize,
    pub play_once: bool,
    pub next_id: u32,
    /// One (outcome, entries to insert) per selector call; empty means `Unchanged`.
    pub selector_script: VecDeque<(SelectorOutcome, Vec<ModuleInfo>)>,
    pub fail_budget: usize,
    /// Fetches that succeed before `fail_budget` starts being spent.
    pub fail_after: usize,
    pub run_script: VecDeque<ControlSignal>,
    pub init_failures: HashSet<String>,

    pub selector_calls: usize,
    /// Selector calls made while the list still had entries; only a forced
    /// call does that.
    pub forced_selector_calls: usize,
    pub failed_fetches: usize,
    pub fetched: Vec<(Direction, String)>,
    pub removed: Vec<EntryId>,
    pub inits: Vec<String>,
    pub events: Vec<String>,
}

impl Trace {
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    fn insert_next(&mut self, mut info: ModuleInfo) {
        info.entry = EntryId(self.next_id);
        self.next_id += 1;
        let at = self.pos.min(self.entries.len());
        self.entries.insert(at, info);
    }

    fn take(&mut self, pick: usize, direction: Direction) -> (ModuleInfo, FileHandle) {
        let info = if self.play_once {
            let info = self.entries.remove(pick);
            if pick < self.pos {
                self.pos -= 1;
            }
            info
        } else {
            self.entries[pick].clone()
        };
        self.fetched.push((direction, info.name.clone()));
        let file = FileHandle::from_bytes(info.entry, info.name.clone(), vec![0u8; 4]);
        (info, file)
    }

    fn miss(&mut self) -> bool {
        if self.fail_budget == 0 || self.fetched.len() < self.fail_after {
            return false;
        }
        self.fail_budget -= 1;
        self.failed_fetches += 1;
        true
    }
}

pub type SharedTrace = Rc<RefCell<Trace>>;

struct FakeFiles(SharedTrace);

impl FileSource for FakeFiles {
    fn files_left(&self) -> bool {
        !self.0.borrow().entries.is_empty()
    }

    fn next_file(&mut self) -> Option<(ModuleInfo, FileHandle)> {
        let mut t = self.0.borrow_mut();
        if t.miss() || t.entries.is_empty() {
            return None;
        }
        let pick = if t.pos >= t.entries.len() { 0 } else { t.pos };
        t.pos = pick + 1;
        Some(t.take(pick, Direction::Next))
    }

    fn prev_file(&mut self) -> Option<(ModuleInfo, FileHandle)> {
        let mut t = self.0.borrow_mut();
        if t.miss() || t.entries.is_empty() {
            return None;
        }
        let len = t.entries.len();
        t.pos = if t.pos > 0 { t.pos - 1 } else { len - 1 };
        let pick = if t.pos > 0 { t.pos - 1 } else { len - 1 };
        Some(t.take(pick, Direction::Prev))
    }

    fn force_remove(&mut self, entry: EntryId) {
        let mut t = self.0.borrow_mut();
        if let Some(index) = t.entries.iter().position(|e| e.entry == entry) {
            t.entries.remove(index);
            if index < t.pos {
                t.pos -= 1;
            }
        }
        t.removed.push(entry);
        t.events.push(format!("remove:{}", entry.0));
    }

    fn run_interactive_selector(&mut self, _console: &mut dyn Console) -> SelectorOutcome {
        let mut t = self.0.borrow_mut();
        t.selector_calls += 1;
        if !t.entries.is_empty() {
            t.forced_selector_calls += 1;
        }
        t.events.push("selector".to_string());
        let Some((outcome, added)) = t.selector_script.pop_front() else {
            return SelectorOutcome::Unchanged;
        };
        for info in added.into_iter().rev() {
            t.insert_next(info);
        }
        outcome
    }
}

struct FakeInterface {
    trace: SharedTrace,
    file: Option<FileHandle>,
}

impl Interface for FakeInterface {
    fn name(&self) -> &str {
        "fake"
    }

    fn init(&mut self, info: &ModuleInfo, file: &FileHandle, _: &InterfaceParams) -> Result<(), Box<dyn Error>> {
        let mut t = self.trace.borrow_mut();
        t.inits.push(info.name.clone());
        t.events.push(format!("init:{}", info.name));
        if t.init_failures.contains(&info.name) {
            return Err(format!("cannot play {}", info.name).into());
        }
        self.file = Some(file.clone());
        Ok(())
    }

    fn run(&mut self, _console: &mut dyn Console) -> ControlSignal {
        self.trace
            .borrow_mut()
            .run_script
            .pop_front()
            .unwrap_or(ControlSignal::Quit)
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            self.trace
                .borrow_mut()
                .events
                .push(format!("close:{}:refs={}", file.name(), file.ref_count()));
        }
    }
}

struct FakeConsole {
    trace: SharedTrace,
    inner: HeadlessConsole,
}

impl FakeConsole {
    fn record(&self, event: &str) {
        self.trace.borrow_mut().events.push(event.to_string());
    }
}

impl Console for FakeConsole {
    fn save(&mut self) -> io::Result<()> {
        self.record("save");
        self.inner.save()
    }

    fn restore(&mut self) -> io::Result<()> {
        self.record("restore");
        self.inner.restore()
    }

    fn reset_text_mode(&mut self) -> io::Result<()> {
        self.record("reset");
        self.inner.reset_text_mode()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.record("clear");
        self.inner.clear()
    }

    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        self.inner.poll_key(timeout)
    }

    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.inner.draw(render)
    }
}

struct FakeShell(SharedTrace);

impl Shell for FakeShell {
    fn run(&mut self) -> Result<(), Box<dyn Error>> {
        self.0.borrow_mut().events.push("shell".to_string());
        Ok(())
    }
}

pub struct Harness {
    pub session: Session,
    pub trace: SharedTrace,
    pub binding_x: InterfaceBinding,
}

impl Harness {
    /// Session over `entries` with one fake interface registered for `typeX`.
    pub fn new(entries: Vec<ModuleInfo>) -> Self {
        let trace: SharedTrace = Rc::new(RefCell::new(Trace::default()));
        for info in entries {
            let mut t = trace.borrow_mut();
            let len = t.entries.len();
            t.pos = len;
            t.insert_next(info);
        }
        trace.borrow_mut().pos = 0;

        let mut registry = InterfaceRegistry::new();
        let id = registry.register_interface(Box::new(FakeInterface {
            trace: trace.clone(),
            file: None,
        }));
        let params = InterfaceParams {
            player: PlayerKind::Ay,
        };
        registry.register_type(ModuleType::new("typeX"), id, params);
        let binding_x = InterfaceBinding { interface: id, params };

        let console = FakeConsole {
            trace: trace.clone(),
            inner: HeadlessConsole::new(80, 25).unwrap(),
        };

        let session = Session::new(
            Box::new(FakeFiles(trace.clone())),
            registry,
            PreprocessChain::new(),
            Box::new(console),
            Box::new(FakeShell(trace.clone())),
        );

        Self {
            session,
            trace,
            binding_x,
        }
    }

    pub fn play_once(&mut self) {
        self.trace.borrow_mut().play_once = true;
    }

    pub fn clear_files(&mut self) {
        let mut t = self.trace.borrow_mut();
        t.entries.clear();
        t.pos = 0;
    }

    pub fn script_selector(&mut self, script: Vec<(SelectorOutcome, Vec<ModuleInfo>)>) {
        self.trace.borrow_mut().selector_script.extend(script);
    }

    pub fn script_run(&mut self, signals: Vec<ControlSignal>) {
        self.trace.borrow_mut().run_script.extend(signals);
    }

    pub fn fail_fetches(&mut self, count: usize) {
        self.trace.borrow_mut().fail_budget = count;
    }

    /// Let `done` fetches through, then fail the next `count`.
    pub fn fail_fetches_after(&mut self, done: usize, count: usize) {
        let mut t = self.trace.borrow_mut();
        t.fail_after = done;
        t.fail_budget = count;
    }

    pub fn fail_init(&mut self, name: &str) {
        self.trace.borrow_mut().init_failures.insert(name.to_string());
    }
}
