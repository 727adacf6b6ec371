//! Console player interface.
//!
//! One [`CpInterface`] serves every module type: the parameter block bound to
//! a type tag names the format player to create. Each run-step polls one key,
//! lets the player advance, and redraws the status screen.

mod ui;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::error::Error;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::console::Console;
use crate::filehandle::FileHandle;
use crate::interface::{Interface, InterfaceParams, InterfaceRegistry};
use crate::module_info::ModuleInfo;
use crate::players::{KeyOutcome, Player, PlayerSettings};
use crate::signal::ControlSignal;

const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("Esc/q", "Quit"),
    ("Enter", "Next file"),
    ("Backspace", "Previous file"),
    ("f", "File selector"),
    ("Ctrl-D", "Shell"),
    ("Alt-K", "Key help"),
];

fn global_signal(key: &KeyEvent) -> Option<ControlSignal> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(ControlSignal::Quit),
        KeyCode::Char('q') if !ctrl => Some(ControlSignal::Quit),
        KeyCode::Enter => Some(ControlSignal::ManualNext),
        KeyCode::Backspace => Some(ControlSignal::ManualPrev),
        KeyCode::Char('f') if !ctrl => Some(ControlSignal::RequestSelector),
        KeyCode::Char('d') | KeyCode::Char('D') if ctrl => Some(ControlSignal::RequestShell),
        _ => None,
    }
}

fn is_help_toggle(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::ALT) && matches!(key.code, KeyCode::Char('k') | KeyCode::Char('K'))
}

pub struct CpInterface {
    settings: PlayerSettings,
    frame_interval: Duration,
    player: Option<Box<dyn Player>>,
    info: ModuleInfo,
    show_help: bool,
}

impl CpInterface {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: PlayerSettings::from_config(config),
            frame_interval: Duration::from_millis(config.frame_interval_ms.max(1)),
            player: None,
            info: ModuleInfo::default(),
            show_help: false,
        }
    }
}

impl Interface for CpInterface {
    fn name(&self) -> &str {
        "cpiface"
    }

    fn init(
        &mut self,
        info: &ModuleInfo,
        file: &FileHandle,
        params: &InterfaceParams,
    ) -> Result<(), Box<dyn Error>> {
        self.close();

        let mut player = params.player.create(&self.settings);
        player.open(info, file, Instant::now())?;
        log::debug!("{} player opened {}", player.name(), info.name);

        self.player = Some(player);
        self.info = info.clone();
        Ok(())
    }

    fn run(&mut self, console: &mut dyn Console) -> ControlSignal {
        let Some(player) = self.player.as_mut() else {
            return ControlSignal::RequestSelector;
        };

        match console.poll_key(self.frame_interval) {
            Ok(Some(key)) => {
                if let Some(signal) = global_signal(&key) {
                    return signal;
                }
                if is_help_toggle(&key) {
                    self.show_help = !self.show_help;
                } else if player.process_key(key, Instant::now()) == KeyOutcome::Unhandled {
                    log::debug!("Unhandled key {:?}", key.code);
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("Console input failed: {e}");
                return ControlSignal::Quit;
            }
        }

        let now = Instant::now();
        if player.idle(now) {
            log::info!("{} finished", self.info.name);
            return ControlSignal::AutoAdvanceNext;
        }

        let status = player.status(now);
        let help = self.show_help.then(|| {
            let mut keys = GLOBAL_KEYS.to_vec();
            keys.extend(player.key_help());
            keys
        });
        let screen = ui::StatusScreen {
            info: &self.info,
            player: player.name(),
            status: &status,
            help: help.as_deref(),
        };
        if let Err(e) = console.draw(&mut |f| ui::draw_status(f, &screen)) {
            log::warn!("Failed to draw status screen: {e}");
        }
        ControlSignal::Continue
    }

    fn close(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.close();
        }
        self.info = ModuleInfo::default();
    }
}

/// Registry with one console interface serving every configured type tag.
pub fn standard_registry(config: &Config) -> InterfaceRegistry {
    let mut registry = InterfaceRegistry::new();
    let id = registry.register_interface(Box::new(CpInterface::new(config)));
    for filetype in &config.filetypes {
        registry.register_type(
            filetype.mod_type.clone(),
            id,
            InterfaceParams {
                player: filetype.player,
            },
        );
    }
    registry
}
