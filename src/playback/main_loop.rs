//! The playback loop.
//!
//! States are implicit in [`LoopContext`]: no interface bound means the loop
//! asks the selector coordinator for something to play; a bound interface is
//! stepped until its signal demands a transition. `Quit`, or an exhausted
//! play-list, ends the loop.
//!
//! Replacing the current module always closes the old interface before the old
//! file handle is released.

use crate::filehandle::FileHandle;
use crate::interface::InterfaceBinding;
use crate::module_info::ModuleInfo;
use crate::signal::{ControlSignal, Direction};

use super::Session;
use super::selector::{Advance, Candidate, SelectRequest, advance_selection};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Start with the interactive selector even if files were queued.
    pub open_selector_first: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Modules whose interface init succeeded.
    pub loaded: usize,
    pub init_failures: usize,
    pub shell_outs: usize,
}

struct Current {
    info: ModuleInfo,
    file: FileHandle,
}

/// Everything the loop carries between iterations.
struct LoopContext {
    current: Option<Current>,
    interface: Option<InterfaceBinding>,
    pending: Option<Candidate>,
    signal: ControlSignal,
    /// Fallback mode: an empty play-list opens the selector by itself.
    auto_select: bool,
    first_file: bool,
    stats: RunStats,
}

impl LoopContext {
    fn new(options: RunOptions) -> Self {
        Self {
            current: None,
            interface: None,
            pending: None,
            signal: if options.open_selector_first {
                ControlSignal::RequestSelector
            } else {
                ControlSignal::Continue
            },
            auto_select: false,
            first_file: true,
            stats: RunStats::default(),
        }
    }
}

/// Run until the user quits or nothing is left to play.
pub fn run(session: &mut Session, options: RunOptions) -> RunStats {
    let mut ctx = LoopContext::new(options);
    save_console(session);

    loop {
        if ctx.signal == ControlSignal::Quit {
            log::info!("Quit requested");
            break;
        }

        if ctx.interface.is_none() {
            save_console(session);
            let request = SelectRequest {
                auto_trigger: ctx.auto_select || ctx.first_file,
                force_interactive: ctx.signal == ControlSignal::RequestSelector,
                direction: Some(Direction::Next),
            };
            match advance_selection(session, &mut ctx.pending, request) {
                Advance::Loaded { tentative } => {
                    if tentative {
                        ctx.auto_select = true;
                    }
                }
                Advance::Exhausted => {
                    log::info!("Nothing left to play");
                    break;
                }
                Advance::Failed => {
                    log::error!("File source is inconsistent, stopping playback");
                    break;
                }
            }
        }
        ctx.signal = ControlSignal::Continue;

        if ctx.auto_select {
            ctx.first_file = false;
        }

        if ctx.pending.is_some() {
            load_pending(session, &mut ctx);
        }

        if let Some(binding) = ctx.interface {
            step_interface(session, &mut ctx, binding);
            ctx.first_file = false;
        }
    }

    shutdown(session, &mut ctx);
    ctx.stats
}

fn save_console(session: &mut Session) {
    if let Err(e) = session.console.save() {
        log::warn!("Failed to save console: {e}");
    }
}

fn close_interface(session: &mut Session, ctx: &mut LoopContext) {
    if let Some(binding) = ctx.interface.take()
        && let Some(interface) = session.registry.get_mut(binding.interface)
    {
        interface.close();
    }
}

/// Commit the pending candidate as current and initialise its interface.
fn load_pending(session: &mut Session, ctx: &mut LoopContext) {
    let Some(Candidate { info, file, binding }) = ctx.pending.take() else {
        return;
    };

    close_interface(session, ctx);
    ctx.current = None;

    let current = ctx.current.insert(Current { info, file });
    ctx.interface = Some(binding);
    ctx.signal = ControlSignal::Continue;

    session.preprocess.apply(&mut current.info, &mut current.file);

    let result = match session.registry.get_mut(binding.interface) {
        Some(interface) => interface.init(&current.info, &current.file, &binding.params),
        None => Err("interface is not registered".into()),
    };

    match result {
        Ok(()) => {
            ctx.stats.loaded += 1;
            log::info!("Playing {} ({})", current.info.name, current.info.mod_type);
        }
        Err(e) => {
            // Back to the selector; retrying the same file could spin forever.
            log::warn!("Failed to start {}: {e}", current.info.name);
            ctx.stats.init_failures += 1;
            ctx.signal = ControlSignal::RequestSelector;
            ctx.interface = None;
        }
    }

    save_console(session);
}

fn step_interface(session: &mut Session, ctx: &mut LoopContext, binding: InterfaceBinding) {
    while ctx.signal == ControlSignal::Continue {
        let Some(interface) = session.registry.get_mut(binding.interface) else {
            log::error!("Bound interface disappeared from the registry");
            ctx.signal = ControlSignal::Quit;
            return;
        };
        let signal = interface.run(session.console.as_mut());
        ctx.signal = react(session, ctx, signal);
    }
}

fn loaded_or_continue(result: Advance) -> ControlSignal {
    if result.is_loaded() {
        ControlSignal::AutoAdvanceNext
    } else {
        ControlSignal::Continue
    }
}

/// Turn one run-step signal into the loop's next signal. `AutoAdvanceNext`
/// coming out of here means "a candidate is pending, load it".
fn react(session: &mut Session, ctx: &mut LoopContext, signal: ControlSignal) -> ControlSignal {
    match signal {
        ControlSignal::Continue | ControlSignal::Quit => signal,
        ControlSignal::AutoAdvanceNext => {
            if advance_selection(session, &mut ctx.pending, SelectRequest::auto()).is_loaded() {
                return ControlSignal::AutoAdvanceNext;
            }
            if session.files.files_left() {
                let retry = SelectRequest::step(Direction::Next);
                if advance_selection(session, &mut ctx.pending, retry).is_loaded() {
                    return ControlSignal::AutoAdvanceNext;
                }
            }
            log::info!("End of play-list");
            ControlSignal::Quit
        }
        ControlSignal::ManualPrev | ControlSignal::ManualNext => {
            let direction = if signal == ControlSignal::ManualPrev {
                Direction::Prev
            } else {
                Direction::Next
            };
            let request = if session.files.files_left() {
                SelectRequest::step(direction)
            } else {
                SelectRequest::auto()
            };
            loaded_or_continue(advance_selection(session, &mut ctx.pending, request))
        }
        ControlSignal::RequestSelector => {
            loaded_or_continue(advance_selection(session, &mut ctx.pending, SelectRequest::forced()))
        }
        ControlSignal::RequestShell => {
            shell_out(session, ctx);
            ControlSignal::Continue
        }
    }
}

fn shell_out(session: &mut Session, ctx: &mut LoopContext) {
    if let Err(e) = session.console.reset_text_mode() {
        log::warn!("Failed to reset text mode: {e}");
    }
    if let Err(e) = session.console.restore() {
        log::warn!("Failed to restore console, not starting a shell: {e}");
        return;
    }

    log::info!("Starting shell");
    if let Err(e) = session.shell.run() {
        log::warn!("Shell failed: {e}");
    }
    ctx.stats.shell_outs += 1;

    save_console(session);
}

fn shutdown(session: &mut Session, ctx: &mut LoopContext) {
    if let Err(e) = session.console.reset_text_mode() {
        log::warn!("Failed to reset text mode: {e}");
    }
    if let Err(e) = session.console.restore() {
        log::warn!("Failed to restore console: {e}");
    }
    close_interface(session, ctx);
    ctx.current = None;
    ctx.pending = None;
}
