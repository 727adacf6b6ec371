//! Selector coordinator: produce the next playable (file, interface) pair.
//!
//! Entries whose type tag has no registered interface are released, purged
//! from the file source and skipped, so an unplayable file never blocks the
//! play-list.

use crate::filehandle::FileHandle;
use crate::filesel::SelectorOutcome;
use crate::interface::InterfaceBinding;
use crate::module_info::ModuleInfo;
use crate::signal::Direction;

use super::Session;

/// Consecutive failed fetches tolerated while the file source still claims to
/// have files left.
pub const TRAVERSAL_RETRY_LIMIT: usize = 64;

/// A resolved candidate waiting to become the loop's current module.
#[derive(Debug)]
pub struct Candidate {
    pub info: ModuleInfo,
    pub file: FileHandle,
    pub binding: InterfaceBinding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectRequest {
    /// Open the interactive selector if the play-list is empty.
    pub auto_trigger: bool,
    /// Open the interactive selector unconditionally.
    pub force_interactive: bool,
    /// `None` traverses forward only if the selector reported a change.
    pub direction: Option<Direction>,
}

impl SelectRequest {
    /// Auto-trigger, no forced direction.
    pub fn auto() -> Self {
        Self {
            auto_trigger: true,
            force_interactive: false,
            direction: None,
        }
    }

    /// Open the selector first, whatever the play-list holds.
    pub fn forced() -> Self {
        Self {
            auto_trigger: true,
            force_interactive: true,
            direction: None,
        }
    }

    pub fn with(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Plain traversal in `direction`, no selector.
    pub fn step(direction: Direction) -> Self {
        Self {
            auto_trigger: false,
            force_interactive: false,
            direction: Some(direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing playable and the user added nothing.
    Exhausted,
    /// A candidate was written to the pending slot. `tentative` is set when
    /// the interactive selector ran and reported something other than "no
    /// change"; the loop then switches to auto-trigger mode.
    Loaded { tentative: bool },
    /// The file source kept failing to hand out files it claims to have.
    Failed,
}

impl Advance {
    pub fn is_loaded(self) -> bool {
        matches!(self, Advance::Loaded { .. })
    }
}

pub fn advance_selection(
    session: &mut Session,
    pending: &mut Option<Candidate>,
    request: SelectRequest,
) -> Advance {
    // The slot is always released before anything new can land in it.
    if let Some(old) = pending.take() {
        log::debug!("Releasing pending {}", old.info.name);
    }

    loop {
        let mut outcome = SelectorOutcome::Unchanged;
        if request.force_interactive || (request.auto_trigger && !session.files.files_left()) {
            outcome = session.files.run_interactive_selector(session.console.as_mut());
            log::debug!("File selector returned {outcome:?}");
        }

        if !session.files.files_left() {
            return Advance::Exhausted;
        }

        let direction = match request.direction {
            Some(direction) => direction,
            None if outcome != SelectorOutcome::Unchanged => Direction::Next,
            None => return Advance::Exhausted,
        };

        let mut misses = 0;
        while session.files.files_left() {
            let fetched = match direction {
                Direction::Next => session.files.next_file(),
                Direction::Prev => session.files.prev_file(),
            };

            let Some((info, file)) = fetched else {
                misses += 1;
                if misses > TRAVERSAL_RETRY_LIMIT {
                    log::error!(
                        "File source reports files left but failed {misses} fetches in a row, giving up"
                    );
                    return Advance::Failed;
                }
                log::warn!("File source failed to hand out a file, retrying");
                continue;
            };
            misses = 0;

            match session.registry.find(&info.mod_type) {
                Some(binding) => {
                    if let Err(e) = session.console.clear() {
                        log::warn!("Failed to clear console: {e}");
                    }
                    log::info!("Selected {} ({})", info.name, info.mod_type);
                    *pending = Some(Candidate {
                        info,
                        file,
                        binding,
                    });
                    return Advance::Loaded {
                        tentative: outcome != SelectorOutcome::Unchanged,
                    };
                }
                None => {
                    let entry = info.entry;
                    drop(file);
                    session.files.force_remove(entry);
                    log::info!(
                        "No interface for {} (type {}), removed {entry} from the play-list",
                        info.name,
                        info.mod_type
                    );
                }
            }
        }

        if outcome == SelectorOutcome::Unchanged {
            return Advance::Exhausted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::{Harness, entry};

    #[test]
    fn test_loads_registered_entry() {
        let mut h = Harness::new(vec![entry("a.x", "typeX")]);
        let mut pending = None;

        let result = advance_selection(&mut h.session, &mut pending, SelectRequest::auto().with(Direction::Next));

        assert_eq!(result, Advance::Loaded { tentative: false });
        let candidate = pending.unwrap();
        assert_eq!(candidate.info.name, "a.x");
        assert_eq!(candidate.binding, h.binding_x);
        assert_eq!(h.trace.borrow().selector_calls, 0);
    }

    #[test]
    fn test_empty_list_without_triggers_is_exhausted() {
        let mut h = Harness::new(vec![]);
        let mut pending = None;

        let request = SelectRequest::step(Direction::Next);
        assert_eq!(advance_selection(&mut h.session, &mut pending, request), Advance::Exhausted);
        assert_eq!(advance_selection(&mut h.session, &mut pending, request), Advance::Exhausted);

        assert_eq!(h.trace.borrow().selector_calls, 0);
        assert!(pending.is_none());
    }

    #[test]
    fn test_unregistered_entry_is_purged() {
        let mut h = Harness::new(vec![entry("b.unk", "unknown")]);
        let mut pending = None;

        let result = advance_selection(&mut h.session, &mut pending, SelectRequest::auto().with(Direction::Next));

        assert_eq!(result, Advance::Exhausted);
        assert!(pending.is_none());
        let trace = h.trace.borrow();
        assert_eq!(trace.removed.len(), 1);
        assert_eq!(trace.remaining(), 0);
    }

    #[test]
    fn test_purged_entry_is_never_returned_again() {
        let mut h = Harness::new(vec![
            entry("bad.unk", "unknown"),
            entry("good.x", "typeX"),
            entry("fine.x", "typeX"),
        ]);
        let mut pending = None;

        let first = advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));
        assert!(first.is_loaded());
        assert_eq!(pending.as_ref().unwrap().info.name, "good.x");
        assert_eq!(h.trace.borrow().remaining(), 2);

        let mut names = Vec::new();
        for _ in 0..4 {
            advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));
            names.push(pending.as_ref().unwrap().info.name.clone());
        }
        assert!(names.iter().all(|n| n != "bad.unk"));
    }

    #[test]
    fn test_pending_slot_is_released_first() {
        let mut h = Harness::new(vec![entry("a.x", "typeX"), entry("b.x", "typeX")]);
        let mut pending = None;

        advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));
        let first = pending.as_ref().unwrap().file.clone();
        assert_eq!(first.ref_count(), 2);

        advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));
        assert_eq!(first.ref_count(), 1);
        assert_eq!(pending.as_ref().unwrap().info.name, "b.x");

        // An exhausted call still empties the slot.
        h.clear_files();
        advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));
        assert!(pending.is_none());
    }

    #[test]
    fn test_auto_trigger_opens_selector_on_empty_list() {
        let mut h = Harness::new(vec![]);
        h.script_selector(vec![(SelectorOutcome::Changed, vec![entry("new.x", "typeX")])]);
        let mut pending = None;

        let result = advance_selection(&mut h.session, &mut pending, SelectRequest::auto());

        assert_eq!(result, Advance::Loaded { tentative: true });
        assert_eq!(h.trace.borrow().selector_calls, 1);
        assert_eq!(pending.unwrap().info.name, "new.x");
    }

    #[test]
    fn test_unchanged_selector_without_direction_is_exhausted() {
        let mut h = Harness::new(vec![entry("a.x", "typeX")]);
        let mut pending = None;

        let result = advance_selection(&mut h.session, &mut pending, SelectRequest::forced());

        assert_eq!(result, Advance::Exhausted);
        assert_eq!(h.trace.borrow().selector_calls, 1);
        assert_eq!(h.trace.borrow().remaining(), 1);
    }

    #[test]
    fn test_prev_direction_walks_backwards() {
        let mut h = Harness::new(vec![entry("a.x", "typeX"), entry("b.x", "typeX"), entry("c.x", "typeX")]);
        let mut pending = None;

        advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));
        advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));
        assert_eq!(pending.as_ref().unwrap().info.name, "b.x");

        advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Prev));
        assert_eq!(pending.as_ref().unwrap().info.name, "a.x");
    }

    #[test]
    fn test_fetch_anomaly_is_retried() {
        let mut h = Harness::new(vec![entry("a.x", "typeX")]);
        h.fail_fetches(3);
        let mut pending = None;

        let result = advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));

        assert!(result.is_loaded());
        assert_eq!(h.trace.borrow().failed_fetches, 3);
    }

    #[test]
    fn test_fetch_anomaly_is_bounded() {
        let mut h = Harness::new(vec![entry("a.x", "typeX")]);
        h.fail_fetches(usize::MAX);
        let mut pending = None;

        let result = advance_selection(&mut h.session, &mut pending, SelectRequest::step(Direction::Next));

        assert_eq!(result, Advance::Failed);
        assert_eq!(h.trace.borrow().failed_fetches, TRAVERSAL_RETRY_LIMIT + 1);
        assert!(pending.is_none());
    }
}
