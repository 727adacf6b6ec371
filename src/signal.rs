/// Why an interface's run-step returned. Produced once per step and consumed
/// by the playback loop in the same iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Continue,
    Quit,
    /// The current tune ended; load the next play-list entry.
    AutoAdvanceNext,
    ManualPrev,
    ManualNext,
    /// Open the interactive file selector.
    RequestSelector,
    /// Hand the terminal to a shell until it exits.
    RequestShell,
}

/// Play-list traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}
