//! Playback core: the selector coordinator and the main playback loop.
//!
//! Both operate on a [`Session`], which owns every collaborator the loop talks
//! to. Nothing here is global; tests build a session out of fakes.

pub mod main_loop;
pub mod selector;

#[cfg(test)]
mod testing;

pub use main_loop::{RunOptions, RunStats, run};
pub use selector::{Advance, Candidate, SelectRequest, TRAVERSAL_RETRY_LIMIT, advance_selection};

use crate::console::Console;
use crate::filesel::FileSource;
use crate::interface::InterfaceRegistry;
use crate::preprocess::PreprocessChain;
use crate::shell::Shell;

pub struct Session {
    pub files: Box<dyn FileSource>,
    pub registry: InterfaceRegistry,
    pub preprocess: PreprocessChain,
    pub console: Box<dyn Console>,
    pub shell: Box<dyn Shell>,
}

impl Session {
    pub fn new(
        files: Box<dyn FileSource>,
        registry: InterfaceRegistry,
        preprocess: PreprocessChain,
        console: Box<dyn Console>,
        shell: Box<dyn Shell>,
    ) -> Self {
        Self {
            files,
            registry,
            preprocess,
            console,
            shell,
        }
    }
}
