//! Transforms applied to a committed module right before interface init.
//!
//! Preprocessors run in registration order and may replace both the metadata
//! and the file handle. A preprocessor that fails leaves its inputs untouched
//! and logs why; it never stops the chain.

use std::path::Path;

use crate::config::Config;
use crate::filehandle::FileHandle;
use crate::module_info::ModuleInfo;

pub trait Preprocessor {
    fn name(&self) -> &str;
    fn preprocess(&self, info: &mut ModuleInfo, file: &mut FileHandle);
}

#[derive(Default)]
pub struct PreprocessChain {
    steps: Vec<Box<dyn Preprocessor>>,
}

impl PreprocessChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain used by `ocp play`.
    pub fn standard(config: &Config) -> Self {
        let mut chain = Self::new();
        chain.register(Box::new(TitleFromName));
        chain.register(Box::new(LoadIntoMemory {
            limit: config.max_file_size(),
        }));
        chain
    }

    pub fn register(&mut self, step: Box<dyn Preprocessor>) {
        self.steps.push(step);
    }

    pub fn apply(&self, info: &mut ModuleInfo, file: &mut FileHandle) {
        for step in &self.steps {
            log::debug!("Preprocessing {} with {}", info.name, step.name());
            step.preprocess(info, file);
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Use the file stem as title when the header did not carry one.
pub struct TitleFromName;

impl Preprocessor for TitleFromName {
    fn name(&self) -> &str {
        "title-from-name"
    }

    fn preprocess(&self, info: &mut ModuleInfo, _file: &mut FileHandle) {
        if !info.title.trim().is_empty() {
            return;
        }
        if let Some(stem) = Path::new(&info.name).file_stem() {
            info.title = stem.to_string_lossy().replace('_', " ");
        }
    }
}

/// Swap a disk-backed handle for an in-memory copy so players never touch the
/// filesystem while stepping.
pub struct LoadIntoMemory {
    pub limit: u64,
}

impl Preprocessor for LoadIntoMemory {
    fn name(&self) -> &str {
        "load-into-memory"
    }

    fn preprocess(&self, _info: &mut ModuleInfo, file: &mut FileHandle) {
        if file.is_in_memory() {
            return;
        }
        match file.read_limited(self.limit) {
            Ok(data) => {
                *file = FileHandle::from_bytes(file.entry(), file.name().to_string(), data);
            }
            Err(e) => log::warn!("Keeping {} on disk: {e}", file.name()),
        }
    }
}
