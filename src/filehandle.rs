//! Reference-counted handle to an open media file.
//!
//! Cloning a handle adds a reference; dropping one releases it. The playback
//! loop keeps at most one handle in its "current" slot and one in its "pending"
//! slot, and replacing a slot always drops the old handle first.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::PlayerError;
use crate::module_info::EntryId;

/// Chunk size used when a whole file is pulled into memory.
const READ_CHUNK: usize = 16 * 1024;

enum Backing {
    Disk(PathBuf),
    Memory(Rc<[u8]>),
}

struct Inner {
    entry: EntryId,
    name: String,
    backing: Backing,
}

#[derive(Clone)]
pub struct FileHandle(Rc<Inner>);

impl FileHandle {
    /// Open a handle to a file on disk. Fails if the path is not a regular file.
    pub fn open_path(entry: EntryId, path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self(Rc::new(Inner {
            entry,
            name,
            backing: Backing::Disk(path.to_path_buf()),
        })))
    }

    pub fn from_bytes(entry: EntryId, name: impl Into<String>, data: impl Into<Rc<[u8]>>) -> Self {
        Self(Rc::new(Inner {
            entry,
            name: name.into(),
            backing: Backing::Memory(data.into()),
        }))
    }

    pub fn entry(&self) -> EntryId {
        self.0.entry
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.0.backing {
            Backing::Disk(path) => Some(path),
            Backing::Memory(_) => None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.0.backing, Backing::Memory(_))
    }

    /// Number of live references to this file, this one included.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn size(&self) -> io::Result<u64> {
        match &self.0.backing {
            Backing::Disk(path) => Ok(fs::metadata(path)?.len()),
            Backing::Memory(data) => Ok(data.len() as u64),
        }
    }

    /// Read at most `len` bytes from the start of the file.
    pub fn read_head(&self, len: usize) -> io::Result<Vec<u8>> {
        match &self.0.backing {
            Backing::Disk(path) => {
                let mut buf = Vec::with_capacity(len.min(READ_CHUNK));
                File::open(path)?.take(len as u64).read_to_end(&mut buf)?;
                Ok(buf)
            }
            Backing::Memory(data) => Ok(data[..len.min(data.len())].to_vec()),
        }
    }

    /// Read the whole file, growing the buffer one chunk at a time and
    /// refusing files larger than `limit` bytes.
    pub fn read_limited(&self, limit: u64) -> Result<Vec<u8>, PlayerError> {
        let too_large = || PlayerError::TooLarge {
            name: self.name().to_string(),
            limit,
        };

        match &self.0.backing {
            Backing::Memory(data) => {
                if data.len() as u64 > limit {
                    return Err(too_large());
                }
                Ok(data.to_vec())
            }
            Backing::Disk(path) => {
                let mut file = File::open(path)?;
                let mut buffer = Vec::new();
                let mut chunk = vec![0u8; READ_CHUNK];
                loop {
                    let read = file.read(&mut chunk)?;
                    if read == 0 {
                        break;
                    }
                    if (buffer.len() + read) as u64 > limit {
                        return Err(too_large());
                    }
                    buffer.extend_from_slice(&chunk[..read]);
                }
                Ok(buffer)
            }
        }
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("entry", &self.0.entry)
            .field("name", &self.0.name)
            .field("in_memory", &self.is_in_memory())
            .field("refs", &self.ref_count())
            .finish()
    }
}
