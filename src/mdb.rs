//! Module-info detection.
//!
//! Signatures in the first bytes of a file win over the extension table from
//! the config; a file matching neither gets the unknown type tag and is purged
//! by the selector coordinator when it comes up.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::config::{Config, FileType};
use crate::constants::DETECT_HEAD_LEN;
use crate::filehandle::FileHandle;
use crate::module_info::{ModuleInfo, ModuleType};
use crate::players::ay::{self, AyHeader};
use crate::players::mpeg::{self, FrameHeader};
use crate::players::opl::{self, OplTune};

pub struct Detector {
    extensions: HashMap<String, ModuleType>,
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn sniff_ay(head: &[u8], info: &mut ModuleInfo) -> bool {
    if !head.starts_with(ay::MAGIC) {
        return false;
    }
    info.mod_type = ModuleType::new("AY");
    if let Ok(header) = AyHeader::parse(head) {
        let first = &header.songs[header.first_song];
        info.title = first.name.clone();
        info.composer = header.author;
        info.comment = header.misc;
        info.playtime = first.length;
    }
    true
}

fn sniff_opl(name: &str, head: &[u8], info: &mut ModuleInfo) -> bool {
    let tag = if head.starts_with(opl::DRO_MAGIC) {
        "DRO"
    } else if head.starts_with(opl::RAD_MAGIC) {
        "RAD"
    } else {
        return false;
    };
    info.mod_type = ModuleType::new(tag);
    if let Ok(tune) = OplTune::parse(name, head) {
        info.playtime = tune.length;
    }
    true
}

fn sniff_mpeg(head: &[u8], info: &mut ModuleInfo) -> bool {
    if mpeg::id3v2_len(head) > 0 {
        let tags = mpeg::read_id3v2(head);
        info.title = tags.title.unwrap_or_default();
        info.composer = tags.artist.unwrap_or_default();
    } else if FrameHeader::parse(head).is_none() {
        return false;
    }
    info.mod_type = ModuleType::new("MPx");
    true
}

impl Detector {
    pub fn new(filetypes: &[FileType]) -> Self {
        let mut extensions = HashMap::new();
        for filetype in filetypes {
            for ext in &filetype.extensions {
                extensions.insert(ext.to_ascii_lowercase(), filetype.mod_type.clone());
            }
        }
        Self { extensions }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.filetypes)
    }

    pub fn knows_extension(&self, name: &str) -> bool {
        extension_of(name).is_some_and(|ext| self.extensions.contains_key(&ext))
    }

    /// Build the metadata for `name` from the first bytes of its content.
    pub fn detect(&self, name: &str, head: &[u8]) -> ModuleInfo {
        let mut info = ModuleInfo::new(name, ModuleType::unknown());
        if sniff_ay(head, &mut info) || sniff_opl(name, head, &mut info) || sniff_mpeg(head, &mut info) {
            return info;
        }
        if let Some(mod_type) = extension_of(name).and_then(|ext| self.extensions.get(&ext)) {
            info.mod_type = mod_type.clone();
        }
        info
    }

    pub fn detect_file(&self, file: &FileHandle) -> io::Result<ModuleInfo> {
        let head = file.read_head(DETECT_HEAD_LEN)?;
        let mut info = self.detect(file.name(), &head);
        info.entry = file.entry();
        Ok(info)
    }

    pub fn detect_path(&self, path: &Path) -> io::Result<ModuleInfo> {
        let file = FileHandle::open_path(Default::default(), path)?;
        self.detect_file(&file)
    }
}
