//! Directory listing behind the interactive selector.
//!
//! Shows the parent entry, subdirectories, play-list files and files with a
//! known module extension. Typing after `/` narrows the listing with a fuzzy
//! match on the name, best match first.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::m3u;
use super::scan::{is_hidden_file, should_skip_directory};
use crate::mdb::Detector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemKind {
    Parent,
    Directory,
    Playlist,
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserItem {
    pub kind: ItemKind,
    pub path: PathBuf,
    pub name: String,
}

pub struct Browser {
    pub cwd: PathBuf,
    pub items: Vec<BrowserItem>,
    pub filtered_indices: Vec<usize>,
    pub selected: usize,
    pub search_query: String,
    pub searching: bool,
    matcher: SkimMatcherV2,
}

impl Default for Browser {
    fn default() -> Self {
        Self::new()
    }
}

impl Browser {
    pub fn new() -> Self {
        Self {
            cwd: PathBuf::new(),
            items: Vec::new(),
            filtered_indices: Vec::new(),
            selected: 0,
            search_query: String::new(),
            searching: false,
            matcher: SkimMatcherV2::default(),
        }
    }

    pub fn read_dir(&mut self, dir: &Path, detector: &Detector) -> io::Result<()> {
        let mut items = Vec::new();
        if let Some(parent) = dir.parent() {
            items.push(BrowserItem {
                kind: ItemKind::Parent,
                path: parent.to_path_buf(),
                name: "..".to_string(),
            });
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if is_hidden_file(&path) {
                continue;
            }
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };

            let kind = if path.is_dir() {
                if should_skip_directory(&name) {
                    continue;
                }
                ItemKind::Directory
            } else if m3u::is_playlist(&path) {
                ItemKind::Playlist
            } else if detector.knows_extension(&name) {
                ItemKind::Module
            } else {
                continue;
            };
            items.push(BrowserItem { kind, path, name });
        }

        items.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        log::debug!("Listed {} entries in {}", items.len(), dir.display());
        self.cwd = dir.to_path_buf();
        self.items = items;
        self.selected = 0;
        self.search_query.clear();
        self.searching = false;
        self.filter_items();
        Ok(())
    }

    /// Go to the parent directory with the directory we left selected.
    pub fn enter_parent(&mut self, detector: &Detector) -> io::Result<()> {
        let Some(parent) = self.cwd.parent().map(Path::to_path_buf) else {
            return Ok(());
        };
        let left = self.cwd.clone();
        self.read_dir(&parent, detector)?;
        if let Some(index) = self.filtered_indices.iter().position(|&i| self.items[i].path == left) {
            self.selected = index;
        }
        Ok(())
    }

    pub fn start_search(&mut self) {
        self.searching = true;
    }

    pub fn end_search(&mut self) {
        self.searching = false;
    }

    pub fn push_char(&mut self, c: char) {
        self.search_query.push(c);
        self.filter_items();
    }

    pub fn pop_char(&mut self) {
        self.search_query.pop();
        self.filter_items();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.searching = false;
        self.filter_items();
    }

    fn filter_items(&mut self) {
        if self.search_query.is_empty() {
            self.filtered_indices = (0..self.items.len()).collect();
        } else {
            let mut scored: Vec<(usize, i64)> = self
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.kind != ItemKind::Parent)
                .filter_map(|(idx, item)| {
                    self.matcher
                        .fuzzy_match(&item.name, &self.search_query)
                        .map(|score| (idx, score))
                })
                .collect();

            scored.sort_by(|a, b| b.1.cmp(&a.1));
            self.filtered_indices = scored.into_iter().map(|(idx, _)| idx).collect();
        }

        if self.selected >= self.filtered_indices.len() {
            self.selected = 0;
        }
    }

    pub fn select_next(&mut self) {
        if !self.filtered_indices.is_empty() {
            self.selected = (self.selected + 1) % self.filtered_indices.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.filtered_indices.is_empty() {
            if self.selected == 0 {
                self.selected = self.filtered_indices.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.filtered_indices.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&BrowserItem> {
        self.filtered_indices
            .get(self.selected)
            .and_then(|&idx| self.items.get(idx))
    }

    pub fn visible_items(&self) -> Vec<&BrowserItem> {
        self.filtered_indices
            .iter()
            .filter_map(|&idx| self.items.get(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn listing() -> (TempDir, Browser, Detector) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("Zeta")).unwrap();
        fs::create_dir(root.join("alpha")).unwrap();
        fs::write(root.join("beta.ay"), b"x").unwrap();
        fs::write(root.join("Gamma.mp3"), b"x").unwrap();
        fs::write(root.join("mix.m3u"), b"beta.ay\n").unwrap();
        fs::write(root.join("readme.txt"), b"x").unwrap();
        fs::write(root.join(".secret.ay"), b"x").unwrap();

        let detector = Detector::from_config(&Config::new());
        let mut browser = Browser::new();
        browser.read_dir(root, &detector).unwrap();
        (temp_dir, browser, detector)
    }

    #[test]
    fn test_listing_order() {
        let (_temp_dir, browser, _) = listing();
        let names: Vec<&str> = browser.visible_items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["..", "alpha", "Zeta", "mix.m3u", "beta.ay", "Gamma.mp3"]);
    }

    #[test]
    fn test_navigation() {
        let (_temp_dir, mut browser, _) = listing();

        assert_eq!(browser.selected, 0);
        browser.select_next();
        assert_eq!(browser.selected, 1);
        browser.select_previous();
        browser.select_previous();
        assert_eq!(browser.selected, 5);
        browser.select_next();
        assert_eq!(browser.selected, 0);
        browser.select_last();
        assert_eq!(browser.selected_item().unwrap().name, "Gamma.mp3");
    }

    #[test]
    fn test_fuzzy_search() {
        let (_temp_dir, mut browser, _) = listing();

        browser.start_search();
        browser.push_char('g');
        browser.push_char('m');
        let names: Vec<&str> = browser.visible_items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma.mp3"]);

        browser.clear_search();
        assert_eq!(browser.visible_items().len(), 6);
        assert!(!browser.searching);
    }

    #[test]
    fn test_enter_parent_selects_previous_directory() {
        let (temp_dir, mut browser, detector) = listing();
        let alpha = temp_dir.path().join("alpha");
        browser.read_dir(&alpha, &detector).unwrap();
        assert_eq!(browser.visible_items().len(), 1);

        browser.enter_parent(&detector).unwrap();
        assert_eq!(browser.cwd, temp_dir.path());
        assert_eq!(browser.selected_item().unwrap().name, "alpha");
    }
}
