//! A fully materialised archive that can be browsed like a directory tree.

use std::io::prelude::*;
use std::io::{self, SeekFrom};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::error::{Error, Result};
use crate::{Archive, Entry, EntryType};

/// Every entry of an archive, held in memory in archive order.
#[derive(Debug)]
pub struct Tree {
    entries: Vec<Entry>,
}

/// File information for one entry of a [`Tree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    /// Cleaned path of the entry inside the archive.
    pub name: String,
    /// Body length in bytes.
    pub size: u64,
    /// Permission bits OR'ed with the file type bits.
    pub mode: u32,
    /// Last modification time.
    pub modified: SystemTime,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// An open handle on one entry of a [`Tree`].
///
/// Every view has its own read position; opening the same entry twice gives
/// two independent cursors.
pub struct FileView<'a> {
    tree: &'a Tree,
    name: String,
    entry: Option<&'a Entry>,
    cursor: io::Cursor<&'a [u8]>,
}

impl Tree {
    /// Reads every entry of the archive in `obj` until its end.
    ///
    /// Fails with the first decoding error, e.g. `TruncatedStream`.
    pub fn read<R: Read>(obj: R) -> Result<Tree> {
        let mut archive = Archive::new(obj);
        let entries = archive.entries()?.collect::<Result<Vec<_>>>()?;
        debug!("materialised {} entries", entries.len());
        Ok(Tree { entries })
    }

    /// Returns the entries of this tree in archive order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Opens the entry whose cleaned path equals the cleaned `name`.
    ///
    /// Names are cleaned lexically: `.` components and repeated slashes are
    /// dropped, `..` removes the preceding component and the result is
    /// relative, so `/a/./b/../c` opens `a/c`. The root (`/`, `.` or the empty
    /// name) opens a directory listing the top-level entries.
    ///
    /// When several entries share a path the first one wins.
    pub fn open(&self, name: &str) -> Result<FileView> {
        let name = clean(name);
        if name.is_empty() {
            return Ok(FileView {
                tree: self,
                name,
                entry: None,
                cursor: io::Cursor::new(&[][..]),
            });
        }
        let entry = self
            .entries
            .iter()
            .find(|e| clean(&e.path()) == name)
            .ok_or_else(|| Error::NotFound(name.clone()))?;
        Ok(FileView {
            tree: self,
            name,
            entry: Some(entry),
            cursor: io::Cursor::new(entry.body()),
        })
    }
}

impl<'a> FileView<'a> {
    /// Returns the cleaned path this view was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry behind this view, or `None` for the root.
    pub fn entry(&self) -> Option<&'a Entry> {
        self.entry
    }

    /// Returns file information for this entry.
    pub fn stat(&self) -> Stat {
        match self.entry {
            Some(entry) => stat(entry),
            None => Stat {
                name: String::new(),
                size: 0,
                mode: EntryType::Directory.mode_bits() | 0o755,
                modified: UNIX_EPOCH,
                is_dir: true,
            },
        }
    }

    /// Lists the direct children of this entry in archive order.
    ///
    /// Entries that aren't directories have no children.
    pub fn read_dir(&self) -> Vec<Stat> {
        if self.entry.is_some_and(|e| !e.header().is_dir()) {
            return Vec::new();
        }
        self.tree
            .entries
            .iter()
            .filter(|e| {
                let path = clean(&e.path());
                !path.is_empty() && parent(&path) == self.name
            })
            .map(stat)
            .collect()
    }
}

impl<'a> Read for FileView<'a> {
    fn read(&mut self, into: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(into)
    }
}

impl<'a> Seek for FileView<'a> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

fn stat(entry: &Entry) -> Stat {
    let header = entry.header();
    Stat {
        name: clean(&entry.path()),
        size: entry.size(),
        mode: header.mode(),
        modified: UNIX_EPOCH + Duration::from_secs(header.mtime()),
        is_dir: header.is_dir(),
    }
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Lexically cleans an archive path into a relative, slash-separated form.
fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    parts.join("/")
}
