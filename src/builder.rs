use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Component, Path};

use log::debug;

use crate::block::FOOTER;
use crate::error::Result;
use crate::field::OctalWidths;
use crate::{other, Entry, FileAttrs};

/// A structure for building archives
///
/// This structure has methods for building up an archive from scratch into any
/// arbitrary writer.
pub struct Builder<W: Write> {
    widths: OctalWidths,
    finished: bool,
    obj: Option<W>,
}

impl<W: Write> Builder<W> {
    /// Create a new archive builder with the underlying object as the
    /// destination of all data written.
    pub fn new(obj: W) -> Builder<W> {
        Builder {
            widths: OctalWidths::default(),
            finished: false,
            obj: Some(obj),
        }
    }

    fn inner(&mut self) -> Result<&mut W> {
        self.obj
            .as_mut()
            .ok_or_else(|| other("archive builder was already consumed"))
    }

    /// Changes the digit widths used for the numeric fields of headers this
    /// builder creates. Entries passed to `append` keep their own.
    pub fn set_octal_widths(&mut self, widths: OctalWidths) {
        self.widths = widths;
    }

    /// Unwrap this archive, returning the underlying object.
    ///
    /// This function will finish writing the archive if the `finish` function
    /// hasn't yet been called, returning any I/O error which happens during
    /// that operation.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        self.obj
            .take()
            .ok_or_else(|| other("archive builder was already consumed"))
    }

    /// Adds a complete entry to this archive: its header record followed by
    /// its zero-padded content blocks.
    ///
    /// Note that this will not attempt to seek the archive to a valid position,
    /// so if the archive is in the middle of a read or some other similar
    /// operation then this may corrupt the archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Write;
    /// use ustar::{Builder, Entry, FileAttrs};
    ///
    /// let mut entry = Entry::new("foo", &FileAttrs::new(0o644)).unwrap();
    /// entry.write_all(&[1, 2, 3, 4]).unwrap();
    ///
    /// let mut ar = Builder::new(Vec::new());
    /// ar.append(&entry).unwrap();
    /// let data = ar.into_inner().unwrap();
    /// assert_eq!(data.len(), 4 * 512);
    /// ```
    pub fn append(&mut self, entry: &Entry) -> Result<()> {
        debug!("appending `{}` ({} bytes)", entry.path(), entry.size());
        entry.write_to(self.inner()?)
    }

    /// Adds a new entry named `path` with the attributes `attrs` and the
    /// contents of `data`.
    ///
    /// The size and checksum are computed from what `data` yields. Entry types
    /// which carry no content accept only an empty reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use ustar::{Builder, FileAttrs};
    ///
    /// let data: &[u8] = &[1, 2, 3, 4];
    ///
    /// let mut ar = Builder::new(Vec::new());
    /// ar.append_data("really/long/path/to/foo", &FileAttrs::new(0o644), data).unwrap();
    /// let data = ar.into_inner().unwrap();
    /// ```
    pub fn append_data<R: Read>(&mut self, path: &str, attrs: &FileAttrs, mut data: R) -> Result<()> {
        let mut entry = Entry::with_widths(path, attrs, self.widths)?;
        io::copy(&mut data, &mut entry)?;
        self.append(&entry)
    }

    /// Adds a file on the local filesystem to this archive.
    ///
    /// The path name for the file inside of this archive will be the same as
    /// `path`, which must be valid UTF-8. Symbolic links are not followed;
    /// their target is recorded as the link name instead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ustar::Builder;
    ///
    /// let mut ar = Builder::new(Vec::new());
    ///
    /// ar.append_path("foo/bar.txt").unwrap();
    /// ```
    pub fn append_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let name = archive_name("", path)?;
        self.append_path_with_name(path, &name)
    }

    /// Adds a file on the local filesystem to this archive under the name
    /// `name`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ustar::Builder;
    ///
    /// let mut ar = Builder::new(Vec::new());
    ///
    /// // Insert the file at one location into the archive with a different
    /// // name.
    /// ar.append_path_with_name("foo/bar/baz.txt", "bar/baz.txt").unwrap();
    /// ```
    pub fn append_path_with_name<P: AsRef<Path>>(&mut self, path: P, name: &str) -> Result<()> {
        let path = path.as_ref();
        let meta = fs::symlink_metadata(path)?;
        self.append_fs(path, &meta, name)
    }

    /// Adds a directory and all of its contents (recursively) to this archive
    /// with the given path as the name of the directory in the archive.
    ///
    /// Directories come before their contents and siblings are added in name
    /// order. An empty `name` puts the contents at the archive root.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ustar::Builder;
    ///
    /// let mut ar = Builder::new(Vec::new());
    ///
    /// // Use the directory at one location, but insert it into the archive
    /// // with a different name.
    /// ar.append_dir_all("bardir", ".").unwrap();
    /// ```
    pub fn append_dir_all<P: AsRef<Path>>(&mut self, name: &str, src_path: P) -> Result<()> {
        let src_path = src_path.as_ref();
        let mut stack = vec![src_path.to_path_buf()];
        while let Some(src) = stack.pop() {
            let rel = src
                .strip_prefix(src_path)
                .map_err(|_| other("walked outside of the source directory"))?;
            let dest = archive_name(name, rel)?;
            let meta = fs::symlink_metadata(&src)?;
            if meta.is_dir() {
                let mut children = fs::read_dir(&src)?
                    .map(|e| e.map(|e| e.path()))
                    .collect::<io::Result<Vec<_>>>()?;
                children.sort();
                stack.extend(children.into_iter().rev());
                if dest.is_empty() {
                    continue;
                }
            }
            self.append_fs(&src, &meta, &dest)?;
        }
        Ok(())
    }

    fn append_fs(&mut self, src: &Path, meta: &fs::Metadata, name: &str) -> Result<()> {
        let attrs = FileAttrs::from(meta);
        let file_type = meta.file_type();
        if file_type.is_file() {
            self.append_data(name, &attrs, fs::File::open(src)?)
        } else if file_type.is_symlink() {
            let target = fs::read_link(src)?;
            let target = target
                .to_str()
                .ok_or_else(|| other("symlink target is not valid UTF-8"))?;
            let mut entry = Entry::with_widths(name, &attrs, self.widths)?;
            entry.set_link_name(target)?;
            self.append(&entry)
        } else {
            // directories, fifos and device nodes are a header alone
            self.append_data(name, &attrs, io::empty())
        }
    }

    /// Finish writing this archive, emitting the two zero records which
    /// terminate it.
    ///
    /// Calling this more than once has no further effect. It is called on drop
    /// if it wasn't called before, but errors are lost that way, so the
    /// `into_inner` method should be preferred.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        debug!("finishing archive");
        self.inner()?.write_all(&FOOTER)?;
        Ok(())
    }
}

impl<W: Write> Drop for Builder<W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

/// Joins `base` and the normal components of `rel` with `/` separators.
fn archive_name(base: &str, rel: &Path) -> Result<String> {
    let mut name = base.trim_end_matches('/').to_string();
    for part in rel.components() {
        if let Component::Normal(part) = part {
            let part = part
                .to_str()
                .ok_or_else(|| other("path is not valid UTF-8"))?;
            if !name.is_empty() {
                name.push('/');
            }
            name.push_str(part);
        }
    }
    Ok(name)
}
