use std::fs;
use std::io::prelude::*;
use std::marker;
use std::path::{Component, Path};

use log::{debug, trace, warn};

use crate::block::{self, read_record, BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::{other, Entry, Header};

/// A top-level representation of an archive file.
///
/// Entries are decoded lazily, one header at a time, in the order they appear
/// in the underlying reader. The walk is forward-only and happens once: after
/// the end-of-archive record or a fatal error every further request yields
/// nothing.
pub struct Archive<R: Read> {
    obj: R,
    pos: u64,
    done: bool,
    verify_checksums: bool,
    preserve_mtime: bool,
    preserve_permissions: bool,
}

/// An iterator over the entries of an archive.
pub struct Entries<'a, R: 'a + Read> {
    archive: &'a mut Archive<R>,
    _ignored: marker::PhantomData<&'a Archive<R>>,
}

impl<R: Read> Archive<R> {
    /// Create a new archive with the underlying object as the reader.
    pub fn new(obj: R) -> Archive<R> {
        Archive {
            obj,
            pos: 0,
            done: false,
            verify_checksums: false,
            preserve_mtime: true,
            preserve_permissions: true,
        }
    }

    /// Unwrap this archive, returning the underlying object.
    pub fn into_inner(self) -> R {
        self.obj
    }

    /// Indicate whether header checksums are checked while walking.
    ///
    /// This is off by default: headers are taken as they are and callers may
    /// check them with [`Header::validate`]. When on, an entry with a bad
    /// checksum is reported as `ChecksumMismatch`. Its content is consumed
    /// first, so the walk can carry on with the next entry.
    pub fn set_verify_checksums(&mut self, verify: bool) {
        self.verify_checksums = verify;
    }

    /// Indicate whether modification times are restored when unpacking.
    ///
    /// This flag is enabled by default.
    pub fn set_preserve_mtime(&mut self, preserve: bool) {
        self.preserve_mtime = preserve;
    }

    /// Indicate whether permissions are restored when unpacking.
    ///
    /// This flag is enabled by default.
    pub fn set_preserve_permissions(&mut self, preserve: bool) {
        self.preserve_permissions = preserve;
    }

    /// Returns the number of bytes consumed from the underlying reader.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Decodes the next entry of this archive.
    ///
    /// Returns `Ok(None)` once an all-zero record marks the end of the archive.
    /// A stream that ends in the middle of a header or of its content blocks
    /// fails with `TruncatedStream`, after which the walk is over.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        if self.done {
            return Ok(None);
        }
        match self.decode_next() {
            Ok(Some(entry)) => Ok(Some(entry)),
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e @ Error::ChecksumMismatch { .. }) => Err(e),
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Construct an iterator over the entries in this archive.
    ///
    /// The iterator starts where the archive stands, so it fails if entries
    /// were already taken from this archive.
    pub fn entries(&mut self) -> Result<Entries<R>> {
        if self.pos != 0 {
            return Err(other("cannot call entries unless archive is at position 0"));
        }
        Ok(Entries {
            archive: self,
            _ignored: marker::PhantomData,
        })
    }

    /// Unpacks the contents tarball into the specified `dst`.
    ///
    /// This function will iterate over the entire contents of this tarball,
    /// extracting each file in turn to the location specified by the entry's
    /// path name.
    ///
    /// This operation is relatively sensitive in that it will not write files
    /// outside of the path specified by `dst`. Files in the archive which have
    /// a '..' in their path are skipped during the unpacking process.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use ustar::Archive;
    ///
    /// let mut ar = Archive::new(File::open("foo.tar").unwrap());
    /// ar.unpack("foo").unwrap();
    /// ```
    pub fn unpack<P: AsRef<Path>>(&mut self, dst: P) -> Result<()> {
        let dst = dst.as_ref();
        'outer: while let Some(entry) = self.next_entry()? {
            let mut file_dst = dst.to_path_buf();
            {
                let path = entry.path();
                for part in Path::new(&*path).components() {
                    match part {
                        // Leading '/' characters, root paths, and '.'
                        // components are just ignored and treated as "empty
                        // components"
                        Component::Prefix(..) | Component::RootDir | Component::CurDir => continue,

                        // If any part of the filename is '..', then skip over
                        // unpacking the file to prevent directory traversal
                        // security issues.
                        Component::ParentDir => {
                            warn!("skipping `{}`: path leaves the destination", path);
                            continue 'outer;
                        }

                        Component::Normal(part) => file_dst.push(part),
                    }
                }
            }

            // Skip cases where only slashes or '.' parts were seen, because
            // this is effectively an empty filename.
            if *dst == *file_dst {
                continue;
            }

            if let Some(parent) = file_dst.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::unpack(parent, e))?;
            }
            entry.unpack_with(&file_dst, self.preserve_mtime, self.preserve_permissions)?;
        }
        Ok(())
    }

    fn decode_next(&mut self) -> Result<Option<Entry>> {
        let offset = self.pos;
        let mut record = [0u8; BLOCK_SIZE];
        if !read_record(&mut self.obj, &mut record)? {
            return Err(Error::TruncatedStream("header record cut short"));
        }
        self.pos += BLOCK_SIZE as u64;

        // A block of 0s is never valid as a header (because of the
        // checksum), so if it's all zero it must be the first of the two
        // end blocks
        let header = Header::from_bytes(&record);
        if header.is_footer() {
            debug!("end of archive at offset {}", offset);
            return Ok(None);
        }
        trace!("decoded {:?} at offset {}", header, offset);

        let blocks = header.content_blocks();
        let body = if blocks > 0 {
            block::read_blocks(&mut self.obj, blocks, header.size())?
        } else {
            Vec::new()
        };
        self.pos += blocks * BLOCK_SIZE as u64;

        if self.verify_checksums {
            if let Err(e) = header.verify() {
                warn!("bad checksum for `{}` at offset {}", header.path(), offset);
                return Err(e);
            }
        }
        Ok(Some(Entry::decoded(header, body)))
    }
}

impl<'a, R: Read> Iterator for Entries<'a, R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Result<Entry>> {
        self.archive.next_entry().transpose()
    }
}
