#[cfg(unix)]
use std::os::unix::prelude::*;

use std::borrow::Cow;
use std::cmp;
use std::fs;
use std::io::prelude::*;
use std::io::{self, SeekFrom};
use std::path::Path;

use filetime::FileTime;
use log::{debug, warn};

use crate::block;
use crate::error::{Error, Result};
use crate::field::OctalWidths;
use crate::{EntryType, Header};

/// Attributes of a file about to be added to an archive.
///
/// `mode` is an `st_mode`-style value: its permission bits end up in the mode
/// field and its file type bits, if any, select the entry type. A mode without
/// type bits describes a regular file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileAttrs {
    /// Permission bits, optionally OR'ed with file type bits.
    pub mode: u32,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
    /// Numeric owner id.
    pub uid: u64,
    /// Numeric group id.
    pub gid: u64,
    /// Symbolic owner name.
    pub username: String,
    /// Symbolic group name.
    pub groupname: String,
}

impl FileAttrs {
    /// Attributes with the given mode and everything else zeroed.
    pub fn new(mode: u32) -> FileAttrs {
        FileAttrs {
            mode,
            ..FileAttrs::default()
        }
    }
}

impl From<&fs::Metadata> for FileAttrs {
    #[cfg(unix)]
    fn from(meta: &fs::Metadata) -> FileAttrs {
        FileAttrs {
            mode: meta.mode(),
            mtime: FileTime::from_last_modification_time(meta).unix_seconds(),
            uid: u64::from(meta.uid()),
            gid: u64::from(meta.gid()),
            ..FileAttrs::default()
        }
    }

    #[cfg(not(unix))]
    fn from(meta: &fs::Metadata) -> FileAttrs {
        FileAttrs {
            mode: approximate_mode(meta),
            mtime: FileTime::from_last_modification_time(meta).unix_seconds(),
            ..FileAttrs::default()
        }
    }
}

// There's no concept of a mode off unix, so do a best approximation here.
#[cfg(not(unix))]
fn approximate_mode(meta: &fs::Metadata) -> u32 {
    let readonly = meta.permissions().readonly();
    let ft = meta.file_type();
    let (kind, perm) = if ft.is_symlink() {
        (EntryType::Symlink, 0o777)
    } else if ft.is_dir() {
        (EntryType::Directory, if readonly { 0o555 } else { 0o755 })
    } else {
        (EntryType::Regular, if readonly { 0o444 } else { 0o644 })
    };
    kind.mode_bits() | perm
}

/// One member of an archive: a header plus the body it describes.
///
/// Entries built with [`Entry::new`] are filled through their [`Write`]
/// implementation. The size and checksum fields of the header are derived from
/// the body after every write and can't be set any other way. Entries yielded
/// by an [`Archive`](crate::Archive) are read-only.
///
/// Reads, writes and seeks share one cursor over the body, independent of the
/// archive the entry came from.
pub struct Entry {
    header: Header,
    body: Vec<u8>,
    pos: u64,
    writable: bool,
}

impl Entry {
    /// Creates an empty entry named `path` for writing.
    ///
    /// Fails with `NameTooLong` if the path can't be split to fit the header,
    /// or with `PropertyOverflow` if one of `attrs` doesn't fit its field.
    pub fn new(path: &str, attrs: &FileAttrs) -> Result<Entry> {
        Entry::with_widths(path, attrs, OctalWidths::default())
    }

    /// Like [`Entry::new`], rendering numeric fields with `widths`.
    pub fn with_widths(path: &str, attrs: &FileAttrs, widths: OctalWidths) -> Result<Entry> {
        let mut header = Header::with_widths(widths);
        header.set_path(path)?;
        header.set_attrs(attrs)?;
        header.set_size(0)?;
        header.set_cksum()?;
        Ok(Entry {
            header,
            body: Vec::new(),
            pos: 0,
            writable: true,
        })
    }

    /// Wraps a decoded header and its body, already cut to the header's size.
    pub(crate) fn decoded(header: Header, body: Vec<u8>) -> Entry {
        debug_assert!(!header.entry_type().is_content_bearing() || body.len() as u64 == header.size());
        Entry {
            header,
            body,
            pos: 0,
            writable: false,
        }
    }

    /// Returns access to the header of this entry.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the path name for this entry.
    pub fn path(&self) -> Cow<str> {
        self.header.path()
    }

    /// Records `target` as the link name of this entry.
    ///
    /// The target is stored verbatim. Entries read from an archive can't be
    /// changed.
    pub fn set_link_name(&mut self, target: &str) -> Result<()> {
        if !self.writable {
            return Err(read_only().into());
        }
        self.header.set_link_name(target)?;
        self.header.set_cksum()
    }

    /// Returns the body length, which is also what the size field records
    /// for regular files.
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }

    /// Returns the body of this entry.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes this entry, returning its body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Returns a fresh read/seek cursor over the body, starting at offset 0.
    pub fn reader(&self) -> io::Cursor<&[u8]> {
        io::Cursor::new(&self.body)
    }

    /// Serializes this entry: the header record followed by its content
    /// blocks, the last of which is zero padded.
    pub fn encode(&self) -> Vec<u8> {
        let blocks = self.header.content_blocks() as usize;
        let mut out = Vec::with_capacity((1 + blocks) * block::BLOCK_SIZE);
        out.extend_from_slice(self.header.as_bytes());
        if blocks > 0 {
            out.extend_from_slice(&self.body);
            out.resize((1 + blocks) * block::BLOCK_SIZE, 0);
        }
        out
    }

    /// Writes the serialized form of this entry to `dst`.
    pub fn write_to<W: Write + ?Sized>(&self, dst: &mut W) -> Result<()> {
        dst.write_all(self.header.as_bytes())?;
        if self.header.content_blocks() > 0 {
            block::write_padded(dst, &self.body)?;
        }
        Ok(())
    }

    /// Writes this entry to the specified location on the local filesystem.
    ///
    /// Regular files are written with their permissions and modification
    /// time, directories are created and FIFOs are created on unix. Links and
    /// device nodes are skipped. Intermediate directories must already exist.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use ustar::Archive;
    ///
    /// let mut ar = Archive::new(File::open("foo.tar").unwrap());
    ///
    /// let mut i = 0;
    /// while let Some(entry) = ar.next_entry().unwrap() {
    ///     entry.unpack(format!("file-{}", i)).unwrap();
    ///     i += 1;
    /// }
    /// ```
    pub fn unpack<P: AsRef<Path>>(&self, dst: P) -> Result<()> {
        self.unpack_with(dst.as_ref(), true, true)
    }

    pub(crate) fn unpack_with(&self, dst: &Path, mtime: bool, perms: bool) -> Result<()> {
        let kind = self.header.entry_type();
        match kind {
            EntryType::Directory => {
                // If the directory already exists just let it slide
                if fs::metadata(dst).map(|m| m.is_dir()).unwrap_or(false) {
                    return Ok(());
                }
                return fs::create_dir(dst).map_err(|e| Error::unpack(dst, e));
            }
            EntryType::Link | EntryType::Symlink | EntryType::Char | EntryType::Block => {
                warn!("skipping {} `{}`", kind, self.path());
                return Ok(());
            }
            EntryType::Fifo => {
                if !mkfifo(dst, self.header.permissions()).map_err(|e| Error::unpack(dst, e))? {
                    warn!("skipping {} `{}`", kind, self.path());
                    return Ok(());
                }
            }
            // A POSIX-compliant implementation must treat any unrecognized
            // typeflag value as a regular file.
            _ => fs::write(dst, &self.body).map_err(|e| Error::unpack(dst, e))?,
        }
        debug!("unpacked `{}` to {}", self.path(), dst.display());

        if mtime {
            let mtime = FileTime::from_unix_time(self.header.mtime() as i64, 0);
            filetime::set_file_mtime(dst, mtime).map_err(|e| Error::unpack(dst, e))?;
        }
        if perms {
            set_perms(dst, self.header.permissions()).map_err(|e| Error::unpack(dst, e))?;
        }
        Ok(())
    }

    fn check_writable(&self) -> io::Result<()> {
        if !self.writable {
            return Err(read_only());
        }
        let kind = self.header.entry_type();
        if !kind.is_content_bearing() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("a {} entry carries no content", kind),
            ));
        }
        Ok(())
    }
}

impl Read for Entry {
    fn read(&mut self, into: &mut [u8]) -> io::Result<usize> {
        let start = cmp::min(self.pos, self.body.len() as u64) as usize;
        let avail = &self.body[start..];
        let amt = cmp::min(avail.len(), into.len());
        into[..amt].copy_from_slice(&avail[..amt]);
        self.pos += amt as u64;
        Ok(amt)
    }
}

impl Write for Entry {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_writable()?;
        let start = usize::try_from(self.pos)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "position out of range"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "write past the largest position")
            })?;
        let len = cmp::max(end, self.body.len());

        // Record the new size before touching the body so a size that doesn't
        // fit its field leaves the entry unchanged.
        self.header.set_size(len as u64)?;
        if len > self.body.len() {
            self.body.resize(len, 0);
        }
        self.body[start..end].copy_from_slice(buf);
        self.header.set_cksum()?;
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Entry {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(n) => {
                self.pos = n;
                return Ok(n);
            }
            SeekFrom::Current(n) => (self.pos, n),
            SeekFrom::End(n) => (self.body.len() as u64, n),
        };
        match base.checked_add_signed(offset) {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("header", &self.header)
            .field("pos", &self.pos)
            .field("writable", &self.writable)
            .finish()
    }
}

fn read_only() -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        "entries read from an archive are read-only",
    )
}

#[cfg(unix)]
fn mkfifo(dst: &Path, mode: u32) -> io::Result<bool> {
    let path = std::ffi::CString::new(dst.as_os_str().as_bytes())?;
    // SAFETY: `path` is a valid NUL-terminated string for the whole call.
    if unsafe { libc::mkfifo(path.as_ptr(), mode as libc::mode_t) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(true)
}

#[cfg(not(unix))]
fn mkfifo(_dst: &Path, _mode: u32) -> io::Result<bool> {
    Ok(false)
}

#[cfg(unix)]
fn set_perms(dst: &Path, mode: u32) -> io::Result<()> {
    fs::set_permissions(dst, fs::Permissions::from_mode(mode))
}

#[cfg(windows)]
fn set_perms(dst: &Path, mode: u32) -> io::Result<()> {
    let mut perm = fs::metadata(dst)?.permissions();
    perm.set_readonly(mode & 0o200 != 0o200);
    fs::set_permissions(dst, perm)
}

#[cfg(not(any(unix, windows)))]
fn set_perms(_dst: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
