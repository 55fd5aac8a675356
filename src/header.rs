use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::mem;

use crate::block::{self, BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::field::{octal_from, octal_into, text_from, text_into, OctalWidths};
use crate::{EntryType, FileAttrs};

/// Representation of the raw 512-byte ustar header record.
#[repr(C)]
#[derive(Clone, Copy)]
#[allow(missing_docs)]
pub struct UstarHeader {
    pub name: [u8; 100],
    pub mode: [u8; 8],
    pub uid: [u8; 8],
    pub gid: [u8; 8],
    pub size: [u8; 12],
    pub mtime: [u8; 12],
    pub cksum: [u8; 8],
    pub typeflag: [u8; 1],
    pub linkname: [u8; 100],
    pub magic: [u8; 6],
    pub version: [u8; 2],
    pub uname: [u8; 32],
    pub gname: [u8; 32],
    pub dev_major: [u8; 8],
    pub dev_minor: [u8; 8],
    pub prefix: [u8; 155],
    pub pad: [u8; 12],
}

impl UstarHeader {
    const fn zeroed() -> UstarHeader {
        UstarHeader {
            name: [0; 100],
            mode: [0; 8],
            uid: [0; 8],
            gid: [0; 8],
            size: [0; 12],
            mtime: [0; 12],
            cksum: [0; 8],
            typeflag: [0; 1],
            linkname: [0; 100],
            magic: [0; 6],
            version: [0; 2],
            uname: [0; 32],
            gname: [0; 32],
            dev_major: [0; 8],
            dev_minor: [0; 8],
            prefix: [0; 155],
            pad: [0; 12],
        }
    }
}

/// Checksum value stored in, or computed for, a header.
///
/// Displays as a zero-padded hexadecimal number, e.g. `0x00000000000012AB`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Checksum(pub u32);

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

/// A byte count which displays in human readable units, e.g. `1.50KB`.
///
/// Counts below 1024 display as whole bytes (`13B`); larger ones use KB, MB
/// or GB with two decimals, in powers of 1024.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const UNITS: [(u64, &str); 3] = [(1 << 30, "GB"), (1 << 20, "MB"), (1 << 10, "KB")];
        match UNITS.iter().find(|(scale, _)| self.0 >= *scale) {
            Some((scale, unit)) => write!(f, "{:.2}{}", self.0 as f64 / *scale as f64, unit),
            None => write!(f, "{}B", self.0),
        }
    }
}

/// A ustar header record together with the digit widths used to encode its
/// numeric fields.
#[derive(Clone)]
pub struct Header {
    raw: UstarHeader,
    widths: OctalWidths,
}

impl Header {
    /// Creates a new blank ustar header describing an empty regular file.
    ///
    /// The checksum is left unset, see [`Header::set_cksum`].
    pub fn new() -> Header {
        Header::with_widths(OctalWidths::default())
    }

    /// Creates a new blank ustar header which renders its numeric fields with
    /// the digit counts in `widths`.
    pub fn with_widths(widths: OctalWidths) -> Header {
        let mut raw = UstarHeader::zeroed();
        raw.magic = *b"ustar\0";
        raw.version = *b"00";
        raw.typeflag = [EntryType::Regular.as_byte()];
        Header { raw, widths }
    }

    /// Interprets a raw 512-byte record as a header.
    ///
    /// No validation happens here; see [`Header::validate`].
    pub fn from_bytes(bytes: &[u8; BLOCK_SIZE]) -> Header {
        let mut header = Header {
            raw: UstarHeader::zeroed(),
            widths: OctalWidths::default(),
        };
        header.as_mut_bytes().copy_from_slice(bytes);
        header
    }

    /// Returns a view into this header as a byte array.
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        debug_assert_eq!(BLOCK_SIZE, mem::size_of::<UstarHeader>());
        // SAFETY: `UstarHeader` is `repr(C)` and made only of byte arrays, so
        // it has no padding and an alignment of one.
        unsafe { &*(&self.raw as *const UstarHeader as *const [u8; BLOCK_SIZE]) }
    }

    /// Returns a mutable view into this header as a byte array.
    pub fn as_mut_bytes(&mut self) -> &mut [u8; BLOCK_SIZE] {
        debug_assert_eq!(BLOCK_SIZE, mem::size_of::<UstarHeader>());
        // SAFETY: see `as_bytes`; every bit pattern is a valid `UstarHeader`.
        unsafe { &mut *(&mut self.raw as *mut UstarHeader as *mut [u8; BLOCK_SIZE]) }
    }

    /// Returns the raw field layout of this header.
    pub fn as_ustar(&self) -> &UstarHeader {
        &self.raw
    }

    /// Returns the raw field layout of this header for direct modification.
    ///
    /// Nothing is recomputed after changes made through this view.
    pub fn as_ustar_mut(&mut self) -> &mut UstarHeader {
        &mut self.raw
    }

    /// Returns the digit widths used when encoding numeric fields.
    pub fn widths(&self) -> OctalWidths {
        self.widths
    }

    /// Returns whether the magic field identifies this as a ustar header.
    pub fn is_ustar(&self) -> bool {
        &self.raw.magic[..5] == b"ustar"
    }

    /// Returns whether every byte of this record is zero.
    ///
    /// Such a record marks the end of an archive and is never a header.
    pub fn is_footer(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }

    /// Returns the full path stored in this header, lossily decoded as UTF-8.
    pub fn path(&self) -> Cow<str> {
        match self.path_bytes() {
            Cow::Borrowed(b) => String::from_utf8_lossy(b),
            Cow::Owned(b) => Cow::Owned(String::from_utf8_lossy(&b).into_owned()),
        }
    }

    /// Returns the full path stored in this header as bytes.
    ///
    /// When a prefix is present the path is `prefix/name`.
    pub fn path_bytes(&self) -> Cow<[u8]> {
        let name = text_from(&self.raw.name);
        let prefix = text_from(&self.raw.prefix);
        if prefix.is_empty() {
            Cow::Borrowed(name)
        } else {
            let mut bytes = Vec::with_capacity(prefix.len() + 1 + name.len());
            bytes.extend_from_slice(prefix);
            bytes.push(b'/');
            bytes.extend_from_slice(name);
            Cow::Owned(bytes)
        }
    }

    /// Sets the path of this header, splitting it across the name and prefix
    /// fields when it is longer than the name field.
    ///
    /// Leading path components are moved into the prefix one at a time until
    /// the remainder fits. Fails with `NameTooLong` when no split works.
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        let (prefix, name) = split_path(path, self.raw.name.len(), self.raw.prefix.len())?;
        text_into(&mut self.raw.name, name.as_bytes(), "name")?;
        text_into(&mut self.raw.prefix, prefix.as_bytes(), "prefix")?;
        Ok(())
    }

    /// Returns the link name stored in this header, if any.
    pub fn link_name(&self) -> Option<Cow<str>> {
        self.link_name_bytes().map(String::from_utf8_lossy)
    }

    /// Returns the link name stored in this header as bytes, if any.
    pub fn link_name_bytes(&self) -> Option<&[u8]> {
        match text_from(&self.raw.linkname) {
            [] => None,
            bytes => Some(bytes),
        }
    }

    /// Sets the link name of this header. The target is never interpreted.
    pub fn set_link_name(&mut self, target: &str) -> Result<()> {
        text_into(&mut self.raw.linkname, target.as_bytes(), "linkname")
    }

    /// Returns the mode of this entry: the stored permission bits OR'ed with
    /// the file type bits implied by the type flag.
    pub fn mode(&self) -> u32 {
        self.permissions() | self.entry_type().mode_bits()
    }

    /// Returns the permission bits stored in the mode field.
    pub fn permissions(&self) -> u32 {
        (octal_from(&self.raw.mode) & 0o7777) as u32
    }

    /// Encodes the permission, setuid and setgid bits of `mode`.
    ///
    /// File type bits are ignored; see [`Header::set_entry_type`].
    pub fn set_mode(&mut self, mode: u32) -> Result<()> {
        octal_into(&mut self.raw.mode, self.widths.mode, u64::from(mode & 0o6777), "mode")
    }

    /// Returns the value of the owner's user ID field.
    pub fn uid(&self) -> u64 {
        octal_from(&self.raw.uid)
    }

    /// Encodes the `uid` provided into this header.
    pub fn set_uid(&mut self, uid: u64) -> Result<()> {
        octal_into(&mut self.raw.uid, self.widths.uid, uid, "uid")
    }

    /// Returns the value of the group's ID field.
    pub fn gid(&self) -> u64 {
        octal_from(&self.raw.gid)
    }

    /// Encodes the `gid` provided into this header.
    pub fn set_gid(&mut self, gid: u64) -> Result<()> {
        octal_into(&mut self.raw.gid, self.widths.gid, gid, "gid")
    }

    /// Returns the body length recorded in this header.
    pub fn size(&self) -> u64 {
        octal_from(&self.raw.size)
    }

    /// Encodes the `size` argument into the size field of this header.
    ///
    /// Entries keep this field in sync with their body on their own.
    pub fn set_size(&mut self, size: u64) -> Result<()> {
        octal_into(&mut self.raw.size, self.widths.size, size, "size")
    }

    /// Returns the last modification time in seconds since the Unix epoch.
    pub fn mtime(&self) -> u64 {
        octal_from(&self.raw.mtime)
    }

    /// Encodes the `mtime` provided into this header.
    ///
    /// Times before January 1, 1970 are stored as zero.
    pub fn set_mtime(&mut self, mtime: i64) -> Result<()> {
        let secs = u64::try_from(mtime).unwrap_or(0);
        octal_into(&mut self.raw.mtime, self.widths.mtime, secs, "mtime")
    }

    /// Return the username of the owner of this file, if present and if valid
    /// utf8
    pub fn username(&self) -> Option<&str> {
        self.username_bytes().and_then(|s| std::str::from_utf8(s).ok())
    }

    /// Returns the username of the owner of this file, if present
    pub fn username_bytes(&self) -> Option<&[u8]> {
        if self.is_ustar() {
            Some(text_from(&self.raw.uname))
        } else {
            None
        }
    }

    /// Sets the username inside this header.
    ///
    /// May return an error if the name provided is too long.
    pub fn set_username(&mut self, name: &str) -> Result<()> {
        text_into(&mut self.raw.uname, name.as_bytes(), "uname")
    }

    /// Return the group name of the owner of this file, if present and if valid
    /// utf8
    pub fn groupname(&self) -> Option<&str> {
        self.groupname_bytes().and_then(|s| std::str::from_utf8(s).ok())
    }

    /// Returns the group name of the owner of this file, if present
    pub fn groupname_bytes(&self) -> Option<&[u8]> {
        if self.is_ustar() {
            Some(text_from(&self.raw.gname))
        } else {
            None
        }
    }

    /// Sets the group name inside this header.
    ///
    /// May return an error if the name provided is too long.
    pub fn set_groupname(&mut self, name: &str) -> Result<()> {
        text_into(&mut self.raw.gname, name.as_bytes(), "gname")
    }

    /// Returns the device major field. Its contents are not interpreted.
    pub fn device_major(&self) -> &[u8] {
        text_from(&self.raw.dev_major)
    }

    /// Stores `major` verbatim in the device major field.
    pub fn set_device_major(&mut self, major: &str) -> Result<()> {
        text_into(&mut self.raw.dev_major, major.as_bytes(), "devmajor")
    }

    /// Returns the device minor field. Its contents are not interpreted.
    pub fn device_minor(&self) -> &[u8] {
        text_from(&self.raw.dev_minor)
    }

    /// Stores `minor` verbatim in the device minor field.
    pub fn set_device_minor(&mut self, minor: &str) -> Result<()> {
        text_into(&mut self.raw.dev_minor, minor.as_bytes(), "devminor")
    }

    /// Returns the type of file described by this header.
    pub fn entry_type(&self) -> EntryType {
        EntryType::new(self.raw.typeflag[0])
    }

    /// Sets the type of file that will be described by this header.
    pub fn set_entry_type(&mut self, ty: EntryType) {
        self.raw.typeflag = [ty.as_byte()];
    }

    /// Returns whether this header describes a directory.
    pub fn is_dir(&self) -> bool {
        self.entry_type().is_dir()
    }

    /// Returns the number of 512-byte content blocks following this header.
    ///
    /// Only `0` regular and contiguous files carry content; every other type,
    /// the old `\0` regular type included, has none whatever its size field
    /// says.
    pub fn content_blocks(&self) -> u64 {
        if self.entry_type().is_content_bearing() {
            block::content_blocks(self.size())
        } else {
            0
        }
    }

    /// Returns the checksum stored in this header.
    pub fn cksum(&self) -> Checksum {
        Checksum(octal_from(&self.raw.cksum) as u32)
    }

    /// Computes the checksum of this header as it currently stands.
    ///
    /// This is the sum of all 512 bytes with the checksum field counted as if
    /// it held eight spaces.
    pub fn calculate_cksum(&self) -> Checksum {
        let total: u32 = self.as_bytes().iter().map(|b| u32::from(*b)).sum();
        let field: u32 = self.raw.cksum.iter().map(|b| u32::from(*b)).sum();
        Checksum(total - field + 8 * u32::from(b' '))
    }

    /// Sets the checksum field of this header based on the current fields in
    /// this header.
    pub fn set_cksum(&mut self) -> Result<()> {
        let cksum = self.calculate_cksum();
        octal_into(&mut self.raw.cksum, self.widths.cksum, u64::from(cksum.0), "cksum")
    }

    /// Returns whether the stored checksum matches the computed one.
    pub fn validate(&self) -> bool {
        self.cksum() == self.calculate_cksum()
    }

    /// Like [`Header::validate`], but reports a mismatch as an error.
    pub fn verify(&self) -> Result<()> {
        let (stored, computed) = (self.cksum(), self.calculate_cksum());
        if stored == computed {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                stored: stored.0,
                computed: computed.0,
            })
        }
    }

    /// Sets the mode, file type, owner and modification time of this header
    /// from `attrs`. The file type is derived from the type bits of the mode.
    pub fn set_attrs(&mut self, attrs: &FileAttrs) -> Result<()> {
        self.set_mode(attrs.mode)?;
        self.set_entry_type(EntryType::from_mode(attrs.mode));
        self.set_uid(attrs.uid)?;
        self.set_gid(attrs.gid)?;
        self.set_mtime(attrs.mtime)?;
        self.set_username(&attrs.username)?;
        self.set_groupname(&attrs.groupname)
    }

    /// Blanket sets the metadata in this header from the metadata argument
    /// provided.
    ///
    /// This is useful for initializing a `Header` from the OS's metadata from a
    /// file. The size field is left alone.
    pub fn set_metadata(&mut self, meta: &fs::Metadata) -> Result<()> {
        self.set_attrs(&FileAttrs::from(meta))
    }
}

impl Default for Header {
    fn default() -> Header {
        Header::new()
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Header")
            .field("path", &self.path())
            .field("mode", &format_args!("{:o}", self.mode()))
            .field("uid", &self.uid())
            .field("gid", &self.gid())
            .field("size", &self.size())
            .field("mtime", &self.mtime())
            .field("cksum", &format_args!("{}", self.cksum()))
            .field("entry_type", &self.entry_type())
            .finish()
    }
}

/// Splits `path` into a `(prefix, name)` pair fitting fields of the given
/// widths, peeling leading components into the prefix until the rest fits.
fn split_path(path: &str, name_len: usize, prefix_len: usize) -> Result<(&str, &str)> {
    if path.len() <= name_len {
        return Ok(("", path));
    }
    let too_long = || Error::NameTooLong(path.to_string());
    let pos = path
        .match_indices('/')
        .map(|(i, _)| i)
        .find(|i| *i > 0 && path.len() - (i + 1) <= name_len)
        .ok_or_else(too_long)?;
    if pos > prefix_len {
        return Err(too_long());
    }
    Ok((&path[..pos], &path[pos + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_one_block() {
        assert_eq!(mem::size_of::<UstarHeader>(), BLOCK_SIZE);
        assert_eq!(mem::align_of::<UstarHeader>(), 1);
    }

    #[test]
    fn split_points() {
        assert_eq!(split_path("foo", 100, 155).unwrap(), ("", "foo"));

        let exact = "a".repeat(100);
        assert_eq!(split_path(&exact, 100, 155).unwrap(), ("", &exact[..]));

        let path = format!("{}/{}", "d".repeat(10), "f".repeat(100));
        let (prefix, name) = split_path(&path, 100, 155).unwrap();
        assert_eq!(prefix, "d".repeat(10));
        assert_eq!(name, "f".repeat(100));

        let segment = "x".repeat(101);
        assert!(matches!(
            split_path(&segment, 100, 155),
            Err(Error::NameTooLong(_))
        ));
        let deep = format!("{}/{}", "p".repeat(156), "f");
        assert!(split_path(&deep, 100, 155).is_err());

        // an empty prefix would lose the leading slash
        let rooted = format!("/{}", "r".repeat(100));
        assert!(split_path(&rooted, 100, 155).is_err());
        let rooted = format!("/top/{}", "r".repeat(100));
        assert_eq!(split_path(&rooted, 100, 155).unwrap(), ("/top", &rooted[5..]));
    }

    #[test]
    fn checksum_display() {
        assert_eq!(Checksum(0o4253).to_string(), "0x00000000000008AB");
    }

    #[test]
    fn byte_size_display() {
        assert_eq!(ByteSize(0).to_string(), "0B");
        assert_eq!(ByteSize(1023).to_string(), "1023B");
        assert_eq!(ByteSize(1024).to_string(), "1.00KB");
        assert_eq!(ByteSize(1536).to_string(), "1.50KB");
        assert_eq!(ByteSize(5 << 20).to_string(), "5.00MB");
        assert_eq!(ByteSize(3 << 30).to_string(), "3.00GB");
        assert_eq!(ByteSize(2048 << 30).to_string(), "2048.00GB");
    }
}
