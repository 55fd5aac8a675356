// See https://en.wikipedia.org/wiki/Tar_%28computing%29#UStar_format
use std::fmt;

// File type bits of a POSIX `st_mode`, independent of the host platform.
const S_IFMT: u32 = 0o170000;
const S_IFIFO: u32 = 0o010000;
const S_IFCHR: u32 = 0o020000;
const S_IFDIR: u32 = 0o040000;
const S_IFBLK: u32 = 0o060000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

/// Indicate for the type of file described by a header.
///
/// Each `Header` has an `entry_type` method returning an instance of this type
/// which can be used to inspect what the header is describing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntryType {
    /// Regular file
    Regular,
    /// Regular file written by a pre-POSIX archiver (type byte NUL)
    RegularArchived,
    /// Hard link
    Link,
    /// Symbolic link
    Symlink,
    /// Character device
    Char,
    /// Block device
    Block,
    /// Directory
    Directory,
    /// Named pipe (fifo)
    Fifo,
    /// Contiguous file
    Continuous,
    /// Any type byte this crate does not know about
    Other(u8),
}

impl EntryType {
    /// Creates a new entry type from a raw byte.
    pub fn new(byte: u8) -> EntryType {
        match byte {
            b'0' => EntryType::Regular,
            b'\0' => EntryType::RegularArchived,
            b'1' => EntryType::Link,
            b'2' => EntryType::Symlink,
            b'3' => EntryType::Char,
            b'4' => EntryType::Block,
            b'5' => EntryType::Directory,
            b'6' => EntryType::Fifo,
            b'7' => EntryType::Continuous,
            b => EntryType::Other(b),
        }
    }

    /// Returns the raw underlying byte that this entry type represents.
    pub fn as_byte(&self) -> u8 {
        match *self {
            EntryType::Regular => b'0',
            EntryType::RegularArchived => b'\0',
            EntryType::Link => b'1',
            EntryType::Symlink => b'2',
            EntryType::Char => b'3',
            EntryType::Block => b'4',
            EntryType::Directory => b'5',
            EntryType::Fifo => b'6',
            EntryType::Continuous => b'7',
            EntryType::Other(b) => b,
        }
    }

    /// Classifies a POSIX `st_mode` value.
    ///
    /// The type bits are matched in a fixed order, symlink first and regular
    /// file as the fallback when nothing else matches.
    pub fn from_mode(mode: u32) -> EntryType {
        let kind = mode & S_IFMT;
        if kind == S_IFLNK {
            EntryType::Symlink
        } else if kind == S_IFCHR {
            EntryType::Char
        } else if kind == S_IFBLK {
            EntryType::Block
        } else if kind == S_IFDIR {
            EntryType::Directory
        } else if kind == S_IFIFO {
            EntryType::Fifo
        } else {
            EntryType::Regular
        }
    }

    /// Returns the `st_mode` type bits corresponding to this entry type.
    ///
    /// Hard links and unknown types carry no type bits.
    pub fn mode_bits(&self) -> u32 {
        match *self {
            EntryType::Regular | EntryType::RegularArchived | EntryType::Continuous => S_IFREG,
            EntryType::Symlink => S_IFLNK,
            EntryType::Char => S_IFCHR,
            EntryType::Block => S_IFBLK,
            EntryType::Directory => S_IFDIR,
            EntryType::Fifo => S_IFIFO,
            EntryType::Link | EntryType::Other(_) => 0,
        }
    }

    /// Returns whether entries of this type are followed by content blocks.
    ///
    /// Only `0` and `7` are; a pre-POSIX `\0` regular file is a header alone.
    pub fn is_content_bearing(&self) -> bool {
        matches!(*self, EntryType::Regular | EntryType::Continuous)
    }

    /// Returns whether this type represents a regular file.
    pub fn is_file(&self) -> bool {
        matches!(*self, EntryType::Regular | EntryType::RegularArchived)
    }

    /// Returns whether this type represents a hard link.
    pub fn is_hard_link(&self) -> bool {
        *self == EntryType::Link
    }

    /// Returns whether this type represents a symlink.
    pub fn is_symlink(&self) -> bool {
        *self == EntryType::Symlink
    }

    /// Returns whether this type represents a character special device.
    pub fn is_character_special(&self) -> bool {
        *self == EntryType::Char
    }

    /// Returns whether this type represents a block special device.
    pub fn is_block_special(&self) -> bool {
        *self == EntryType::Block
    }

    /// Returns whether this type represents a directory.
    pub fn is_dir(&self) -> bool {
        *self == EntryType::Directory
    }

    /// Returns whether this type represents a FIFO.
    pub fn is_fifo(&self) -> bool {
        *self == EntryType::Fifo
    }

    /// Returns whether this type represents a contiguous file.
    pub fn is_contiguous(&self) -> bool {
        *self == EntryType::Continuous
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            EntryType::Regular => "regular file",
            EntryType::RegularArchived => "regular file (already archived)",
            EntryType::Link => "link",
            EntryType::Symlink => "symbolic link",
            EntryType::Char => "character device",
            EntryType::Block => "block device",
            EntryType::Directory => "directory",
            EntryType::Fifo => "fifo special file",
            EntryType::Continuous => "reserved",
            EntryType::Other(_) => "unknown",
        })
    }
}
