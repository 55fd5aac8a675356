//! A library for reading and writing USTAR archives
//!
//! This library encodes and decodes the POSIX USTAR tape-archive format [1]
//! over any reader or writer. An archive is a run of 512-byte records: each
//! entry is a header record followed by its content blocks, and two all-zero
//! records mark the end.
//!
//! Entries are built in memory and written with a [`Builder`]; an [`Archive`]
//! walks a stream lazily, handing back one decoded [`Entry`] at a time. A
//! [`Tree`] holds a whole archive for lookup by path.
//!
//! ```
//! use std::io::Write;
//! use ustar::{Archive, Builder, Entry, FileAttrs};
//!
//! let mut entry = Entry::new("foobar", &FileAttrs::new(0o644)).unwrap();
//! entry.write_all(b"hello world!\n").unwrap();
//!
//! let mut ar = Builder::new(Vec::new());
//! ar.append(&entry).unwrap();
//! let bytes = ar.into_inner().unwrap();
//!
//! let mut ar = Archive::new(&bytes[..]);
//! let entry = ar.next_entry().unwrap().unwrap();
//! assert_eq!(entry.path(), "foobar");
//! assert_eq!(entry.body(), b"hello world!\n");
//! assert!(ar.next_entry().unwrap().is_none());
//! ```
//!
//! [1]: https://pubs.opengroup.org/onlinepubs/9699919799/utilities/pax.html#tag_20_92_13_06

#![deny(missing_docs)]

use std::io;

pub use crate::archive::{Archive, Entries};
pub use crate::block::BLOCK_SIZE;
pub use crate::builder::Builder;
pub use crate::entry::{Entry, FileAttrs};
pub use crate::entry_type::EntryType;
pub use crate::error::{Error, Result};
pub use crate::field::OctalWidths;
pub use crate::header::{ByteSize, Checksum, Header, UstarHeader};
pub use crate::tree::{FileView, Stat, Tree};

mod archive;
pub mod block;
mod builder;
mod entry;
mod entry_type;
mod error;
pub mod field;
mod header;
mod tree;

fn other(msg: &str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, msg))
}
