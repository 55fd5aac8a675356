use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while encoding or decoding an archive.
///
/// End-of-archive is not an error: the walker reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// A text or numeric value does not fit the fixed width of its field.
    #[error("value does not fit the `{0}` field")]
    PropertyOverflow(&'static str),

    /// A path cannot be split so that it fits the name and prefix fields.
    #[error("path `{0}` is too long to be stored in a ustar header")]
    NameTooLong(String),

    /// The stream ended before a header or its content blocks were complete.
    #[error("truncated archive: {0}")]
    TruncatedStream(&'static str),

    /// The stored checksum does not match the one computed from the header.
    #[error("header checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        /// Checksum read from the header's checksum field.
        stored: u32,
        /// Checksum computed over the header bytes.
        computed: u32,
    },

    /// No entry in a materialised archive matches the requested name.
    #[error("no entry named `{0}` in archive")]
    NotFound(String),

    /// Writing an entry to the local filesystem failed.
    #[error("failed to unpack `{}`", path.display())]
    Unpack {
        /// Destination that was being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// An I/O error from the underlying reader or writer.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unpack(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::Unpack {
            path: path.into(),
            source,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(e) => e,
            Error::TruncatedStream(_) => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            Error::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, err),
            Error::PropertyOverflow(_) | Error::NameTooLong(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
