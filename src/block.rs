//! Content framing: an entry body travels as whole 512-byte blocks.

use std::io::prelude::*;

use crate::error::{Error, Result};

/// Size of every record in an archive: headers, content blocks and footers.
pub const BLOCK_SIZE: usize = 512;

/// The two all-zero records that terminate an archive.
pub const FOOTER: [u8; 2 * BLOCK_SIZE] = [0; 2 * BLOCK_SIZE];

/// Number of content blocks needed to carry `len` body bytes.
pub fn content_blocks(len: u64) -> u64 {
    len.div_ceil(BLOCK_SIZE as u64)
}

/// Number of zero bytes that follow `len` body bytes in the last block.
pub fn padding(len: u64) -> usize {
    (content_blocks(len) * BLOCK_SIZE as u64 - len) as usize
}

/// Writes `body` followed by the zero padding completing its last block.
pub fn write_padded<W: Write + ?Sized>(dst: &mut W, body: &[u8]) -> Result<()> {
    dst.write_all(body)?;
    let pad = padding(body.len() as u64);
    if pad > 0 {
        dst.write_all(&[0; BLOCK_SIZE][..pad])?;
    }
    Ok(())
}

/// Reads exactly `blocks` content blocks and returns the first `size` bytes.
///
/// The padding tail of the last block is read from `src` and discarded. Fails
/// with `TruncatedStream` if `src` ends early, and also if `size` claims more
/// bytes than the blocks can hold.
pub fn read_blocks<R: Read + ?Sized>(src: &mut R, blocks: u64, size: u64) -> Result<Vec<u8>> {
    if size > blocks * BLOCK_SIZE as u64 {
        return Err(Error::TruncatedStream("entry size exceeds its content blocks"));
    }
    let mut body = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];
    let mut remaining = size;
    for _ in 0..blocks {
        if !read_record(src, &mut block)? {
            return Err(Error::TruncatedStream("content block cut short"));
        }
        let keep = remaining.min(BLOCK_SIZE as u64) as usize;
        body.extend_from_slice(&block[..keep]);
        remaining -= keep as u64;
    }
    Ok(body)
}

/// Fills `buf` completely from `src`.
///
/// Returns `Ok(false)` without error when `src` ends before `buf` is full so
/// that callers can report a truncation in their own terms.
pub(crate) fn read_record<R: Read + ?Sized>(src: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut read = 0;
    while read < buf.len() {
        match src.read(&mut buf[read..]) {
            Ok(0) => return Ok(false),
            Ok(n) => read += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
