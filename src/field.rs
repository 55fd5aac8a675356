//! Fixed-width header fields.
//!
//! Every field of a ustar header is a byte array of fixed width holding either
//! an ASCII octal number or NUL-padded text. Numbers are written left-aligned
//! and zero-padded to a minimum digit count; the bytes after the digits stay
//! zero and no terminator is required. The digit count is chosen per field and
//! is independent of the field's width, see [`OctalWidths`].

use crate::error::{Error, Result};

/// Minimum number of octal digits rendered into each numeric header field.
///
/// The defaults reproduce the classic layout of this format: seven digits for
/// the mode, owner ids, size and checksum and eleven digits for the
/// modification time. A value that needs more digits than the minimum is still
/// accepted as long as the rendering fits the field's width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctalWidths {
    /// Digits for the 8-byte mode field.
    pub mode: usize,
    /// Digits for the 8-byte owner id field.
    pub uid: usize,
    /// Digits for the 8-byte group id field.
    pub gid: usize,
    /// Digits for the 12-byte size field.
    pub size: usize,
    /// Digits for the 12-byte modification time field.
    pub mtime: usize,
    /// Digits for the 8-byte checksum field.
    pub cksum: usize,
}

impl Default for OctalWidths {
    fn default() -> OctalWidths {
        OctalWidths {
            mode: 7,
            uid: 7,
            gid: 7,
            size: 7,
            mtime: 11,
            cksum: 7,
        }
    }
}

/// Renders `val` as octal into the front of `dst`, zero-padded to `digits`.
///
/// The remaining bytes of `dst` are cleared. Fails with `PropertyOverflow`
/// naming `field` when the rendering is wider than `dst`.
pub fn octal_into(dst: &mut [u8], digits: usize, val: u64, field: &'static str) -> Result<()> {
    let o = format!("{:0width$o}", val, width = digits);
    if o.len() > dst.len() {
        return Err(Error::PropertyOverflow(field));
    }
    let (head, tail) = dst.split_at_mut(o.len());
    head.copy_from_slice(o.as_bytes());
    tail.fill(0);
    Ok(())
}

/// Parses the run of octal digits at the start of `src`.
///
/// Leading spaces are skipped and anything after the digit run (NULs, spaces
/// or garbage) is ignored. A field without digits decodes to zero, as does a
/// run too long to fit in 64 bits.
pub fn octal_from(src: &[u8]) -> u64 {
    src.iter()
        .skip_while(|b| **b == b' ')
        .take_while(|b| (b'0'..=b'7').contains(*b))
        .try_fold(0u64, |acc, b| {
            acc.checked_mul(8)?.checked_add(u64::from(b - b'0'))
        })
        .unwrap_or(0)
}

/// Copies `bytes` into `dst` left-justified, zero-filling the rest.
///
/// A value exactly as wide as the field is stored without a terminating NUL.
/// Fails with `PropertyOverflow` naming `field` if the value is wider than the
/// field or contains a NUL byte of its own.
pub fn text_into(dst: &mut [u8], bytes: &[u8], field: &'static str) -> Result<()> {
    if bytes.len() > dst.len() || bytes.contains(&0) {
        return Err(Error::PropertyOverflow(field));
    }
    let (head, tail) = dst.split_at_mut(bytes.len());
    head.copy_from_slice(bytes);
    tail.fill(0);
    Ok(())
}

/// Returns the text stored in `src` with trailing NUL bytes removed.
pub fn text_from(src: &[u8]) -> &[u8] {
    let end = src.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    &src[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octal_zero_padded_at_front() {
        let mut f = [0xffu8; 8];
        octal_into(&mut f, 7, 0o644, "mode").unwrap();
        assert_eq!(&f, b"0000644\0");

        let mut f = [0u8; 12];
        octal_into(&mut f, 11, 1_000_000_000, "mtime").unwrap();
        assert_eq!(&f, b"07346545000\0");
    }

    #[test]
    fn octal_fills_whole_field_without_terminator() {
        let mut f = [0u8; 12];
        octal_into(&mut f, 7, 0o7777_7777_7777, "size").unwrap();
        assert_eq!(&f, b"777777777777");
        assert_eq!(octal_from(&f), 0o7777_7777_7777);

        assert!(matches!(
            octal_into(&mut f, 7, 0o1_0000_0000_0000, "size"),
            Err(Error::PropertyOverflow("size"))
        ));
    }

    #[test]
    fn octal_decoding_is_lenient() {
        assert_eq!(octal_from(b"0000644\0"), 0o644);
        assert_eq!(octal_from(b"  644 \0\0"), 0o644);
        assert_eq!(octal_from(b"0000015\0\0\0\0\0"), 13);
        assert_eq!(octal_from(b"\0\0\0\0\0\0\0\0"), 0);
        assert_eq!(octal_from(b"abc"), 0);
        assert_eq!(octal_from(b"12x4"), 0o12);
    }

    #[test]
    fn text_boundaries() {
        let mut f = [0u8; 8];
        text_into(&mut f, b"wheel", "gname").unwrap();
        assert_eq!(text_from(&f), b"wheel");

        text_into(&mut f, b"12345678", "gname").unwrap();
        assert_eq!(text_from(&f), b"12345678");

        assert!(text_into(&mut f, b"123456789", "gname").is_err());
        assert!(text_into(&mut f, b"a\0b", "gname").is_err());
        assert_eq!(text_from(&[0u8; 8]), b"");
    }
}
