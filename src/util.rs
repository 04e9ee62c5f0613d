use crate::error::{Error, Result};
use std::fmt::Write;
use std::ops::Range;

/// Byte range `offset..offset+len`, or `OutOfBounds` if it does not fit in `available`.
pub fn span(offset: usize, len: usize, available: usize) -> Result<Range<usize>> {
    offset
        .checked_add(len)
        .filter(|&end| end <= available)
        .map(|end| offset..end)
        .ok_or(Error::OutOfBounds {
            offset,
            len,
            available,
        })
}

/// Classic 16-bytes-per-row dump, addresses starting at `start_offset`.
pub fn hex_dump(bytes: &[u8], start_offset: u64) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let addr = start_offset + row as u64 * 16;
        let hexs: String = chunk.iter().map(|b| format!("{b:02x} ")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&c| if c.is_ascii_graphic() || c == b' ' { c as char } else { '.' })
            .collect();
        let _ = writeln!(out, "{addr:08x}  {hexs:<48}  |{ascii}|");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_rejects_overflow() {
        assert_eq!(span(4, 4, 8).unwrap(), 4..8);
        assert!(matches!(
            span(5, 4, 8),
            Err(Error::OutOfBounds { offset: 5, len: 4, available: 8 })
        ));
        assert!(span(usize::MAX, 2, 8).is_err());
    }

    #[test]
    fn hex_dump_rows() {
        let dump = hex_dump(b"ftyp\x00\x01", 0x20);
        assert_eq!(dump.lines().count(), 1);
        assert!(dump.starts_with("00000020  66 74 79 70 00 01 "));
        assert!(dump.ends_with("|ftyp..|\n"));
    }
}
