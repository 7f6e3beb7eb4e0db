//! Leading ID3v2 tag detection.
//!
//! Only the 10-byte header is parsed; the tag body is skipped unread.

use super::byte_source::ByteSource;
use crate::error::ReaderError;

pub const SIGNATURE: &[u8; 3] = b"ID3";
pub const HEADER_SIZE: u64 = 10;
pub const FOOTER_SIZE: u64 = 10;

/// ID3v2 header flag bits.
pub mod flags {
    pub const FOOTER: u8 = 0x10;
    pub const EXPERIMENTAL: u8 = 0x20;
    pub const EXTENDED_HEADER: u8 = 0x40;
    pub const UNSYNCHRONISATION: u8 = 0x80;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub version: u8,
    pub revision: u8,
    pub flags: u8,
    /// Tag body size, excluding header and footer
    pub size: u32,
}

impl TagHeader {
    /// Parse the seven bytes that follow the `ID3` signature.
    pub fn parse(rest: &[u8; 7]) -> Self {
        Self {
            version: rest[0],
            revision: rest[1],
            flags: rest[2],
            size: decode_synchsafe(&[rest[3], rest[4], rest[5], rest[6]]),
        }
    }

    pub fn has_footer(&self) -> bool {
        self.flags & flags::FOOTER != 0
    }

    /// Total bytes occupied by the tag, header and footer included.
    pub fn total_size(&self) -> u64 {
        let mut total = HEADER_SIZE + u64::from(self.size);
        if self.has_footer() {
            total += FOOTER_SIZE;
        }
        total
    }
}

/// Pack four 7-bit bytes, most significant first. The top bit of each byte is
/// ignored.
pub fn decode_synchsafe(bytes: &[u8; 4]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |size, &byte| (size << 7) | u32::from(byte & 0x7f))
}

/// Read the tag header at the source's current position.
///
/// Returns `None` when the signature does not match. A source shorter than the
/// signature, or than a recognized header, is reported as truncated.
pub fn read_tag_header<S: ByteSource + ?Sized>(
    source: &mut S,
) -> Result<Option<TagHeader>, ReaderError> {
    let mut signature = [0u8; 3];
    if source.read_full(&mut signature)? < signature.len() {
        return Err(ReaderError::Truncated);
    }

    if &signature != SIGNATURE {
        return Ok(None);
    }

    let mut rest = [0u8; 7];
    if source.read_full(&mut rest)? < rest.len() {
        return Err(ReaderError::Truncated);
    }

    Ok(Some(TagHeader::parse(&rest)))
}
