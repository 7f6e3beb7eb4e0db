//! Error types for the stream reader and its frame codecs.

use std::io;

use thiserror::Error;

/// Errors reported by a [`FrameCodec`](crate::audio::FrameCodec).
///
/// These never escape the decode path: the reader reacts to them by refilling
/// its chunk window or by discarding bytes until the next sync word.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Need more data: {needed} bytes required, {available} available")]
    NeedMoreData { needed: usize, available: usize },

    #[error("Invalid frame header: {0}")]
    InvalidHeader(&'static str),

    #[error("Unsupported layer: {0}")]
    UnsupportedLayer(u8),

    #[error("Frame decode failed")]
    DecodeFailed,

    #[error("Output buffer too small: {needed} samples required, {available} available")]
    OutputTooSmall { needed: usize, available: usize },
}

/// Errors that can occur while constructing or opening a reader.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Source ended inside the leading tag header")]
    Truncated,

    #[error("No decodable frame found before end of source")]
    NoFrameFound,

    #[error("{buffer} buffer too small: {required} required, capacity {capacity}")]
    BufferTooSmall {
        buffer: &'static str,
        required: usize,
        capacity: usize,
    },
}
