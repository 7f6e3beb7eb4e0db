//! mp3reader_rs - Fixed-memory streaming MP3 reader
//!
//! Pull-based decoding of MP3 files (or any seekable byte source) into
//! interleaved 16-bit PCM for real-time mixing. See [`audio::StreamReader`].

pub mod audio;
pub mod config;
pub mod error;

pub use audio::{AudioReader, ByteSource, FrameCodec, IoSource, Mp3Codec, PlaybackMode, StreamReader};
pub use config::ReaderConfig;
pub use error::{CodecError, ReaderError};

/// Stream reader over a file on disk using the bundled MP3 codec.
pub type Mp3FileReader = StreamReader<IoSource<std::fs::File>, Mp3Codec>;
