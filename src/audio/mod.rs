//! audio - Streaming compressed-audio readers
//!
//! Turns a seekable byte source into interleaved i16 PCM frames pulled on
//! demand. The reader skips leading ID3v2 tags, resynchronizes on frame sync
//! words and drives a pluggable frame codec over fixed-size buffers.

mod audio_reader;
mod byte_source;
mod frame_codec;
pub mod id3;
mod mp3_codec;
pub mod mpeg_header;
mod stream_reader;

pub use audio_reader::{AudioReader, PlaybackMode};
pub use byte_source::{ByteSource, IoSource};
pub use frame_codec::{DecodedFrame, FrameCodec, FrameInfo};
pub use mp3_codec::{MAX_SAMPLES_PER_FRAME, Mp3Codec};
pub use stream_reader::StreamReader;
