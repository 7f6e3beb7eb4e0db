use serde::{Deserialize, Serialize};

use crate::audio::FrameCodec;
use crate::error::ReaderError;

/// Raw byte window used when no build-time value is available.
pub const DEFAULT_CHUNK_BUFFER_SIZE: usize = 2048;
/// Decoded sample window (i16 samples, all channels) used by default.
pub const DEFAULT_FRAME_BUFFER_SIZE: usize = 2304;

/// Buffer sizing for a [`StreamReader`](crate::audio::StreamReader).
///
/// Both buffers are allocated once when the reader is constructed and are
/// reused across every `open`/`rewind`/`close` cycle.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ReaderConfig {
    /// Capacity of the raw byte chunk buffer
    pub chunk_buffer_size: usize,
    /// Capacity of the decoded frame buffer, in interleaved i16 samples
    pub frame_buffer_size: usize,
}

impl ReaderConfig {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            chunk_buffer_size: env!("MP3READER_CHUNK_BUFFER_SIZE")
                .parse()
                .map_err(|_| "Failed to parse MP3READER_CHUNK_BUFFER_SIZE")?,
            frame_buffer_size: env!("MP3READER_FRAME_BUFFER_SIZE")
                .parse()
                .map_err(|_| "Failed to parse MP3READER_FRAME_BUFFER_SIZE")?,
        })
    }

    /// Check that both buffers can hold the largest frame `codec` can produce.
    ///
    /// The chunk buffer must strictly exceed the worst-case frame so that a
    /// compacted window always has room for at least one more byte.
    pub fn validate<C: FrameCodec + ?Sized>(&self, codec: &C) -> Result<(), ReaderError> {
        let required = codec.max_frame_bytes() + 1;
        if self.chunk_buffer_size < required {
            return Err(ReaderError::BufferTooSmall {
                buffer: "chunk",
                required,
                capacity: self.chunk_buffer_size,
            });
        }

        let required = codec.max_frame_samples();
        if self.frame_buffer_size < required {
            return Err(ReaderError::BufferTooSmall {
                buffer: "frame",
                required,
                capacity: self.frame_buffer_size,
            });
        }

        Ok(())
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_buffer_size: DEFAULT_CHUNK_BUFFER_SIZE,
            frame_buffer_size: DEFAULT_FRAME_BUFFER_SIZE,
        }
    }
}
