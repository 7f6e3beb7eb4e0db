//! Uniform pull interface for audio readers consumed by tracks and mixers.

use serde::{Deserialize, Serialize};

use super::byte_source::ByteSource;
use crate::error::ReaderError;

/// What a reader does when it reaches the end of its source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Stop producing frames at end of stream.
    #[default]
    Single,
    /// Rewind to the first frame and keep producing.
    Continuous,
}

/// A trait for readers that turn an encoded byte source into interleaved i16
/// PCM frames on demand.
///
/// `decode_to_pcm` returning 0 is the only end-of-stream signal; it does not
/// tell a clean end apart from an unrecoverable stream.
pub trait AudioReader {
    type Source: ByteSource;

    /// Bind `source` and position the reader on its first decodable frame.
    fn open(
        &mut self,
        source: Self::Source,
        mode: PlaybackMode,
        preload: bool,
    ) -> Result<(), ReaderError>;

    fn close(&mut self);

    /// Return to the first frame. With `preload`, one frame is decoded eagerly
    /// so the next pull is served without resync latency.
    fn rewind(&mut self, preload: bool);

    /// Fill `output` with up to `frames` frames, replicating every sample
    /// `upmixing` times. Returns the number of frames produced.
    fn decode_to_pcm(&mut self, output: &mut [i16], frames: usize, upmixing: usize) -> usize;

    fn channels(&self) -> u16;

    fn sampling_rate(&self) -> u32;

    fn bits_per_sample(&self) -> u16 {
        16
    }

    fn mode(&self) -> PlaybackMode;

    fn is_open(&self) -> bool;
}
