//! Frame codec trait driven incrementally by the stream reader.

use crate::error::CodecError;

/// Stream parameters recovered from a frame header without decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub channels: u16,
    pub sample_rate: u32,
    /// PCM frames (per channel) one full decode produces
    pub frames_per_decode: usize,
}

/// Result of a successful [`FrameCodec::decode_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Bytes of the input window that were consumed, including skipped junk
    pub bytes_consumed: usize,
    pub channels: u16,
    pub granules: usize,
    pub samples_per_granule: usize,
}

impl DecodedFrame {
    /// Number of interleaved PCM frames written to the output buffer.
    pub fn frames(&self) -> usize {
        self.granules * self.samples_per_granule
    }
}

/// A stateful frame decoder.
///
/// The codec owns all of its scratch state, so independent readers never share
/// decoder internals. Inputs are windows into the reader's chunk buffer that
/// start at the current cursor.
pub trait FrameCodec {
    /// Offset of the first sync word in `data`, if any.
    fn find_sync_word(&self, data: &[u8]) -> Option<usize>;

    /// Parse the frame header at the start of `data`.
    fn probe_frame(&mut self, data: &[u8]) -> Result<FrameInfo, CodecError>;

    /// Decode one frame from the start of `data` into interleaved `pcm`.
    fn decode_frame(&mut self, data: &[u8], pcm: &mut [i16]) -> Result<DecodedFrame, CodecError>;

    /// Drop all inter-frame state (bit reservoir, overlap buffers).
    fn reset(&mut self);

    /// Leading byte of the sync pattern; a window ending in this byte may hold
    /// the first half of a sync word.
    fn sync_word_high(&self) -> u8;

    /// Worst-case encoded size of a single frame, in bytes.
    fn max_frame_bytes(&self) -> usize;

    /// Worst-case decoded size of a single frame, in interleaved samples.
    fn max_frame_samples(&self) -> usize;
}
