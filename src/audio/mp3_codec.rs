//! MPEG Layer III frame codec.
//!
//! Sync search and probing use the native header parser; full decoding goes
//! through a safe wrapper around the minimp3 FFI decoder. Each codec owns its
//! own decoder state, so readers never share synthesis buffers.

use std::mem;

use minimp3_sys as ffi;

use super::frame_codec::{DecodedFrame, FrameCodec, FrameInfo};
use super::mpeg_header::{self, FrameHeader};
use crate::error::CodecError;

/// Interleaved samples minimp3 may write for one frame.
pub const MAX_SAMPLES_PER_FRAME: usize = ffi::MINIMP3_MAX_SAMPLES_PER_FRAME as usize;

pub struct Mp3Codec {
    decoder: Box<ffi::mp3dec_t>,
}

impl Mp3Codec {
    pub fn new() -> Self {
        // SAFETY: mp3dec_t is a C struct of arrays and integers; all-zero is a
        // valid bit pattern and mp3dec_init sets the fields it relies on.
        let mut decoder: Box<ffi::mp3dec_t> = Box::new(unsafe { mem::zeroed() });
        // SAFETY: `decoder` is a freshly boxed, exclusively owned mp3dec_t.
        unsafe {
            ffi::mp3dec_init(&mut *decoder);
        }
        Self { decoder }
    }
}

impl Default for Mp3Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec for Mp3Codec {
    fn find_sync_word(&self, data: &[u8]) -> Option<usize> {
        mpeg_header::find_sync_word(data)
    }

    fn probe_frame(&mut self, data: &[u8]) -> Result<FrameInfo, CodecError> {
        let header = FrameHeader::parse(data)?;
        Ok(FrameInfo {
            channels: header.channels(),
            sample_rate: header.sample_rate,
            frames_per_decode: header.frame_samples(),
        })
    }

    fn decode_frame(&mut self, data: &[u8], pcm: &mut [i16]) -> Result<DecodedFrame, CodecError> {
        if pcm.len() < MAX_SAMPLES_PER_FRAME {
            return Err(CodecError::OutputTooSmall {
                needed: MAX_SAMPLES_PER_FRAME,
                available: pcm.len(),
            });
        }

        // minimp3 only takes a frame once it can see the next header, or when
        // the window is exactly one frame long. Cutting the window to the frame
        // lets the last frame before trailing data (an ID3v1 tag, junk) decode.
        let frame = match FrameHeader::parse(data) {
            Ok(header) => match header.frame_bytes() {
                Some(len) if len > data.len() => {
                    return Err(CodecError::NeedMoreData {
                        needed: len,
                        available: data.len(),
                    });
                }
                Some(len) => &data[..len],
                // Free format: let minimp3 find the frame length itself
                None => data,
            },
            Err(e @ CodecError::NeedMoreData { .. }) => return Err(e),
            Err(e) => {
                log::trace!("Skipping false sync word: {}", e);
                return Ok(DecodedFrame {
                    bytes_consumed: 1,
                    channels: 0,
                    granules: 0,
                    samples_per_granule: 0,
                });
            }
        };

        // SAFETY: mp3dec_frame_info_t is five c_ints.
        let mut info: ffi::mp3dec_frame_info_t = unsafe { mem::zeroed() };
        // SAFETY: pointer and length come from the live `frame` slice, and
        // `pcm` holds at least MINIMP3_MAX_SAMPLES_PER_FRAME samples (checked
        // above), which is the most minimp3 writes for one frame.
        let samples = unsafe {
            ffi::mp3dec_decode_frame(
                &mut *self.decoder,
                frame.as_ptr(),
                frame.len().min(i32::MAX as usize) as _,
                pcm.as_mut_ptr(),
                &mut info,
            )
        };

        let bytes_consumed = (info.frame_bytes.max(0) as usize).min(frame.len());
        let channels = info.channels.max(1) as u16;
        if samples <= 0 {
            if bytes_consumed == 0 {
                log::trace!("minimp3 needs more data (window={})", frame.len());
                return Err(CodecError::DecodeFailed);
            }

            // Skipped junk, or a frame whose bit reservoir is not available
            // (first frame after a rewind). Consume it without output.
            log::trace!("minimp3 consumed {} bytes without output", bytes_consumed);
            return Ok(DecodedFrame {
                bytes_consumed,
                channels,
                granules: 0,
                samples_per_granule: 0,
            });
        }

        let samples = samples as usize;
        let granule = mpeg_header::GRANULE_SAMPLES;
        let (granules, samples_per_granule) = if info.layer == 3 && samples % granule == 0 {
            (samples / granule, granule)
        } else {
            (1, samples)
        };

        Ok(DecodedFrame {
            bytes_consumed,
            channels,
            granules,
            samples_per_granule,
        })
    }

    fn reset(&mut self) {
        // SAFETY: `decoder` is a live, exclusively borrowed mp3dec_t;
        // mp3dec_init only writes its header fields.
        unsafe {
            ffi::mp3dec_init(&mut *self.decoder);
        }
    }

    fn sync_word_high(&self) -> u8 {
        mpeg_header::SYNC_WORD_HIGH
    }

    fn max_frame_bytes(&self) -> usize {
        mpeg_header::MAX_FRAME_BYTES
    }

    fn max_frame_samples(&self) -> usize {
        MAX_SAMPLES_PER_FRAME
    }
}
