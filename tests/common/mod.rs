//! Shared fixtures: a toy frame codec and in-memory byte sources.
//!
//! Mock frame layout: `[0xFF][0xF0 | (channels - 1)][id][payload_len][payload...]`
//!
//! Every frame decodes to `FRAMES_PER_DECODE` PCM frames whose samples encode
//! the frame id, the frame index and the channel, so tests can check ordering
//! exactly.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Cursor};
use std::rc::Rc;

use mp3reader_rs::audio::{ByteSource, DecodedFrame, FrameCodec, FrameInfo, IoSource};
use mp3reader_rs::{CodecError, ReaderConfig, StreamReader};

pub const SYNC_HIGH: u8 = 0xff;
pub const SYNC_LOW: u8 = 0xf0;
pub const HEADER_SIZE: usize = 4;
pub const GRANULES: usize = 2;
pub const GRANULE_SAMPLES: usize = 4;
pub const FRAMES_PER_DECODE: usize = GRANULES * GRANULE_SAMPLES;
pub const MAX_PAYLOAD: usize = 20;
pub const SAMPLE_RATE: u32 = 8000;
/// Frames with this id are consumed but decode to no PCM.
pub const SKIP_ID: u8 = 0xee;

pub type MemoryReader = StreamReader<IoSource<Cursor<Vec<u8>>>, MockCodec>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Default)]
pub struct MockCodec {
    pub resets: usize,
    pub decodes: usize,
}

impl MockCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameCodec for MockCodec {
    fn find_sync_word(&self, data: &[u8]) -> Option<usize> {
        data.windows(2)
            .position(|pair| pair[0] == SYNC_HIGH && pair[1] & SYNC_LOW == SYNC_LOW)
    }

    fn probe_frame(&mut self, data: &[u8]) -> Result<FrameInfo, CodecError> {
        let channels = parse_header(data)?.0;
        Ok(FrameInfo {
            channels,
            sample_rate: SAMPLE_RATE,
            frames_per_decode: FRAMES_PER_DECODE,
        })
    }

    fn decode_frame(&mut self, data: &[u8], pcm: &mut [i16]) -> Result<DecodedFrame, CodecError> {
        let (channels, id, payload) = parse_header(data)?;
        let total = HEADER_SIZE + payload;
        if data.len() < total {
            return Err(CodecError::NeedMoreData {
                needed: total,
                available: data.len(),
            });
        }

        self.decodes += 1;
        if id == SKIP_ID {
            return Ok(DecodedFrame {
                bytes_consumed: total,
                channels,
                granules: 0,
                samples_per_granule: GRANULE_SAMPLES,
            });
        }

        let channels_usize = usize::from(channels);
        for frame in 0..FRAMES_PER_DECODE {
            for channel in 0..channels_usize {
                pcm[frame * channels_usize + channel] = sample(id, frame, channel);
            }
        }

        Ok(DecodedFrame {
            bytes_consumed: total,
            channels,
            granules: GRANULES,
            samples_per_granule: GRANULE_SAMPLES,
        })
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn sync_word_high(&self) -> u8 {
        SYNC_HIGH
    }

    fn max_frame_bytes(&self) -> usize {
        HEADER_SIZE + MAX_PAYLOAD
    }

    fn max_frame_samples(&self) -> usize {
        FRAMES_PER_DECODE * 2
    }
}

fn parse_header(data: &[u8]) -> Result<(u16, u8, usize), CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::NeedMoreData {
            needed: HEADER_SIZE,
            available: data.len(),
        });
    }
    if data[0] != SYNC_HIGH || data[1] & SYNC_LOW != SYNC_LOW {
        return Err(CodecError::InvalidHeader("missing sync word"));
    }
    let channel_bits = data[1] & 0x0f;
    if channel_bits > 1 {
        return Err(CodecError::InvalidHeader("bad channel count"));
    }
    let payload = usize::from(data[3]);
    if payload > MAX_PAYLOAD {
        return Err(CodecError::InvalidHeader("payload too long"));
    }
    Ok((u16::from(channel_bits) + 1, data[2], payload))
}

pub fn sample(id: u8, frame: usize, channel: usize) -> i16 {
    i16::from(id) * 1000 + (frame * 10 + channel) as i16
}

/// One encoded mock frame.
pub fn frame(id: u8, channels: u16, payload: usize) -> Vec<u8> {
    assert!((1..=2).contains(&channels) && payload <= MAX_PAYLOAD);
    let mut bytes = vec![SYNC_HIGH, SYNC_LOW | (channels as u8 - 1), id, payload as u8];
    bytes.resize(HEADER_SIZE + payload, 0);
    bytes
}

/// Payload length used for frame `id` in generated streams; varies so that
/// frames land on different chunk boundaries.
pub fn payload_for(id: u8) -> usize {
    (usize::from(id) * 7 + 3) % (MAX_PAYLOAD + 1)
}

/// `count` consecutive frames with ids `0..count`.
pub fn frames(count: usize, channels: u16) -> Vec<u8> {
    (0..count as u8)
        .flat_map(|id| frame(id, channels, payload_for(id)))
        .collect()
}

/// Interleaved PCM the reader should produce for frames `ids`.
pub fn expected_pcm(ids: impl IntoIterator<Item = u8>, channels: u16) -> Vec<i16> {
    let mut pcm = Vec::new();
    for id in ids {
        for frame in 0..FRAMES_PER_DECODE {
            for channel in 0..usize::from(channels) {
                pcm.push(sample(id, frame, channel));
            }
        }
    }
    pcm
}

/// Bytes that can never contain a sync word.
pub fn garbage(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + 3) % 251) as u8).collect()
}

pub fn synchsafe(size: u32) -> [u8; 4] {
    [
        ((size >> 21) & 0x7f) as u8,
        ((size >> 14) & 0x7f) as u8,
        ((size >> 7) & 0x7f) as u8,
        (size & 0x7f) as u8,
    ]
}

/// ID3v2.4 tag with a `size`-byte body and an optional footer.
pub fn id3_tag(size: u32, footer: bool) -> Vec<u8> {
    let flags = if footer { 0x10 } else { 0x00 };
    let mut bytes = b"ID3".to_vec();
    bytes.extend_from_slice(&[4, 0, flags]);
    bytes.extend_from_slice(&synchsafe(size));
    bytes.extend(garbage(size as usize));
    if footer {
        bytes.extend_from_slice(b"3DI");
        bytes.extend_from_slice(&[4, 0, flags]);
        bytes.extend_from_slice(&synchsafe(size));
    }
    bytes
}

/// Small buffers so that frames straddle chunk boundaries constantly.
pub fn small_config() -> ReaderConfig {
    ReaderConfig {
        chunk_buffer_size: 32,
        frame_buffer_size: FRAMES_PER_DECODE * 2,
    }
}

pub fn memory_source(bytes: Vec<u8>) -> IoSource<Cursor<Vec<u8>>> {
    IoSource::new(Cursor::new(bytes))
}

pub fn memory_reader() -> MemoryReader {
    StreamReader::with_config(MockCodec::new(), small_config()).expect("valid config")
}

/// Drain a reader in `request`-frame pulls until it reports end of stream.
pub fn drain(reader: &mut MemoryReader, request: usize) -> Vec<i16> {
    let channels = usize::from(reader.channels());
    let mut out = vec![0i16; request * channels];
    let mut pcm = Vec::new();
    loop {
        let frames = reader.decode_to_pcm(&mut out, request, 1);
        if frames == 0 {
            return pcm;
        }
        assert!(frames <= request);
        pcm.extend_from_slice(&out[..frames * channels]);
    }
}

/// Source whose bytes can be swapped out while a reader holds it.
#[derive(Clone, Default)]
pub struct SharedSource {
    data: Rc<RefCell<Vec<u8>>>,
    position: u64,
}

impl SharedSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            data: Rc::new(RefCell::new(bytes)),
            position: 0,
        }
    }

    pub fn replace(&self, bytes: Vec<u8>) {
        *self.data.borrow_mut() = bytes;
    }
}

impl ByteSource for SharedSource {
    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.position = offset;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let data = self.data.borrow();
        let start = (self.position as usize).min(data.len());
        let len = buffer.len().min(data.len() - start);
        buffer[..len].copy_from_slice(&data[start..start + len]);
        self.position += len as u64;
        Ok(len)
    }
}

/// Which operation a [`FailingSource`] breaks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Seek,
    /// Reads succeed until `n` bytes have been handed out, then error.
    ReadAfter(usize),
}

pub struct FailingSource {
    inner: Cursor<Vec<u8>>,
    failure: Failure,
    delivered: usize,
}

impl FailingSource {
    pub fn new(bytes: Vec<u8>, failure: Failure) -> Self {
        Self {
            inner: Cursor::new(bytes),
            failure,
            delivered: 0,
        }
    }
}

impl ByteSource for FailingSource {
    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.inner.position())
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        if self.failure == Failure::Seek {
            return Err(io::Error::new(io::ErrorKind::Other, "seek failed"));
        }
        self.inner.set_position(offset);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let limit = match self.failure {
            Failure::ReadAfter(limit) => limit,
            Failure::Seek => usize::MAX,
        };
        if self.delivered >= limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "read failed"));
        }
        let len = buffer.len().min(limit - self.delivered);
        let read = io::Read::read(&mut self.inner, &mut buffer[..len])?;
        self.delivered += read;
        Ok(read)
    }
}
