//! Streaming frame reader over a positional byte source.
//!
//! The reader keeps two fixed buffers: a raw chunk window that is refilled from
//! the source and searched for sync words, and a decoded frame window that
//! callers drain at whatever granularity they like. Nothing is allocated after
//! construction.

use super::audio_reader::{AudioReader, PlaybackMode};
use super::byte_source::ByteSource;
use super::frame_codec::FrameCodec;
use super::id3;
use crate::config::ReaderConfig;
use crate::error::{CodecError, ReaderError};

pub struct StreamReader<S, C> {
    codec: C,
    source: Option<S>,
    mode: PlaybackMode,
    opened: bool,
    channels: u16,
    sampling_rate: u32,

    // Byte offsets into the source
    initial_data_offset: u64,
    chunk_data_offset: u64,
    next_data_offset: u64,

    chunk_buffer: Box<[u8]>,
    chunk_cursor: usize,
    prefetched_bytes: usize,

    // Sample (not frame) indices into frame_buffer
    frame_buffer: Box<[i16]>,
    current_frame: usize,
    next_frame: usize,
    decoded_frames: usize,
}

impl<S: ByteSource, C: FrameCodec> StreamReader<S, C> {
    /// Create a reader with buffers sized from the build-time configuration.
    pub fn new(codec: C) -> Result<Self, ReaderError> {
        Self::with_config(codec, ReaderConfig::new().unwrap_or_default())
    }

    /// Create a reader with explicit buffer sizes.
    ///
    /// Fails if either buffer cannot hold the largest frame `codec` produces.
    pub fn with_config(codec: C, config: ReaderConfig) -> Result<Self, ReaderError> {
        config.validate(&codec)?;

        Ok(Self {
            codec,
            source: None,
            mode: PlaybackMode::Single,
            opened: false,
            channels: 0,
            sampling_rate: 0,
            initial_data_offset: 0,
            chunk_data_offset: 0,
            next_data_offset: 0,
            chunk_buffer: vec![0u8; config.chunk_buffer_size].into_boxed_slice(),
            chunk_cursor: 0,
            prefetched_bytes: 0,
            frame_buffer: vec![0i16; config.frame_buffer_size].into_boxed_slice(),
            current_frame: 0,
            next_frame: 0,
            decoded_frames: 0,
        })
    }

    /// Bind `source`, skip any leading ID3v2 tag and lock onto the first frame
    /// the codec accepts.
    ///
    /// Channel count and sampling rate are taken from that frame and stay
    /// fixed until the next `open`.
    pub fn open(&mut self, source: S, mode: PlaybackMode, preload: bool) -> Result<(), ReaderError> {
        self.opened = false;
        self.mode = mode;
        self.codec.reset();

        self.initial_data_offset = 0;
        self.next_data_offset = 0;

        let source = self.source.insert(source);
        source.seek(0)?;

        if let Some(tag) = id3::read_tag_header(source)? {
            log::debug!(
                "Skipping ID3v2.{}.{} tag: {} bytes",
                tag.version,
                tag.revision,
                tag.total_size()
            );
            self.next_data_offset += tag.total_size();
        }

        self.chunk_cursor = 0;
        self.chunk_data_offset = self.next_data_offset;
        self.prefetched_bytes = 0;
        self.current_frame = 0;
        self.next_frame = 0;
        self.decoded_frames = 0;

        let info = loop {
            if !self.find_next_chunk() {
                return Err(ReaderError::NoFrameFound);
            }

            let window = &self.chunk_buffer[self.chunk_cursor..][..self.prefetched_bytes];
            match self.codec.probe_frame(window) {
                Ok(info) if info.channels > 0 => break info,
                Err(CodecError::NeedMoreData { .. }) if self.refill_next_chunk() => continue,
                Ok(_) | Err(_) => self.discard_byte(),
            }
        };

        let required = usize::from(info.channels) * info.frames_per_decode;
        if required > self.frame_buffer.len() {
            return Err(ReaderError::BufferTooSmall {
                buffer: "frame",
                required,
                capacity: self.frame_buffer.len(),
            });
        }

        self.initial_data_offset = self.chunk_data_offset;
        self.channels = info.channels;
        self.sampling_rate = info.sample_rate;
        self.opened = true;

        log::info!(
            "Stream opened: rate={}, ch={}, first frame at byte {}, mode={:?}",
            self.sampling_rate,
            self.channels,
            self.initial_data_offset,
            self.mode,
        );

        self.rewind(preload);

        Ok(())
    }

    /// Mark the reader inactive. Buffers and the source are kept for reuse.
    pub fn close(&mut self) {
        if self.opened {
            log::debug!("Stream closed");
        }
        self.opened = false;
    }

    /// Close the reader and hand the byte source back.
    pub fn take_source(&mut self) -> Option<S> {
        self.close();
        self.source.take()
    }

    pub fn rewind(&mut self, preload: bool) {
        if !self.opened {
            return;
        }

        self.next_data_offset = self.initial_data_offset;

        self.chunk_cursor = 0;
        self.chunk_data_offset = self.initial_data_offset;
        self.prefetched_bytes = 0;

        self.current_frame = 0;
        self.next_frame = 0;
        self.decoded_frames = 0;

        self.codec.reset();

        if preload && self.find_next_chunk() {
            self.decode_next_frames();
        }
    }

    /// Pull up to `frames` frames into `output`.
    ///
    /// With `upmixing > 1` every decoded sample is written that many times in a
    /// row, so each output frame carries `channels * upmixing` samples. The
    /// request is clamped to what `output` can hold. Returns 0 once the stream
    /// is over (or on a closed reader).
    pub fn decode_to_pcm(&mut self, output: &mut [i16], frames: usize, upmixing: usize) -> usize {
        if !self.opened {
            return 0;
        }

        let upmixing = upmixing.max(1);
        let channels = usize::from(self.channels);
        let frames = frames.min(output.len() / (channels * upmixing));

        let mut written = 0;
        let mut processed_frames = 0;

        while processed_frames < frames {
            let retrieved_frames = self.retrieve_next_frames(frames - processed_frames);
            if retrieved_frames == 0 {
                break;
            }

            let samples =
                &self.frame_buffer[self.current_frame..self.current_frame + retrieved_frames * channels];

            if upmixing == 1 {
                output[written..written + samples.len()].copy_from_slice(samples);
                written += samples.len();
            } else {
                for &sample in samples {
                    output[written..written + upmixing].fill(sample);
                    written += upmixing;
                }
            }

            processed_frames += retrieved_frames;
        }

        processed_frames
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Byte offset of the first decodable frame, fixed at `open`.
    pub fn initial_data_offset(&self) -> u64 {
        self.initial_data_offset
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn retrieve_next_frames(&mut self, frames: usize) -> usize {
        // At most one loop per pull, so an empty source cannot spin forever.
        let mut do_rewind = self.mode == PlaybackMode::Continuous;

        while self.decoded_frames == 0 {
            if !self.find_next_chunk() {
                if !do_rewind {
                    return 0;
                }

                log::debug!("End of stream, looping to byte {}", self.initial_data_offset);
                do_rewind = false;
                self.rewind(false);

                continue;
            }

            if !self.decode_next_frames() {
                // The frame may straddle the window end; pull in more bytes.
                if !self.refill_next_chunk() {
                    return 0;
                }

                continue;
            }

            self.next_frame = 0;
        }

        self.current_frame = self.next_frame;

        let frames = frames.min(self.decoded_frames);

        self.next_frame = self.current_frame + usize::from(self.channels) * frames;
        self.decoded_frames -= frames;

        frames
    }

    /// Move the chunk cursor onto the next sync word, reading from the source
    /// as needed. Fails when the source is exhausted or cannot be read.
    fn find_next_chunk(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        let sync_high = self.codec.sync_word_high();

        let offset = loop {
            let window = &self.chunk_buffer[self.chunk_cursor..][..self.prefetched_bytes];
            if let Some(offset) = self.codec.find_sync_word(window) {
                break offset.min(self.prefetched_bytes);
            }

            if let Err(e) = source.seek(self.next_data_offset) {
                log::warn!("Seek to byte {} failed: {}", self.next_data_offset, e);
                return false;
            }

            // A sync word may be split across two reads.
            let mut carried = 0;
            if self.prefetched_bytes > 0
                && self.chunk_buffer[self.chunk_cursor + self.prefetched_bytes - 1] == sync_high
            {
                self.chunk_buffer[0] = sync_high;
                carried = 1;
            }

            self.chunk_cursor = 0;
            self.prefetched_bytes = carried;
            self.chunk_data_offset = self.next_data_offset - carried as u64;

            let read_bytes = read_chunk(source, &mut self.chunk_buffer[carried..]);
            if read_bytes == 0 {
                return false;
            }

            self.prefetched_bytes += read_bytes;
            self.next_data_offset += read_bytes as u64;
        };

        self.chunk_cursor += offset;
        self.prefetched_bytes -= offset;
        self.chunk_data_offset += offset as u64;

        true
    }

    /// Compact the unconsumed bytes to the front of the chunk buffer and top it
    /// up from the source.
    fn refill_next_chunk(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };

        if self.chunk_cursor == 0 && self.prefetched_bytes == self.chunk_buffer.len() {
            return false;
        }

        if self.chunk_cursor > 0 {
            self.chunk_buffer
                .copy_within(self.chunk_cursor..self.chunk_cursor + self.prefetched_bytes, 0);
            self.chunk_cursor = 0;
        }

        if let Err(e) = source.seek(self.next_data_offset) {
            log::warn!("Seek to byte {} failed: {}", self.next_data_offset, e);
            return false;
        }

        let read_bytes = read_chunk(source, &mut self.chunk_buffer[self.prefetched_bytes..]);
        if read_bytes == 0 {
            return false;
        }

        self.prefetched_bytes += read_bytes;
        self.next_data_offset += read_bytes as u64;

        true
    }

    fn decode_next_frames(&mut self) -> bool {
        self.decoded_frames = 0;

        let window = &self.chunk_buffer[self.chunk_cursor..][..self.prefetched_bytes];
        let decoded = match self.codec.decode_frame(window, &mut self.frame_buffer[..]) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::trace!("Decode at byte {} failed: {}", self.chunk_data_offset, e);
                return false;
            }
        };

        let consumed = decoded.bytes_consumed.min(self.prefetched_bytes);
        if consumed == 0 {
            return false;
        }

        let frame_offset = self.chunk_data_offset;
        self.chunk_cursor += consumed;
        self.prefetched_bytes -= consumed;
        self.chunk_data_offset += consumed as u64;

        let frames = decoded.frames();
        if frames == 0 {
            return true;
        }

        if decoded.channels != self.channels {
            log::warn!(
                "Dropping frame at byte {}: {} channels, stream has {}",
                frame_offset,
                decoded.channels,
                self.channels
            );
            return true;
        }

        if frames * usize::from(self.channels) > self.frame_buffer.len() {
            log::warn!(
                "Dropping frame at byte {}: {} frames exceed the frame buffer",
                frame_offset,
                frames
            );
            return true;
        }

        self.decoded_frames = frames;

        true
    }

    fn discard_byte(&mut self) {
        if self.prefetched_bytes == 0 {
            return;
        }
        self.chunk_cursor += 1;
        self.prefetched_bytes -= 1;
        self.chunk_data_offset += 1;
    }
}

fn read_chunk<S: ByteSource>(source: &mut S, buffer: &mut [u8]) -> usize {
    match source.read_full(buffer) {
        Ok(read_bytes) => read_bytes,
        Err(e) => {
            log::warn!("Read failed: {}", e);
            0
        }
    }
}

impl<S: ByteSource, C: FrameCodec> AudioReader for StreamReader<S, C> {
    type Source = S;

    fn open(&mut self, source: S, mode: PlaybackMode, preload: bool) -> Result<(), ReaderError> {
        StreamReader::open(self, source, mode, preload)
    }

    fn close(&mut self) {
        StreamReader::close(self)
    }

    fn rewind(&mut self, preload: bool) {
        StreamReader::rewind(self, preload)
    }

    fn decode_to_pcm(&mut self, output: &mut [i16], frames: usize, upmixing: usize) -> usize {
        StreamReader::decode_to_pcm(self, output, frames, upmixing)
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    fn mode(&self) -> PlaybackMode {
        self.mode
    }

    fn is_open(&self) -> bool {
        self.opened
    }
}
