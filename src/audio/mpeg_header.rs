//! MPEG-1/2 audio frame header parsing.
//!
//! Used for sync search and header-only probing. Only the 12-bit sync word of
//! MPEG-1 and MPEG-2 is recognized; MPEG-2.5 streams are not.

use crate::error::CodecError;

pub const SYNC_WORD_HIGH: u8 = 0xff;
pub const SYNC_WORD_LOW: u8 = 0xf0;
pub const HEADER_SIZE: usize = 4;

/// Samples per granule for Layer III.
pub const GRANULE_SAMPLES: usize = 576;

/// Largest Layer III frame: 320 kbit/s at 32 kHz with padding.
pub const MAX_FRAME_BYTES: usize = 1441;

const SAMPLE_RATES: [[u32; 3]; 2] = [
    [44100, 48000, 32000], // MPEG-1
    [22050, 24000, 16000], // MPEG-2
];

// Layer III bitrates in kbit/s; index 0 is free format, 15 is invalid.
const BITRATES_KBPS: [[u16; 15]; 2] = [
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: u8,
    pub crc_protected: bool,
    /// 0 for free-format streams
    pub bitrate_kbps: u16,
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
}

impl FrameHeader {
    /// Parse the 4-byte header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < HEADER_SIZE {
            return Err(CodecError::NeedMoreData {
                needed: HEADER_SIZE,
                available: data.len(),
            });
        }

        if !is_sync_word(data[0], data[1]) {
            return Err(CodecError::InvalidHeader("missing sync word"));
        }

        let version = if data[1] & 0x08 != 0 {
            MpegVersion::Mpeg1
        } else {
            MpegVersion::Mpeg2
        };

        let layer = match (data[1] >> 1) & 0x03 {
            0 => return Err(CodecError::InvalidHeader("reserved layer")),
            bits => 4 - bits,
        };
        if layer != 3 {
            return Err(CodecError::UnsupportedLayer(layer));
        }

        let bitrate_index = usize::from(data[2] >> 4);
        if bitrate_index == 15 {
            return Err(CodecError::InvalidHeader("bad bitrate index"));
        }

        let rate_index = usize::from((data[2] >> 2) & 0x03);
        if rate_index == 3 {
            return Err(CodecError::InvalidHeader("reserved sample rate"));
        }

        let table = version.table_index();
        let channel_mode = match data[3] >> 6 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        Ok(Self {
            version,
            layer,
            crc_protected: data[1] & 0x01 == 0,
            bitrate_kbps: BITRATES_KBPS[table][bitrate_index],
            sample_rate: SAMPLE_RATES[table][rate_index],
            padding: data[2] & 0x02 != 0,
            channel_mode,
        })
    }

    pub fn channels(&self) -> u16 {
        match self.channel_mode {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }

    pub fn granules(&self) -> usize {
        match self.version {
            MpegVersion::Mpeg1 => 2,
            MpegVersion::Mpeg2 => 1,
        }
    }

    /// PCM frames per channel produced by this frame.
    pub fn frame_samples(&self) -> usize {
        self.granules() * GRANULE_SAMPLES
    }

    /// Encoded length in bytes, or `None` for free-format streams.
    pub fn frame_bytes(&self) -> Option<usize> {
        if self.bitrate_kbps == 0 {
            return None;
        }
        let slots = match self.version {
            MpegVersion::Mpeg1 => 144_000,
            MpegVersion::Mpeg2 => 72_000,
        };
        let bytes = slots * usize::from(self.bitrate_kbps) / self.sample_rate as usize;
        Some(bytes + usize::from(self.padding))
    }
}

impl MpegVersion {
    fn table_index(self) -> usize {
        match self {
            MpegVersion::Mpeg1 => 0,
            MpegVersion::Mpeg2 => 1,
        }
    }
}

fn is_sync_word(high: u8, low: u8) -> bool {
    high & SYNC_WORD_HIGH == SYNC_WORD_HIGH && low & SYNC_WORD_LOW == SYNC_WORD_LOW
}

/// Offset of the first 12-bit sync word in `data`.
pub fn find_sync_word(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|pair| is_sync_word(pair[0], pair[1]))
}
