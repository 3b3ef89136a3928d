use std::fmt::Display;

use crate::config::StreamConfig;
use crate::process::locate::{AacSyncFinder, Mp3SyncFinder, SyncFinder};
use crate::structs::frame_info::FrameInfo;
use crate::utils::errors::DecoderError;

/// AAC (ADTS) decoder variant.
pub mod aac;
/// MPEG audio Layer III decoder variant.
pub mod mp3;

mod backend;

pub use aac::AacDecoder;
pub use mp3::Mp3Decoder;

/// Result category of a single decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// A frame was decoded. Zero consumed bytes means the decoder made no progress.
    Success,
    /// The window holds a valid but incomplete frame prefix.
    Underflow,
    /// The frame at the start of the window is corrupt or unsupported.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub bytes_consumed: usize,
    pub status: DecodeStatus,
}

impl DecodeOutcome {
    pub fn success(bytes_consumed: usize) -> Self {
        Self {
            bytes_consumed,
            status: DecodeStatus::Success,
        }
    }

    pub fn underflow() -> Self {
        Self {
            bytes_consumed: 0,
            status: DecodeStatus::Underflow,
        }
    }

    pub fn error() -> Self {
        Self {
            bytes_consumed: 0,
            status: DecodeStatus::Error,
        }
    }
}

/// Block-oriented frame decoder driven by the synchronization engine.
///
/// The window handed to [`decode`](FrameDecoder::decode) starts at a frame
/// marker and extends to the end of the buffered data. Decoded samples are
/// written interleaved into `samples`; the count is reported through
/// [`last_frame_info`](FrameDecoder::last_frame_info).
pub trait FrameDecoder {
    fn name(&self) -> &'static str;

    /// Acquires the codec. Called once per session before the first decode.
    fn allocate(&mut self) -> Result<(), DecoderError>;

    /// Releases the codec. Calling it on a released decoder is a no-op.
    fn release(&mut self);

    fn decode(&mut self, window: &[u8], samples: &mut [i16]) -> DecodeOutcome;

    /// Format of the most recently decoded frame.
    fn last_frame_info(&self) -> FrameInfo;
}

/// Supported bitstream formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Codec {
    #[default]
    Mp3,
    Aac,
}

impl Codec {
    pub fn decoder(&self) -> Box<dyn FrameDecoder + Send> {
        match self {
            Codec::Mp3 => Box::new(Mp3Decoder::default()),
            Codec::Aac => Box::new(AacDecoder::default()),
        }
    }

    pub fn sync_finder(&self) -> Box<dyn SyncFinder + Send> {
        match self {
            Codec::Mp3 => Box::new(Mp3SyncFinder),
            Codec::Aac => Box::new(AacSyncFinder),
        }
    }

    pub fn default_config(&self) -> StreamConfig {
        StreamConfig::for_codec(*self)
    }
}

impl Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Mp3 => write!(f, "MP3"),
            Codec::Aac => write!(f, "AAC"),
        }
    }
}
