//! Buffer sizes and engine policy constants.

use crate::process::decode::Codec;
use crate::process::locate::SYNC_WORD_LEN;
use crate::utils::errors::ConfigError;

pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_MAX_WRITE_SIZE: usize = 1024;
pub const DEFAULT_STALL_LIMIT: usize = 2;

pub const MP3_MAX_FRAME_SIZE: usize = 2048;
pub const MP3_MAX_PCM_SIZE: usize = 5120;
pub const MP3_MIN_FRAME_SIZE: usize = 1024;

pub const AAC_MAX_FRAME_SIZE: usize = 2100;
pub const AAC_MAX_PCM_SIZE: usize = 8192;
pub const AAC_MIN_FRAME_SIZE: usize = 1024;

/// Sizes a session allocates at `begin()` and the policy constants of the
/// synchronization engine.
///
/// All sizes are in bytes. The configuration is fixed while a session is
/// active.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct StreamConfig {
    /// Capacity of the compressed frame buffer.
    pub max_frame_size: usize,

    /// Capacity of the decoded sample buffer, 16-bit samples.
    pub max_pcm_size: usize,

    /// Bytes buffered before decoding starts while more input of the same
    /// write is pending.
    pub min_frame_size: usize,

    /// Largest piece of a caller write appended at once.
    pub chunk_size: usize,

    /// Largest single write to an output sink.
    pub max_write_size: usize,

    /// Consecutive zero-progress decodes tolerated before data is discarded.
    pub stall_limit: usize,

    /// Zero the unused part of the frame buffer when data is removed.
    pub clear_with_zero: bool,

    /// Leading bytes before the first marker that are handed to the decoder
    /// instead of being discarded.
    pub leading_garbage_tolerance: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::for_codec(Codec::Mp3)
    }
}

impl StreamConfig {
    pub fn for_codec(codec: Codec) -> Self {
        let (max_frame_size, max_pcm_size, min_frame_size) = match codec {
            Codec::Mp3 => (MP3_MAX_FRAME_SIZE, MP3_MAX_PCM_SIZE, MP3_MIN_FRAME_SIZE),
            Codec::Aac => (AAC_MAX_FRAME_SIZE, AAC_MAX_PCM_SIZE, AAC_MIN_FRAME_SIZE),
        };

        Self {
            max_frame_size,
            max_pcm_size,
            min_frame_size,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_write_size: DEFAULT_MAX_WRITE_SIZE,
            stall_limit: DEFAULT_STALL_LIMIT,
            clear_with_zero: false,
            leading_garbage_tolerance: SYNC_WORD_LEN,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_size == 0 {
            return Err(ConfigError::ZeroFrameBuffer);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.max_write_size == 0 {
            return Err(ConfigError::ZeroWriteSize);
        }
        if self.min_frame_size > self.max_frame_size {
            return Err(ConfigError::MinFrameExceedsBuffer {
                min: self.min_frame_size,
                max: self.max_frame_size,
            });
        }
        if self.sample_capacity() == 0 {
            return Err(ConfigError::PcmBufferTooSmall(self.max_pcm_size));
        }
        Ok(())
    }

    /// Sample buffer capacity in 16-bit samples.
    pub fn sample_capacity(&self) -> usize {
        self.max_pcm_size / size_of::<i16>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_defaults() {
        let mp3 = StreamConfig::for_codec(Codec::Mp3);
        assert_eq!(mp3, StreamConfig::default());
        assert_eq!(mp3.max_frame_size, 2048);
        assert_eq!(mp3.sample_capacity(), 2560);
        assert_eq!(mp3.leading_garbage_tolerance, 4);

        let aac = Codec::Aac.default_config();
        assert_eq!(aac.max_frame_size, 2100);
        assert_eq!(aac.sample_capacity(), 4096);
        assert_eq!(aac.validate(), Ok(()));
    }

    #[test]
    fn rejects_invalid_sizes() {
        let config = StreamConfig {
            min_frame_size: 4096,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MinFrameExceedsBuffer {
                min: 4096,
                max: 2048
            })
        );

        let config = StreamConfig {
            max_pcm_size: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PcmBufferTooSmall(1)));

        let config = StreamConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
    }
}
