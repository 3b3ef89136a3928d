//! ADTS (Audio Data Transport Stream) header for AAC.
//!
//! 56-bit fixed + variable header, followed by a 16-bit CRC when
//! `protection_absent` is 0. `frame_length` covers header and payload.

use anyhow::{Result, bail};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

pub const ADTS_HEADER_LEN: usize = 7;
pub const ADTS_CRC_LEN: usize = 2;

/// Samples per channel in one raw data block.
pub const AAC_SAMPLES_PER_BLOCK: usize = 1024;

const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// 0 for MPEG-4, 1 for MPEG-2.
    pub id: u8,
    pub protection_absent: bool,
    /// Audio object type minus one (1 = AAC LC).
    pub profile: u8,
    pub sample_rate_index: u8,
    pub channel_config: u8,
    pub frame_length: usize,
    pub buffer_fullness: u16,
    pub raw_data_blocks: u8,
}

impl AdtsHeader {
    /// Parses the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ADTS_HEADER_LEN {
            bail!(HeaderError::Truncated {
                needed: ADTS_HEADER_LEN,
                available: bytes.len(),
            });
        }

        let mut reader = BsIoSliceReader::from_slice(&bytes[..ADTS_HEADER_LEN]);
        Self::read(&mut reader)
    }

    fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let sync: u16 = reader.get_n(12)?;
        if sync != 0xFFF {
            bail!(HeaderError::InvalidSync(sync));
        }

        let id = reader.get_n(1)?;
        let layer: u8 = reader.get_n(2)?;
        if layer != 0 {
            bail!(HeaderError::InvalidAdtsLayer(layer));
        }
        let protection_absent = reader.get()?;

        let profile = reader.get_n(2)?;
        let sample_rate_index: u8 = reader.get_n(4)?;
        if sample_rate_index as usize >= SAMPLE_RATES.len() {
            bail!(HeaderError::ReservedSampleRate(sample_rate_index));
        }
        reader.skip_n(1)?;

        let channel_config: u8 = reader.get_n(3)?;
        if channel_config == 0 {
            bail!(HeaderError::ProgramConfigElement);
        }
        // original_copy, home, copyright_identification_bit/start
        reader.skip_n(4)?;

        let frame_length: usize = reader.get_n::<u16>(13)? as usize;
        let buffer_fullness = reader.get_n(11)?;
        let raw_data_blocks: u8 = reader.get_n(2)?;

        let header = Self {
            id,
            protection_absent,
            profile,
            sample_rate_index,
            channel_config,
            frame_length,
            buffer_fullness,
            raw_data_blocks,
        };

        if frame_length <= header.header_len() {
            bail!(HeaderError::FrameTooShort {
                length: frame_length,
                header: header.header_len(),
            });
        }
        if raw_data_blocks != 0 {
            bail!(HeaderError::MultipleRawDataBlocks(raw_data_blocks + 1));
        }

        Ok(header)
    }

    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_LEN
        } else {
            ADTS_HEADER_LEN + ADTS_CRC_LEN
        }
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATES[self.sample_rate_index as usize]
    }

    /// Channel count for configurations 1-7 (7 maps to 7.1).
    pub fn channels(&self) -> u16 {
        match self.channel_config {
            7 => 8,
            c => c as u16,
        }
    }

    /// Samples per channel in this frame.
    pub fn samples_per_frame(&self) -> usize {
        AAC_SAMPLES_PER_BLOCK * (self.raw_data_blocks as usize + 1)
    }

    /// Bitrate in kbit/s implied by this frame's length.
    pub fn bitrate(&self) -> u32 {
        ((self.frame_length * 8) as u64 * self.sample_rate() as u64
            / self.samples_per_frame() as u64
            / 1000) as u32
    }

    /// Two-byte AudioSpecificConfig describing this stream (GASpecificConfig
    /// with 1024-sample frames, no core coder, no extension).
    pub fn audio_specific_config(&self) -> [u8; 2] {
        let object_type = (self.profile as u16) + 1;
        let config = (object_type << 11)
            | ((self.sample_rate_index as u16) << 7)
            | ((self.channel_config as u16) << 3);
        config.to_be_bytes()
    }

    /// Raw data block following the header.
    pub fn payload<'a>(&self, frame: &'a [u8]) -> &'a [u8] {
        &frame[self.header_len()..self.frame_length.min(frame.len())]
    }
}

#[cfg(test)]
pub(crate) fn build_adts_header(
    frame_length: usize,
    sample_rate_index: u8,
    channel_config: u8,
) -> [u8; 7] {
    let fullness: usize = 0x7FF;
    [
        0xFF,
        0xF1,
        0x40 | (sample_rate_index << 2) | (channel_config >> 2),
        ((channel_config & 3) << 6) | ((frame_length >> 11) & 0x03) as u8,
        ((frame_length >> 3) & 0xFF) as u8,
        (((frame_length & 7) << 5) as u8) | ((fullness >> 6) & 0x1F) as u8,
        ((fullness & 0x3F) << 2) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lc_stereo_header() -> Result<()> {
        let header = AdtsHeader::parse(&build_adts_header(371, 4, 2))?;

        assert_eq!(header.id, 0);
        assert!(header.protection_absent);
        assert_eq!(header.profile, 1);
        assert_eq!(header.sample_rate(), 44100);
        assert_eq!(header.channels(), 2);
        assert_eq!(header.frame_length, 371);
        assert_eq!(header.buffer_fullness, 0x7FF);
        assert_eq!(header.header_len(), 7);
        assert_eq!(header.samples_per_frame(), 1024);
        assert_eq!(header.bitrate(), 127);
        Ok(())
    }

    #[test]
    fn audio_specific_config_matches_header() -> Result<()> {
        let header = AdtsHeader::parse(&build_adts_header(200, 3, 1))?;

        // AAC LC, 48 kHz, mono
        assert_eq!(header.audio_specific_config(), [0x11, 0x88]);
        Ok(())
    }

    #[test]
    fn rejects_invalid_headers() {
        let error = |bytes: &[u8]| {
            AdtsHeader::parse(bytes)
                .unwrap_err()
                .downcast::<HeaderError>()
                .unwrap()
        };

        let mut bytes = build_adts_header(371, 4, 2);
        bytes[1] = 0xF3;
        assert_eq!(error(&bytes), HeaderError::InvalidAdtsLayer(1));

        assert_eq!(
            error(&build_adts_header(371, 13, 2)),
            HeaderError::ReservedSampleRate(13)
        );
        assert_eq!(
            error(&build_adts_header(371, 4, 0)),
            HeaderError::ProgramConfigElement
        );
        assert_eq!(
            error(&build_adts_header(5, 4, 2)),
            HeaderError::FrameTooShort {
                length: 5,
                header: 7
            }
        );

        let mut bytes = build_adts_header(371, 4, 2);
        bytes[6] |= 0x01;
        assert_eq!(error(&bytes), HeaderError::MultipleRawDataBlocks(2));

        assert_eq!(
            error(&bytes[..3]),
            HeaderError::Truncated {
                needed: 7,
                available: 3
            }
        );
    }
}
