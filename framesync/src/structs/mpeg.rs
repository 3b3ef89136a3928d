//! MPEG audio frame header.
//!
//! ## Layout
//!
//! 32 bits: 11-bit sync, version, layer, protection bit, bitrate index,
//! sample rate index, padding, private bit, channel mode, mode extension,
//! copyright, original, emphasis. A 16-bit CRC follows when the protection
//! bit is 0.
//!
//! Only Layer III is accepted. Frame length is derived from the bitrate and
//! sample rate, so free-format streams (bitrate index 0) are rejected.

use anyhow::{Result, bail};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::crc::CRC_MPEG_AUDIO;
use crate::utils::errors::HeaderError;

pub const MPEG_HEADER_LEN: usize = 4;
pub const MPEG_CRC_LEN: usize = 2;

const BITRATES_V1_L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];
const BITRATES_V2_L3: [u32; 15] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160,
];
const SAMPLE_RATES_V1: [u32; 3] = [44100, 48000, 32000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegAudioHeader {
    pub version: MpegVersion,
    pub layer: u8,
    pub protected: bool,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub private: bool,
    pub channel_mode: ChannelMode,
    pub mode_extension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: u8,
}

impl MpegAudioHeader {
    /// Parses the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MPEG_HEADER_LEN {
            bail!(HeaderError::Truncated {
                needed: MPEG_HEADER_LEN,
                available: bytes.len(),
            });
        }

        let mut reader = BsIoSliceReader::from_slice(&bytes[..MPEG_HEADER_LEN]);
        Self::read(&mut reader)
    }

    fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let sync: u16 = reader.get_n(11)?;
        if sync != 0x7FF {
            bail!(HeaderError::InvalidSync(sync));
        }

        let version = match reader.get_n::<u8>(2)? {
            0b00 => MpegVersion::Mpeg25,
            0b10 => MpegVersion::Mpeg2,
            0b11 => MpegVersion::Mpeg1,
            _ => bail!(HeaderError::ReservedVersion),
        };

        let layer = match reader.get_n::<u8>(2)? {
            0b01 => 3,
            0b10 => 2,
            0b11 => 1,
            _ => 0,
        };
        if layer != 3 {
            bail!(HeaderError::UnsupportedLayer(layer));
        }

        let protected = !reader.get()?;

        let bitrate_index: u8 = reader.get_n(4)?;
        let bitrate = match bitrate_index {
            0 => bail!(HeaderError::FreeFormatBitrate),
            15 => bail!(HeaderError::InvalidBitrateIndex(bitrate_index)),
            i if version == MpegVersion::Mpeg1 => BITRATES_V1_L3[i as usize],
            i => BITRATES_V2_L3[i as usize],
        };

        let sample_rate_index: u8 = reader.get_n(2)?;
        if sample_rate_index == 3 {
            bail!(HeaderError::ReservedSampleRate(sample_rate_index));
        }
        let sample_rate = match version {
            MpegVersion::Mpeg1 => SAMPLE_RATES_V1[sample_rate_index as usize],
            MpegVersion::Mpeg2 => SAMPLE_RATES_V1[sample_rate_index as usize] >> 1,
            MpegVersion::Mpeg25 => SAMPLE_RATES_V1[sample_rate_index as usize] >> 2,
        };

        let padding = reader.get()?;
        let private = reader.get()?;

        let channel_mode = match reader.get_n::<u8>(2)? {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        let mode_extension = reader.get_n(2)?;
        let copyright = reader.get()?;
        let original = reader.get()?;

        let emphasis = reader.get_n(2)?;
        if emphasis == 0b10 {
            bail!(HeaderError::ReservedEmphasis);
        }

        Ok(Self {
            version,
            layer,
            protected,
            bitrate,
            sample_rate,
            padding,
            private,
            channel_mode,
            mode_extension,
            copyright,
            original,
            emphasis,
        })
    }

    pub fn channels(&self) -> u16 {
        if self.channel_mode == ChannelMode::Mono {
            1
        } else {
            2
        }
    }

    /// Samples per channel in one frame.
    pub fn samples_per_frame(&self) -> usize {
        match self.version {
            MpegVersion::Mpeg1 => 1152,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 576,
        }
    }

    /// Total frame length in bytes, header included.
    pub fn frame_len(&self) -> usize {
        let coefficient = match self.version {
            MpegVersion::Mpeg1 => 144,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 72,
        };

        (coefficient * self.bitrate as usize * 1000) / self.sample_rate as usize
            + self.padding as usize
    }

    /// Layer III side information length in bytes.
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::Mpeg1, ChannelMode::Mono) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, _) => 17,
        }
    }

    /// Checks the frame CRC. Unprotected frames always pass.
    ///
    /// `frame` must hold at least the header, CRC and side information.
    pub fn verify_crc(&self, frame: &[u8]) -> Result<()> {
        if !self.protected {
            return Ok(());
        }

        let side_info_start = MPEG_HEADER_LEN + MPEG_CRC_LEN;
        let needed = side_info_start + self.side_info_len();
        if frame.len() < needed {
            bail!(HeaderError::Truncated {
                needed,
                available: frame.len(),
            });
        }

        let crc = CRC_MPEG_AUDIO.update(CRC_MPEG_AUDIO.init, &frame[2..MPEG_HEADER_LEN]);
        let calculated = CRC_MPEG_AUDIO.update(crc, &frame[side_info_start..needed]);
        let read = u16::from_be_bytes([frame[4], frame[5]]);
        if calculated != read {
            bail!(HeaderError::CrcMismatch { calculated, read });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_error(bytes: &[u8]) -> HeaderError {
        MpegAudioHeader::parse(bytes)
            .unwrap_err()
            .downcast::<HeaderError>()
            .unwrap()
    }

    #[test]
    fn mpeg1_layer3_mono() -> Result<()> {
        let header = MpegAudioHeader::parse(&[0xFF, 0xFB, 0x90, 0xC0])?;

        assert_eq!(header.version, MpegVersion::Mpeg1);
        assert_eq!(header.layer, 3);
        assert!(!header.protected);
        assert_eq!(header.bitrate, 128);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.channels(), 1);
        assert_eq!(header.frame_len(), 417);
        assert_eq!(header.samples_per_frame(), 1152);
        assert_eq!(header.side_info_len(), 17);
        Ok(())
    }

    #[test]
    fn mpeg2_layer3_padded_stereo() -> Result<()> {
        let header = MpegAudioHeader::parse(&[0xFF, 0xF3, 0x82, 0x00])?;

        assert_eq!(header.version, MpegVersion::Mpeg2);
        assert_eq!(header.bitrate, 64);
        assert_eq!(header.sample_rate, 22050);
        assert!(header.padding);
        assert_eq!(header.channels(), 2);
        assert_eq!(header.frame_len(), 209);
        assert_eq!(header.samples_per_frame(), 576);
        Ok(())
    }

    #[test]
    fn mpeg25_sample_rates() -> Result<()> {
        let header = MpegAudioHeader::parse(&[0xFF, 0xE3, 0x84, 0xC0])?;

        assert_eq!(header.version, MpegVersion::Mpeg25);
        assert_eq!(header.sample_rate, 12000);
        Ok(())
    }

    #[test]
    fn rejects_invalid_headers() {
        assert_eq!(
            header_error(&[0xFF, 0xFB]),
            HeaderError::Truncated {
                needed: 4,
                available: 2
            }
        );
        assert_eq!(
            header_error(&[0xFE, 0xFB, 0x90, 0xC0]),
            HeaderError::InvalidSync(0x7F7)
        );
        assert_eq!(
            header_error(&[0xFF, 0xEB, 0x90, 0xC0]),
            HeaderError::ReservedVersion
        );
        assert_eq!(
            header_error(&[0xFF, 0xFD, 0x90, 0xC0]),
            HeaderError::UnsupportedLayer(2)
        );
        assert_eq!(
            header_error(&[0xFF, 0xFB, 0x00, 0xC0]),
            HeaderError::FreeFormatBitrate
        );
        assert_eq!(
            header_error(&[0xFF, 0xFB, 0xF0, 0xC0]),
            HeaderError::InvalidBitrateIndex(15)
        );
        assert_eq!(
            header_error(&[0xFF, 0xFB, 0x9C, 0xC0]),
            HeaderError::ReservedSampleRate(3)
        );
        assert_eq!(
            header_error(&[0xFF, 0xFB, 0x90, 0xC2]),
            HeaderError::ReservedEmphasis
        );
    }

    #[test]
    fn crc_protected_frame() -> Result<()> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFA, 0x90, 0xC0]);
        frame[6] = 0x12;
        frame[10] = 0x34;

        let header = MpegAudioHeader::parse(&frame)?;
        assert!(header.protected);

        let crc = CRC_MPEG_AUDIO.update(CRC_MPEG_AUDIO.init, &frame[2..4]);
        let crc = CRC_MPEG_AUDIO.update(crc, &frame[6..6 + 17]);
        frame[4..6].copy_from_slice(&crc.to_be_bytes());
        header.verify_crc(&frame)?;

        frame[8] ^= 0x01;
        let error = header.verify_crc(&frame).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<HeaderError>(),
            Some(HeaderError::CrcMismatch { .. })
        ));
        Ok(())
    }
}
