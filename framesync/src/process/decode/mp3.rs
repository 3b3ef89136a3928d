use log::{debug, warn};
use symphonia::core::codecs::{CODEC_TYPE_MP3, CodecParameters};

use super::backend::{SymphoniaBackend, channel_layout};
use super::{DecodeOutcome, FrameDecoder};
use crate::structs::frame_info::FrameInfo;
use crate::structs::mpeg::{MPEG_HEADER_LEN, MpegAudioHeader};
use crate::utils::errors::DecoderError;

/// MPEG-1/2/2.5 Layer III frame decoder.
///
/// The frame length is taken from the header, so a window shorter than the
/// frame reports an underflow before any decoding happens. Protected frames
/// are CRC checked. The codec is reopened when the sample rate or channel
/// mode changes between frames.
pub struct Mp3Decoder {
    backend: SymphoniaBackend,
    allocated: bool,
    format: Option<(u32, u16)>,
    info: FrameInfo,
}

impl Default for Mp3Decoder {
    fn default() -> Self {
        Self {
            backend: SymphoniaBackend::new("MP3", CODEC_TYPE_MP3),
            allocated: false,
            format: None,
            info: FrameInfo::default(),
        }
    }
}

impl Mp3Decoder {
    fn open(&mut self, header: &MpegAudioHeader) -> Result<(), DecoderError> {
        let format = (header.sample_rate, header.channels());
        if self.backend.is_open() && self.format == Some(format) {
            return Ok(());
        }
        if self.format.is_some() {
            debug!(
                "MP3 format changed, reopening codec: {} Hz, {} ch",
                format.0, format.1
            );
        }

        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_MP3)
            .with_sample_rate(format.0)
            .with_channels(channel_layout(format.1));

        self.backend.close();
        self.format = None;
        self.backend.open(&params)?;
        self.format = Some(format);
        Ok(())
    }
}

impl FrameDecoder for Mp3Decoder {
    fn name(&self) -> &'static str {
        "MP3"
    }

    fn allocate(&mut self) -> Result<(), DecoderError> {
        self.backend.check_available()?;
        self.allocated = true;
        self.info = FrameInfo::default();
        Ok(())
    }

    fn release(&mut self) {
        if self.allocated {
            debug!("Releasing MP3 decoder");
        }
        self.backend.close();
        self.allocated = false;
        self.format = None;
        self.info = FrameInfo::default();
    }

    fn decode(&mut self, window: &[u8], samples: &mut [i16]) -> DecodeOutcome {
        if !self.allocated {
            warn!("{}", DecoderError::NotAllocated);
            return DecodeOutcome::error();
        }
        if window.len() < MPEG_HEADER_LEN {
            return DecodeOutcome::underflow();
        }

        let header = match MpegAudioHeader::parse(window) {
            Ok(header) => header,
            Err(e) => {
                warn!("MP3 frame header rejected: {e}");
                return DecodeOutcome::error();
            }
        };

        let frame_len = header.frame_len();
        if window.len() < frame_len {
            return DecodeOutcome::underflow();
        }
        let frame = &window[..frame_len];

        if let Err(e) = header.verify_crc(frame) {
            warn!("MP3 frame rejected: {e}");
            return DecodeOutcome::error();
        }

        if let Err(e) = self.open(&header) {
            warn!("{e}");
            return DecodeOutcome::error();
        }

        let duration = header.samples_per_frame() as u64;
        match self.backend.decode(frame, duration, samples) {
            Ok(pcm) => {
                self.info = FrameInfo {
                    channels: pcm.channels,
                    sample_rate: pcm.sample_rate,
                    bits_per_sample: 16,
                    output_samples: pcm.samples,
                    bitrate: header.bitrate,
                };
                DecodeOutcome::success(frame_len)
            }
            Err(e) => {
                warn!("MP3 frame could not be decoded: {e}");
                DecodeOutcome::error()
            }
        }
    }

    fn last_frame_info(&self) -> FrameInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::decode::DecodeStatus;

    const MONO_44100: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC0];
    const STEREO_44100: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
    // MPEG-2, 64 kbit/s, 22.05 kHz, stereo
    const STEREO_22050: [u8; 4] = [0xFF, 0xF3, 0x80, 0x00];

    fn silent(header: [u8; 4], len: usize) -> Vec<u8> {
        let mut frame = vec![0u8; len];
        frame[..4].copy_from_slice(&header);
        frame
    }

    fn silent_frame() -> Vec<u8> {
        // MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, mono, zeroed side info
        silent(MONO_44100, 417)
    }

    #[test]
    fn short_windows_underflow() -> anyhow::Result<()> {
        let mut decoder = Mp3Decoder::default();
        decoder.allocate()?;
        let mut samples = vec![0i16; 2560];
        let frame = silent_frame();

        assert_eq!(
            decoder.decode(&frame[..2], &mut samples),
            DecodeOutcome::underflow()
        );
        assert_eq!(
            decoder.decode(&frame[..300], &mut samples),
            DecodeOutcome::underflow()
        );
        Ok(())
    }

    #[test]
    fn corrupt_header_is_an_error() -> anyhow::Result<()> {
        let mut decoder = Mp3Decoder::default();
        decoder.allocate()?;
        let mut samples = vec![0i16; 2560];

        let mut frame = silent_frame();
        frame[2] = 0xF0;
        let outcome = decoder.decode(&frame, &mut samples);
        assert_eq!(outcome.status, DecodeStatus::Error);
        assert_eq!(outcome.bytes_consumed, 0);
        Ok(())
    }

    #[test]
    fn decodes_silent_frame() -> anyhow::Result<()> {
        let mut decoder = Mp3Decoder::default();
        decoder.allocate()?;
        let mut samples = vec![1i16; 2560];

        let mut window = silent_frame();
        window.extend_from_slice(&[0xFF, 0xFB, 0x90]);
        let outcome = decoder.decode(&window, &mut samples);

        assert_eq!(outcome, DecodeOutcome::success(417));
        let info = decoder.last_frame_info();
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.output_samples, 1152);
        assert_eq!(info.bitrate, 128);
        assert!(samples[..1152].iter().all(|&s| s == 0));
        Ok(())
    }

    #[test]
    fn format_changes_reopen_the_codec() -> anyhow::Result<()> {
        let mut decoder = Mp3Decoder::default();
        decoder.allocate()?;
        let mut samples = vec![0i16; 2560];

        let frames = [
            (silent(MONO_44100, 417), 1, 44100, 1152),
            (silent(STEREO_44100, 417), 2, 44100, 2304),
            (silent(STEREO_22050, 208), 2, 22050, 1152),
            (silent(MONO_44100, 417), 1, 44100, 1152),
        ];

        for (frame, channels, sample_rate, output_samples) in frames {
            let outcome = decoder.decode(&frame, &mut samples);
            assert_eq!(outcome, DecodeOutcome::success(frame.len()));

            let info = decoder.last_frame_info();
            assert_eq!(info.channels, channels);
            assert_eq!(info.sample_rate, sample_rate);
            assert_eq!(info.output_samples, output_samples);
        }
        Ok(())
    }

    #[test]
    fn session_follows_format_changes() -> anyhow::Result<()> {
        use crate::process::decode::Codec;
        use crate::process::session::Session;

        let mut stream = Vec::new();
        for (header, len) in [(MONO_44100, 417), (STEREO_44100, 417), (STEREO_22050, 208)] {
            for _ in 0..3 {
                stream.extend(silent(header, len));
            }
        }

        let mut session = Session::for_codec(Codec::Mp3);
        session.begin()?;
        for chunk in stream.chunks(500) {
            assert_eq!(session.write(chunk)?, chunk.len());
        }

        let stats = session.stats();
        assert_eq!(stats.frames_decoded, 9);
        assert_eq!(stats.resyncs, 0);
        assert_eq!(stats.bytes_discarded, 0);
        assert_eq!(session.last_frame_info().sample_rate, 22050);
        Ok(())
    }

    #[test]
    fn release_is_idempotent() -> anyhow::Result<()> {
        let mut decoder = Mp3Decoder::default();
        decoder.allocate()?;
        decoder.release();
        decoder.release();

        let mut samples = vec![0i16; 2560];
        let outcome = decoder.decode(&silent_frame(), &mut samples);
        assert_eq!(outcome.status, DecodeStatus::Error);
        assert_eq!(decoder.last_frame_info(), FrameInfo::default());
        Ok(())
    }
}
