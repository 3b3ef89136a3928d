use log::{debug, warn};
use symphonia::core::codecs::{CODEC_TYPE_AAC, CodecParameters};

use super::backend::{SymphoniaBackend, channel_layout};
use super::{DecodeOutcome, FrameDecoder};
use crate::structs::adts::{ADTS_HEADER_LEN, AdtsHeader};
use crate::structs::frame_info::FrameInfo;
use crate::utils::errors::DecoderError;

/// AAC decoder for ADTS framed streams.
///
/// The codec is configured from an AudioSpecificConfig rebuilt from the ADTS
/// header and reopened whenever that configuration changes mid-stream.
pub struct AacDecoder {
    backend: SymphoniaBackend,
    allocated: bool,
    config: Option<[u8; 2]>,
    info: FrameInfo,
}

impl Default for AacDecoder {
    fn default() -> Self {
        Self {
            backend: SymphoniaBackend::new("AAC", CODEC_TYPE_AAC),
            allocated: false,
            config: None,
            info: FrameInfo::default(),
        }
    }
}

impl AacDecoder {
    fn open(&mut self, header: &AdtsHeader) -> Result<(), DecoderError> {
        let config = header.audio_specific_config();
        if self.backend.is_open() && self.config == Some(config) {
            return Ok(());
        }
        if self.config.is_some() {
            debug!(
                "AAC configuration changed, reopening codec: {} Hz, {} ch",
                header.sample_rate(),
                header.channels()
            );
        }

        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_AAC)
            .with_sample_rate(header.sample_rate())
            .with_channels(channel_layout(header.channels()))
            .with_extra_data(Box::new(config));

        self.backend.close();
        self.config = None;
        self.backend.open(&params)?;
        self.config = Some(config);
        Ok(())
    }
}

impl FrameDecoder for AacDecoder {
    fn name(&self) -> &'static str {
        "AAC"
    }

    fn allocate(&mut self) -> Result<(), DecoderError> {
        self.backend.check_available()?;
        self.allocated = true;
        self.info = FrameInfo::default();
        Ok(())
    }

    fn release(&mut self) {
        if self.allocated {
            debug!("Releasing AAC decoder");
        }
        self.backend.close();
        self.allocated = false;
        self.config = None;
        self.info = FrameInfo::default();
    }

    fn decode(&mut self, window: &[u8], samples: &mut [i16]) -> DecodeOutcome {
        if !self.allocated {
            warn!("{}", DecoderError::NotAllocated);
            return DecodeOutcome::error();
        }
        if window.len() < ADTS_HEADER_LEN {
            return DecodeOutcome::underflow();
        }

        let header = match AdtsHeader::parse(window) {
            Ok(header) => header,
            Err(e) => {
                warn!("ADTS header rejected: {e}");
                return DecodeOutcome::error();
            }
        };

        if window.len() < header.frame_length {
            return DecodeOutcome::underflow();
        }

        if let Err(e) = self.open(&header) {
            warn!("{e}");
            return DecodeOutcome::error();
        }

        let payload = header.payload(window);
        let duration = header.samples_per_frame() as u64;
        match self.backend.decode(payload, duration, samples) {
            Ok(pcm) => {
                self.info = FrameInfo {
                    channels: pcm.channels,
                    sample_rate: pcm.sample_rate,
                    bits_per_sample: 16,
                    output_samples: pcm.samples,
                    bitrate: header.bitrate(),
                };
                DecodeOutcome::success(header.frame_length)
            }
            Err(e) => {
                warn!("AAC frame could not be decoded: {e}");
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
    use crate::structs::adts::build_adts_header;

    // Single channel element with max_sfb 0, then END.
    const SILENT_SCE: [u8; 4] = [0x00, 0x00, 0x00, 0x07];
    // Channel pair element without common window, both channels max_sfb 0,
    // then END.
    const SILENT_CPE: [u8; 7] = [0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0E];

    fn silent(sf_index: u8, channel_config: u8) -> Vec<u8> {
        let payload: &[u8] = if channel_config == 1 {
            &SILENT_SCE
        } else {
            &SILENT_CPE
        };
        let mut frame = build_adts_header(7 + payload.len(), sf_index, channel_config).to_vec();
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn incomplete_frames_underflow() -> anyhow::Result<()> {
        let mut decoder = AacDecoder::default();
        decoder.allocate()?;
        let mut samples = vec![0i16; 4096];

        let mut frame = build_adts_header(300, 4, 2).to_vec();
        frame.resize(120, 0);

        assert_eq!(
            decoder.decode(&frame[..5], &mut samples),
            DecodeOutcome::underflow()
        );
        assert_eq!(
            decoder.decode(&frame, &mut samples),
            DecodeOutcome::underflow()
        );
        Ok(())
    }

    #[test]
    fn unsupported_headers_are_errors() -> anyhow::Result<()> {
        let mut decoder = AacDecoder::default();
        decoder.allocate()?;
        let mut samples = vec![0i16; 4096];

        let mut frame = build_adts_header(300, 4, 0).to_vec();
        frame.resize(300, 0);
        assert_eq!(
            decoder.decode(&frame, &mut samples).status,
            DecodeStatus::Error
        );

        let mut frame = build_adts_header(300, 15, 2).to_vec();
        frame.resize(300, 0);
        assert_eq!(
            decoder.decode(&frame, &mut samples).status,
            DecodeStatus::Error
        );
        Ok(())
    }

    #[test]
    fn unallocated_decoder_rejects_frames() {
        let mut decoder = AacDecoder::default();
        let mut samples = vec![0i16; 4096];

        let mut frame = build_adts_header(300, 4, 2).to_vec();
        frame.resize(300, 0);
        assert_eq!(decoder.decode(&frame, &mut samples), DecodeOutcome::error());
    }

    #[test]
    fn decodes_silent_frames() -> anyhow::Result<()> {
        let mut decoder = AacDecoder::default();
        decoder.allocate()?;
        let mut samples = vec![1i16; 4096];

        let frame = silent(4, 1);
        for _ in 0..3 {
            assert_eq!(
                decoder.decode(&frame, &mut samples),
                DecodeOutcome::success(frame.len())
            );
        }

        let info = decoder.last_frame_info();
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.output_samples, 1024);
        assert!(samples[..1024].iter().all(|&s| s == 0));
        Ok(())
    }

    #[test]
    fn config_changes_reopen_the_codec() -> anyhow::Result<()> {
        let mut decoder = AacDecoder::default();
        decoder.allocate()?;
        let mut samples = vec![0i16; 4096];

        let frames = [
            (silent(4, 1), 1, 44100, 1024),
            (silent(3, 2), 2, 48000, 2048),
            (silent(4, 1), 1, 44100, 1024),
        ];

        for (frame, channels, sample_rate, output_samples) in frames {
            assert_eq!(
                decoder.decode(&frame, &mut samples),
                DecodeOutcome::success(frame.len())
            );

            let info = decoder.last_frame_info();
            assert_eq!(info.channels, channels);
            assert_eq!(info.sample_rate, sample_rate);
            assert_eq!(info.output_samples, output_samples);
        }
        Ok(())
    }

    #[test]
    fn session_skips_noise_before_adts_frames() -> anyhow::Result<()> {
        use crate::process::decode::Codec;
        use crate::process::session::Session;

        let mut stream = vec![0x11; 50];
        for _ in 0..3 {
            stream.extend(silent(4, 1));
        }

        let mut session = Session::for_codec(Codec::Aac);
        session.begin()?;
        for chunk in stream.chunks(5) {
            assert_eq!(session.write(chunk)?, chunk.len());
        }

        let stats = session.stats();
        assert_eq!(stats.frames_decoded, 3);
        assert_eq!(stats.bytes_discarded, 50);
        assert_eq!(stats.resyncs, 0);
        Ok(())
    }
}
