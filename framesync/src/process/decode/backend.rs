//! Single-frame PCM decoding through the symphonia codec registry.

use log::debug;
use symphonia::core::audio::{Channels, SampleBuffer as PcmBuffer, SignalSpec};
use symphonia::core::codecs::{CodecParameters, CodecType, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::Packet;
use symphonia::default::get_codecs;

use crate::utils::errors::DecoderError;

/// Format and size of one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PcmFrame {
    pub channels: u16,
    pub sample_rate: u32,
    /// Interleaved samples produced, which may exceed what fit in the output.
    pub samples: usize,
}

pub(crate) struct SymphoniaBackend {
    name: &'static str,
    codec: CodecType,
    decoder: Option<Box<dyn Decoder>>,
    pcm: Option<PcmBuffer<i16>>,
    pcm_spec: Option<SignalSpec>,
    pcm_frames: u64,
    ts: u64,
    reset_pending: bool,
}

impl SymphoniaBackend {
    pub fn new(name: &'static str, codec: CodecType) -> Self {
        Self {
            name,
            codec,
            decoder: None,
            pcm: None,
            pcm_spec: None,
            pcm_frames: 0,
            ts: 0,
            reset_pending: false,
        }
    }

    pub fn check_available(&self) -> Result<(), DecoderError> {
        if get_codecs().get_codec(self.codec).is_none() {
            return Err(DecoderError::CodecUnavailable(self.name));
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn open(&mut self, params: &CodecParameters) -> Result<(), DecoderError> {
        let decoder = get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| DecoderError::Backend(format!("{}: {e}", self.name)))?;

        debug!("Opened {} codec instance", self.name);
        self.decoder = Some(decoder);
        Ok(())
    }

    pub fn close(&mut self) {
        self.decoder = None;
        self.pcm = None;
        self.pcm_spec = None;
        self.pcm_frames = 0;
        self.ts = 0;
        self.reset_pending = false;
    }

    /// Decodes one packet into `out` as interleaved 16-bit samples.
    ///
    /// Samples beyond `out.len()` are dropped, the returned count is the
    /// decoder's own.
    pub fn decode(
        &mut self,
        data: &[u8],
        duration: u64,
        out: &mut [i16],
    ) -> Result<PcmFrame, DecoderError> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(DecoderError::NotAllocated);
        };

        if std::mem::take(&mut self.reset_pending) {
            decoder.reset();
        }

        let packet = Packet::new_from_slice(0, self.ts, duration, data);
        self.ts += duration;

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::ResetRequired) => {
                self.reset_pending = true;
                return Err(DecoderError::Backend(format!(
                    "{}: decoder reset required",
                    self.name
                )));
            }
            Err(e) => return Err(DecoderError::Backend(format!("{}: {e}", self.name))),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames() as u64;
        let channels = spec.channels.count() as u16;
        if frames == 0 {
            return Ok(PcmFrame {
                channels,
                sample_rate: spec.rate,
                samples: 0,
            });
        }

        if self.pcm_spec != Some(spec) || self.pcm_frames < frames {
            self.pcm = None;
            self.pcm_spec = Some(spec);
            self.pcm_frames = frames;
        }
        let pcm = self.pcm.get_or_insert_with(|| PcmBuffer::new(frames, spec));
        pcm.copy_interleaved_ref(decoded);

        let samples = pcm.samples();
        let count = samples.len().min(out.len());
        out[..count].copy_from_slice(&samples[..count]);

        Ok(PcmFrame {
            channels,
            sample_rate: spec.rate,
            samples: samples.len(),
        })
    }
}

/// Speaker layout for a channel count, following the MPEG-4 channel
/// configurations.
pub(crate) fn channel_layout(channels: u16) -> Channels {
    let front = Channels::FRONT_LEFT | Channels::FRONT_RIGHT;
    match channels {
        1 => Channels::FRONT_CENTRE,
        2 => front,
        3 => front | Channels::FRONT_CENTRE,
        4 => front | Channels::FRONT_CENTRE | Channels::REAR_CENTRE,
        5 => front | Channels::FRONT_CENTRE | Channels::REAR_LEFT | Channels::REAR_RIGHT,
        6 => {
            front
                | Channels::FRONT_CENTRE
                | Channels::REAR_LEFT
                | Channels::REAR_RIGHT
                | Channels::LFE1
        }
        _ => {
            front
                | Channels::FRONT_CENTRE
                | Channels::SIDE_LEFT
                | Channels::SIDE_RIGHT
                | Channels::REAR_LEFT
                | Channels::REAR_RIGHT
                | Channels::LFE1
        }
    }
}
