use std::fmt::Display;

/// Format of one decoded frame as reported by the decoder.
///
/// The zeroed default is the "nothing decoded yet" state a session starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameInfo {
    /// Channel count.
    pub channels: u16,

    /// Sampling frequency in Hz.
    pub sample_rate: u32,

    /// Bits per output sample.
    pub bits_per_sample: u16,

    /// Interleaved sample count of the frame (all channels).
    pub output_samples: usize,

    /// Bitrate in kbit/s.
    pub bitrate: u32,
}

impl FrameInfo {
    /// Whether the stream format differs in a way a consumer must react to.
    ///
    /// Only the sample rate and channel count are compared; the bitrate and
    /// sample count change freely in VBR streams.
    pub fn format_changed(&self, other: &FrameInfo) -> bool {
        self.sample_rate != other.sample_rate || self.channels != other.channels
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.output_samples / self.channels as usize
        }
    }

    /// Size of the frame's PCM output in bytes.
    pub fn output_bytes(&self) -> usize {
        self.output_samples * (self.bits_per_sample as usize / 8)
    }

    /// Playback duration of the frame in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }
}

impl Display for FrameInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {} bit, {} kbit/s",
            self.sample_rate, self.channels, self.bits_per_sample, self.bitrate
        )
    }
}

#[test]
fn format_change_ignores_bitrate() {
    let a = FrameInfo {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        output_samples: 2304,
        bitrate: 128,
    };
    let b = FrameInfo { bitrate: 320, ..a };
    let c = FrameInfo {
        sample_rate: 48000,
        ..a
    };

    assert!(!a.format_changed(&b));
    assert!(a.format_changed(&c));
    assert!(a.format_changed(&FrameInfo::default()));
    assert_eq!(a.frames(), 1152);
    assert_eq!(a.output_bytes(), 4608);
}
