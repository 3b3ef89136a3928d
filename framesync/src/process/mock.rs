//! Scripted decoder and sync finder for engine tests.
//!
//! Frame layout: `A5 5A <len:u16 BE> <kind> <format> <filler...>`, `len`
//! covering the whole frame. The kind byte selects how the decoder treats
//! the frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::process::decode::{DecodeOutcome, FrameDecoder};
use crate::process::locate::SyncFinder;
use crate::structs::frame_info::FrameInfo;
use crate::utils::errors::DecoderError;

pub const MARKER: [u8; 2] = [0xA5, 0x5A];
const HEADER_LEN: usize = 6;

pub const AUDIO: u8 = 0;
pub const CORRUPT: u8 = 1;
pub const STALL: u8 = 2;

pub fn frame(len: usize, kind: u8, format: u8) -> Vec<u8> {
    let mut frame = vec![0x33; len];
    frame[..2].copy_from_slice(&MARKER);
    frame[2..4].copy_from_slice(&(len as u16).to_be_bytes());
    frame[4] = kind;
    frame[5] = format;
    frame
}

pub fn noise(len: usize) -> Vec<u8> {
    vec![0x11; len]
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MockFinder;

impl SyncFinder for MockFinder {
    fn find_marker(&self, window: &[u8], offset: usize) -> Option<usize> {
        window
            .get(offset..)?
            .windows(2)
            .position(|pair| pair == MARKER)
            .map(|pos| pos + offset)
    }
}

#[derive(Debug, Default)]
pub struct MockDecoder {
    pub fail_allocate: bool,
    pub releases: Arc<AtomicUsize>,
    pub allocated: bool,
    pub info: FrameInfo,
}

impl FrameDecoder for MockDecoder {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn allocate(&mut self) -> Result<(), DecoderError> {
        if self.fail_allocate {
            return Err(DecoderError::CodecUnavailable("mock"));
        }
        self.allocated = true;
        Ok(())
    }

    fn release(&mut self) {
        if self.allocated {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
        self.allocated = false;
        self.info = FrameInfo::default();
    }

    fn decode(&mut self, window: &[u8], samples: &mut [i16]) -> DecodeOutcome {
        if window.len() < HEADER_LEN {
            return DecodeOutcome::underflow();
        }
        if window[..2] != MARKER {
            return DecodeOutcome::error();
        }

        let len = u16::from_be_bytes([window[2], window[3]]) as usize;
        if len < HEADER_LEN {
            return DecodeOutcome::error();
        }
        if window.len() < len {
            return DecodeOutcome::underflow();
        }

        match window[4] {
            CORRUPT => DecodeOutcome::error(),
            STALL => DecodeOutcome::success(0),
            _ => {
                let format = window[5];
                samples[..4].copy_from_slice(&[len as i16, format as i16, 1, -1]);
                self.info = FrameInfo {
                    channels: 2,
                    sample_rate: if format == 0 { 44100 } else { 48000 },
                    bits_per_sample: 16,
                    output_samples: 4,
                    bitrate: 128,
                };
                DecodeOutcome::success(len)
            }
        }
    }

    fn last_frame_info(&self) -> FrameInfo {
        self.info
    }
}
