use log::{debug, error, info, trace, warn};

use crate::config::StreamConfig;
use crate::process::decode::{DecodeStatus, FrameDecoder};
use crate::process::locate::{FrameLocator, SyncFinder};
use crate::process::route::Router;
use crate::structs::frame_info::FrameInfo;
use crate::utils::errors::SessionError;
use crate::utils::frame_buffer::FrameBuffer;
use crate::utils::sample_buffer::SampleBuffer;

/// Step the synchronization engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SyncPhase {
    /// No buffers allocated.
    #[default]
    Idle,
    /// Looking for the first frame marker.
    PreSync,
    /// A decode call is in progress.
    Decoding,
    /// Waiting for the rest of a frame.
    Underflow,
    /// Skipping data after a failed or stalled decode.
    Resyncing,
}

/// Counters accumulated over one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EngineStats {
    pub frames_decoded: u64,
    pub frames_routed: u64,
    pub bytes_discarded: u64,
    /// Decode errors followed by a skip to the next marker.
    pub resyncs: u64,
    /// Decode attempts that made no progress.
    pub stalls: u64,
    pub underflows: u64,
}

/// Buffering and (re)synchronization state machine.
///
/// Owns the frame and sample buffers and drives the decoder over the
/// buffered bytes. Every iteration of the decode loop either removes bytes
/// from the frame buffer or ends the loop.
pub struct SyncEngine {
    buffer: FrameBuffer,
    samples: SampleBuffer,
    decoder: Box<dyn FrameDecoder + Send>,
    finder: Box<dyn SyncFinder + Send>,
    min_frame_size: usize,
    stall_limit: usize,
    garbage_tolerance: usize,
    stall_count: usize,
    phase: SyncPhase,
    stats: EngineStats,
}

impl SyncEngine {
    pub fn new(
        decoder: Box<dyn FrameDecoder + Send>,
        finder: Box<dyn SyncFinder + Send>,
    ) -> Self {
        let config = StreamConfig::default();
        Self {
            buffer: FrameBuffer::default(),
            samples: SampleBuffer::default(),
            decoder,
            finder,
            min_frame_size: config.min_frame_size,
            stall_limit: config.stall_limit,
            garbage_tolerance: config.leading_garbage_tolerance,
            stall_count: 0,
            phase: SyncPhase::Idle,
            stats: EngineStats::default(),
        }
    }

    /// Acquires the decoder and sizes the buffers from `config`.
    ///
    /// On failure everything acquired so far is released again.
    pub fn allocate(&mut self, config: &StreamConfig) -> Result<(), SessionError> {
        self.min_frame_size = config.min_frame_size;
        self.stall_limit = config.stall_limit;
        self.garbage_tolerance = config.leading_garbage_tolerance;
        self.stall_count = 0;
        self.stats = EngineStats::default();

        if let Err(e) = self.decoder.allocate() {
            self.release();
            return Err(e.into());
        }

        self.buffer.set_clear_with_zero(config.clear_with_zero);
        if self.buffer.resize(config.max_frame_size).is_err() {
            self.release();
            return Err(SessionError::BufferAllocation {
                what: "frame buffer",
                size: config.max_frame_size,
            });
        }
        if self.samples.resize(config.sample_capacity()).is_err() {
            self.release();
            return Err(SessionError::BufferAllocation {
                what: "sample buffer",
                size: config.max_pcm_size,
            });
        }

        self.phase = SyncPhase::PreSync;
        Ok(())
    }

    /// Releases the decoder, then the buffers.
    pub fn release(&mut self) {
        self.decoder.release();
        self.buffer.release();
        self.samples.release();
        self.stall_count = 0;
        self.phase = SyncPhase::Idle;
    }

    /// Appends as much of `data` as fits and returns the number of bytes taken.
    pub fn append(&mut self, data: &[u8]) -> usize {
        self.buffer.append(data)
    }

    /// Decodes buffered frames.
    ///
    /// Unless `force` is set nothing happens while fewer than the minimum
    /// frame size bytes are buffered. The loop ends when no marker is found,
    /// the decoder needs more data, a stall is tolerated or the buffer runs
    /// empty.
    pub fn drain(&mut self, router: &mut Router, force: bool) {
        loop {
            if self.buffer.is_empty()
                || (!force && self.buffer.available() < self.min_frame_size)
            {
                self.phase = SyncPhase::PreSync;
                break;
            }
            let Some(offset) = self.presync() else {
                break;
            };
            if !self.step(offset, router) {
                break;
            }
        }
    }

    /// Decodes resident frames whose end is marked by a following frame
    /// marker. A trailing frame without one is never handed to the decoder.
    pub fn flush(&mut self, router: &mut Router) {
        loop {
            if self.buffer.is_empty() {
                break;
            }
            let Some(offset) = self.presync() else {
                break;
            };

            let window = self.locator().frame_window(offset);
            let Some(span) = window.span() else {
                debug!(
                    "Flush keeps {} bytes without an end marker",
                    self.buffer.available()
                );
                break;
            };
            trace!("Flushing frame of about {span} bytes");
            if !self.step(offset, router) {
                break;
            }
        }
    }

    fn locator(&self) -> FrameLocator<'_> {
        FrameLocator::new(&self.buffer, self.finder.as_ref())
    }

    /// Strips data in front of the first marker and returns the offset the
    /// next decode starts at.
    fn presync(&mut self) -> Option<usize> {
        self.phase = SyncPhase::PreSync;

        let first = self.locator().find_sync(0);
        match first {
            None => {
                // The tail may hold the first bytes of a marker split across writes.
                let available = self.buffer.available();
                let keep = self.finder.marker_len().saturating_sub(1).min(available);
                if available > keep {
                    info!(
                        "No frame marker in {available} buffered bytes, discarding {}",
                        available - keep
                    );
                    self.discard(available - keep);
                }
                None
            }
            Some(pos) if pos > self.garbage_tolerance => {
                info!("Skipping {pos} bytes in front of the first frame marker");
                self.discard(pos);
                Some(0)
            }
            Some(pos) => Some(pos),
        }
    }

    /// One decode attempt at `offset`. Returns whether the loop may continue.
    fn step(&mut self, offset: usize, router: &mut Router) -> bool {
        self.phase = SyncPhase::Decoding;

        let window = &self.buffer.data()[offset..];
        let window_len = window.len();
        let outcome = self.decoder.decode(window, self.samples.as_mut_slice());

        match outcome.status {
            DecodeStatus::Success if outcome.bytes_consumed > 0 => {
                self.on_frame(offset, outcome.bytes_consumed, window_len, router);
                true
            }
            DecodeStatus::Success => self.on_stall(offset),
            DecodeStatus::Underflow => self.on_underflow(offset),
            DecodeStatus::Error => {
                self.on_error(offset);
                true
            }
        }
    }

    fn on_frame(
        &mut self,
        offset: usize,
        consumed: usize,
        window_len: usize,
        router: &mut Router,
    ) {
        debug_assert!(
            consumed <= window_len,
            "decoder consumed {consumed} bytes from a {window_len} byte window"
        );
        let consumed = if consumed > window_len {
            error!(
                "{} decoder consumed {consumed} bytes from a {window_len} byte window",
                self.decoder.name()
            );
            window_len
        } else {
            consumed
        };

        let mut info = self.decoder.last_frame_info();
        let capacity = self.samples.capacity();
        debug_assert!(
            info.output_samples <= capacity,
            "frame of {} samples exceeds the sample buffer ({capacity})",
            info.output_samples
        );
        if info.output_samples > capacity {
            error!(
                "Frame of {} samples exceeds the sample buffer ({capacity}), max_pcm_size is too small",
                info.output_samples
            );
            info.output_samples = capacity;
        }

        self.stats.frames_decoded += 1;
        if router.route(&info, self.samples.samples(info.output_samples)) {
            self.stats.frames_routed += 1;
        }

        self.stats.bytes_discarded += offset as u64;
        self.buffer.consume_front(offset + consumed);
        self.stall_count = 0;
        debug!(
            "Decoded {consumed} byte frame, {} bytes buffered",
            self.buffer.available()
        );
    }

    fn on_stall(&mut self, offset: usize) -> bool {
        self.stall_count += 1;
        self.stats.stalls += 1;

        if self.stall_count <= self.stall_limit {
            debug!(
                "Decoder made no progress ({}/{}), waiting for more data",
                self.stall_count, self.stall_limit
            );
            return false;
        }

        warn!(
            "{} decoder made no progress {} times in a row, skipping the frame",
            self.decoder.name(),
            self.stall_count
        );
        self.resync_from(offset + self.finder.marker_len())
    }

    fn on_underflow(&mut self, offset: usize) -> bool {
        if self.buffer.is_full() {
            self.stats.stalls += 1;
            warn!(
                "Frame does not fit into the {} byte frame buffer, skipping it",
                self.buffer.capacity()
            );
            return self.resync_from(offset + self.finder.marker_len());
        }

        self.stats.underflows += 1;
        self.phase = SyncPhase::Underflow;
        debug!(
            "Underflow with {} bytes buffered, waiting for more data",
            self.buffer.available()
        );
        false
    }

    fn on_error(&mut self, offset: usize) {
        self.stall_count += 1;
        self.stats.resyncs += 1;

        let skip = if self.stall_count > 1 {
            self.finder.marker_len() + 1
        } else {
            self.finder.marker_len()
        };
        warn!("{} frame could not be decoded, resynchronizing", self.decoder.name());
        self.resync_from(offset + skip);
    }

    /// Discards everything in front of the next marker at or after `from`.
    fn resync_from(&mut self, from: usize) -> bool {
        self.phase = SyncPhase::Resyncing;

        let next = self.locator().find_sync(from);
        self.remove_invalid(next)
    }

    /// Returns whether data is left to decode.
    fn remove_invalid(&mut self, next: Option<usize>) -> bool {
        match next {
            Some(pos) if pos > 0 => {
                info!("Removing {pos} bytes up to the next frame marker");
                self.discard(pos);
                true
            }
            _ => {
                let available = self.buffer.available();
                info!("No further frame marker, discarding {available} buffered bytes");
                self.discard(available);
                false
            }
        }
    }

    fn discard(&mut self, count: usize) {
        let removed = self.buffer.consume_front(count);
        self.stats.bytes_discarded += removed as u64;
    }

    pub fn available(&self) -> usize {
        self.buffer.available()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn decoder_name(&self) -> &'static str {
        self.decoder.name()
    }

    /// Format reported by the decoder for its most recent frame.
    pub fn decoder_frame_info(&self) -> FrameInfo {
        self.decoder.last_frame_info()
    }
}
