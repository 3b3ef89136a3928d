use std::io::{self, Write};
use std::time::Instant;

use log::{debug, error};

use crate::config::DEFAULT_MAX_WRITE_SIZE;
use crate::structs::frame_info::FrameInfo;

/// Per-frame consumer, invoked inline with the frame format and its
/// interleaved samples.
pub type FrameCallback = Box<dyn FnMut(&FrameInfo, &[i16]) + Send>;

/// Notified with the new format before samples of a changed format are written.
pub type FormatCallback = Box<dyn FnMut(&FrameInfo) + Send>;

/// Destination of decoded frames.
#[derive(Default)]
pub enum Output {
    /// Frames are decoded and dropped; format changes are still reported.
    #[default]
    Discard,
    /// Every frame is handed to the callback.
    Callback(FrameCallback),
    /// Samples are written as little-endian 16-bit bytes.
    Sink(Box<dyn Write + Send>),
}

impl Output {
    pub fn callback<F>(callback: F) -> Self
    where
        F: FnMut(&FrameInfo, &[i16]) + Send + 'static,
    {
        Output::Callback(Box::new(callback))
    }

    pub fn sink<W: Write + Send + 'static>(sink: W) -> Self {
        Output::Sink(Box::new(sink))
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Discard => write!(f, "Discard"),
            Output::Callback(_) => write!(f, "Callback"),
            Output::Sink(_) => write!(f, "Sink"),
        }
    }
}

/// Dispatches decoded frames to the session output and tracks the last
/// known stream format.
pub struct Router {
    output: Output,
    on_format: Option<FormatCallback>,
    last_info: FrameInfo,
    max_write_size: usize,
    scratch: Vec<u8>,
    last_result: Option<Instant>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            output: Output::Discard,
            on_format: None,
            last_info: FrameInfo::default(),
            max_write_size: DEFAULT_MAX_WRITE_SIZE,
            scratch: Vec::new(),
            last_result: None,
        }
    }
}

impl Router {
    pub fn set_output(&mut self, output: Output) {
        self.output = output;
    }

    pub fn set_format_callback(&mut self, callback: Option<FormatCallback>) {
        self.on_format = callback;
    }

    pub fn set_max_write_size(&mut self, size: usize) {
        self.max_write_size = size.max(1);
    }

    pub fn last_info(&self) -> FrameInfo {
        self.last_info
    }

    pub fn last_result(&self) -> Option<Instant> {
        self.last_result
    }

    /// Forgets the last known format.
    pub fn reset(&mut self) {
        self.last_info = FrameInfo::default();
        self.last_result = None;
        self.scratch = Vec::new();
    }

    /// Delivers one decoded frame. Returns `false` for frames without samples,
    /// which are skipped.
    pub fn route(&mut self, info: &FrameInfo, samples: &[i16]) -> bool {
        if info.output_samples == 0 || samples.is_empty() {
            debug!("Skipping frame without output samples");
            return false;
        }

        match &mut self.output {
            Output::Callback(callback) => callback(info, samples),
            output => {
                if info.format_changed(&self.last_info) {
                    debug!("Output format: {info}");
                    if let Some(on_format) = self.on_format.as_mut() {
                        on_format(info);
                    }
                }

                if let Output::Sink(sink) = output {
                    self.scratch.clear();
                    self.scratch
                        .extend(samples.iter().flat_map(|sample| sample.to_le_bytes()));
                    write_sliced(sink.as_mut(), &self.scratch, self.max_write_size);
                }
            }
        }

        self.last_info = *info;
        self.last_result = Some(Instant::now());
        true
    }
}

fn write_sliced(sink: &mut dyn Write, data: &[u8], max_write_size: usize) -> usize {
    let mut written = 0;
    while written < data.len() {
        let end = (written + max_write_size).min(data.len());
        match sink.write(&data[written..end]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Output sink failed: {e}");
                break;
            }
        }
    }

    if written != data.len() {
        error!(
            "Could not write result to output: {written} of {} bytes written",
            data.len()
        );
    }
    written
}
