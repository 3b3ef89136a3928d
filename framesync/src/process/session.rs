use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::config::StreamConfig;
use crate::process::decode::{Codec, FrameDecoder};
use crate::process::engine::{EngineStats, SyncEngine, SyncPhase};
use crate::process::locate::SyncFinder;
use crate::process::route::{Output, Router};
use crate::structs::frame_info::FrameInfo;
use crate::utils::errors::SessionError;

/// Push-style decoding session.
///
/// Accepts compressed bytes in arbitrary pieces, buffers them, and delivers
/// decoded frames to the configured [`Output`] from within
/// [`write`](Session::write). All work happens on the caller's thread.
///
/// # Example
///
/// ```rust,no_run
/// use framesync::process::decode::Codec;
/// use framesync::process::route::Output;
/// use framesync::process::session::Session;
///
/// let mut session = Session::for_codec(Codec::Mp3);
/// session.set_output(Output::callback(|info, samples| {
///     println!("{info}: {} samples", samples.len());
/// }));
/// session.begin()?;
///
/// let stream = std::fs::read("stream.mp3")?;
/// for chunk in stream.chunks(500) {
///     session.write(chunk)?;
/// }
/// session.end();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Session {
    config: StreamConfig,
    engine: SyncEngine,
    router: Router,
    active: bool,
    last_write: Option<Instant>,
    yield_hook: Option<Box<dyn FnMut() + Send>>,
}

impl Session {
    pub fn new(
        decoder: Box<dyn FrameDecoder + Send>,
        finder: Box<dyn SyncFinder + Send>,
        config: StreamConfig,
    ) -> Self {
        Self {
            config,
            engine: SyncEngine::new(decoder, finder),
            router: Router::default(),
            active: false,
            last_write: None,
            yield_hook: None,
        }
    }

    /// Session with the codec's decoder, sync finder and default sizes.
    pub fn for_codec(codec: Codec) -> Self {
        Self::new(codec.decoder(), codec.sync_finder(), codec.default_config())
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Replaces the configuration. Refused while the session is active.
    pub fn set_config(&mut self, config: StreamConfig) -> Result<(), SessionError> {
        if self.active {
            return Err(SessionError::Active);
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_output(&mut self, output: Output) {
        self.router.set_output(output);
    }

    /// Called with the new format before samples of a changed format reach
    /// the sink or are discarded. Not used with a per-frame callback.
    pub fn set_format_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&FrameInfo) + Send + 'static,
    {
        self.router.set_format_callback(Some(Box::new(callback)));
    }

    pub fn clear_format_callback(&mut self) {
        self.router.set_format_callback(None);
    }

    /// Invoked between the chunks of a single write.
    pub fn set_yield_hook<F>(&mut self, hook: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.yield_hook = Some(Box::new(hook));
    }

    /// Acquires the decoder and allocates the buffers.
    ///
    /// An active session is ended first. On failure the session stays
    /// inactive.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.active {
            self.end();
        }

        self.config.validate()?;
        self.engine.allocate(&self.config)?;
        self.router.reset();
        self.router.set_max_write_size(self.config.max_write_size);
        self.last_write = None;
        self.active = true;

        info!(
            "{} session started: {} byte frame buffer, {} byte PCM buffer",
            self.engine.decoder_name(),
            self.config.max_frame_size,
            self.config.max_pcm_size
        );
        Ok(())
    }

    /// Buffers `data` and decodes every frame that becomes complete.
    ///
    /// Returns the number of bytes accepted. Fewer than `data.len()` means the
    /// frame buffer is full and no buffered frame could be decoded; the caller
    /// should offer the rest again later.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, SessionError> {
        if !self.active {
            return Err(SessionError::Inactive);
        }

        trace!("write {} bytes", data.len());
        self.last_write = Some(Instant::now());

        let mut accepted = 0;
        while accepted < data.len() {
            let end = (accepted + self.config.chunk_size).min(data.len());
            let taken = self.engine.append(&data[accepted..end]);

            if taken == 0 {
                let buffered = self.engine.available();
                self.engine.drain(&mut self.router, true);
                if self.engine.available() >= buffered {
                    warn!(
                        "Frame buffer full, accepted {accepted} of {} bytes",
                        data.len()
                    );
                    break;
                }
                continue;
            }

            accepted += taken;
            let force = accepted == data.len() || self.engine.is_full();
            self.engine.drain(&mut self.router, force);

            if accepted < data.len() {
                if let Some(hook) = self.yield_hook.as_mut() {
                    hook();
                }
            }
        }

        Ok(accepted)
    }

    /// Decodes the complete frames still buffered. A no-op on an inactive
    /// session.
    pub fn flush(&mut self) {
        if self.active {
            self.engine.flush(&mut self.router);
        }
    }

    /// Flushes, releases the decoder and frees the buffers.
    pub fn end(&mut self) {
        if !self.active {
            return;
        }

        self.flush();
        if self.engine.available() > 0 {
            debug!(
                "Dropping {} undecoded bytes at end of session",
                self.engine.available()
            );
        }
        self.engine.release();
        self.router.reset();
        self.last_write = None;
        self.active = false;

        info!("{} session ended", self.engine.decoder_name());
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Format of the last frame delivered to the output, zeroed before the
    /// first one.
    pub fn last_frame_info(&self) -> FrameInfo {
        self.router.last_info()
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    pub fn phase(&self) -> SyncPhase {
        self.engine.phase()
    }

    /// Bytes currently buffered.
    pub fn available(&self) -> usize {
        self.engine.available()
    }

    pub fn time_of_last_write(&self) -> Option<Instant> {
        self.last_write
    }

    pub fn time_of_last_result(&self) -> Option<Instant> {
        self.router.last_result()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.end();
    }
}
