use crate::structs::window::FrameWindow;
use crate::utils::frame_buffer::FrameBuffer;

/// Bytes a marker search steps over to get past the current frame's marker.
pub const SYNC_WORD_LEN: usize = 4;

/// Locates frame header markers in a byte window.
pub trait SyncFinder {
    /// Length of the marker the finder matches, in bytes.
    fn marker_len(&self) -> usize {
        SYNC_WORD_LEN
    }

    /// Position of the first marker in `window` at or after `offset`.
    ///
    /// Positions are indexes into `window`. `None` when no marker starts in
    /// `window[offset..]`.
    fn find_marker(&self, window: &[u8], offset: usize) -> Option<usize>;
}

fn find_pair(window: &[u8], offset: usize, mask: u8) -> Option<usize> {
    let tail = window.get(offset..)?;
    tail.windows(2)
        .position(|pair| pair[0] == 0xFF && pair[1] & mask == mask)
        .map(|pos| pos + offset)
}

/// 11-bit MPEG audio frame sync.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mp3SyncFinder;

impl SyncFinder for Mp3SyncFinder {
    fn find_marker(&self, window: &[u8], offset: usize) -> Option<usize> {
        find_pair(window, offset, 0xE0)
    }
}

/// 12-bit ADTS frame sync.
#[derive(Debug, Default, Clone, Copy)]
pub struct AacSyncFinder;

impl SyncFinder for AacSyncFinder {
    fn find_marker(&self, window: &[u8], offset: usize) -> Option<usize> {
        find_pair(window, offset, 0xF0)
    }
}

/// Marker search over the current content of a [`FrameBuffer`].
///
/// A short-lived view, created for each synchronization step. All positions
/// are absolute indexes into the buffer content.
pub struct FrameLocator<'a> {
    buffer: &'a FrameBuffer,
    finder: &'a dyn SyncFinder,
}

impl<'a> FrameLocator<'a> {
    pub fn new(buffer: &'a FrameBuffer, finder: &'a dyn SyncFinder) -> Self {
        Self { buffer, finder }
    }

    /// Next frame start at or after `offset`.
    ///
    /// An offset at or past the end of the content is "not found".
    pub fn find_sync(&self, offset: usize) -> Option<usize> {
        let data = self.buffer.data();
        if offset >= data.len() {
            return None;
        }

        self.finder
            .find_marker(data, offset)
            .filter(|&pos| pos >= offset && pos < data.len())
    }

    /// Start marker at or after `offset` and the marker following it.
    pub fn frame_window(&self, offset: usize) -> FrameWindow {
        let start = self.find_sync(offset);
        let end = start.and_then(|start| self.find_sync(start + self.finder.marker_len()));

        FrameWindow { start, end }
    }
}
