/// Candidate frame position inside the frame buffer.
///
/// `start` is `None` when no sync word is present at all; `end` is `None`
/// while the sync word of the following frame has not been seen yet. The
/// end is only a hint: the decoder's consumed byte count is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameWindow {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl FrameWindow {
    /// Both boundaries are known.
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Length between the two sync words, if both were found.
    pub fn span(&self) -> Option<usize> {
        Some(self.end? - self.start?)
    }
}
