use std::collections::TryReserveError;

/// Bounded byte buffer holding compressed stream data.
///
/// Content always starts at index 0: consuming from the front compacts the
/// remaining bytes immediately, so the decoder can be handed a single
/// contiguous slice. All operations saturate instead of failing, the
/// capacity is fixed between [`resize`](FrameBuffer::resize) calls.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
    len: usize,
    clear_with_zero: bool,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            len: 0,
            clear_with_zero: false,
        }
    }

    /// Changes the capacity, discarding the current content.
    ///
    /// A capacity of 0 releases the backing memory.
    pub fn resize(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        self.len = 0;
        if capacity == 0 {
            self.release();
            return Ok(());
        }
        if self.buffer.len() != capacity {
            let mut buffer = Vec::new();
            buffer.try_reserve_exact(capacity)?;
            buffer.resize(capacity, 0);
            self.buffer = buffer;
        } else {
            self.buffer.fill(0);
        }
        Ok(())
    }

    /// Appends as much of `data` as fits and returns the number of bytes taken.
    pub fn append(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.available_for_write());
        self.buffer[self.len..self.len + count].copy_from_slice(&data[..count]);
        self.len += count;
        count
    }

    /// Removes `count` bytes from the front and moves the rest to index 0.
    pub fn consume_front(&mut self, count: usize) -> usize {
        if count >= self.len {
            let consumed = self.len;
            self.reset();
            return consumed;
        }

        self.buffer.copy_within(count..self.len, 0);
        self.len -= count;
        if self.clear_with_zero {
            self.buffer[self.len..].fill(0);
        }
        count
    }

    /// Copies up to `out.len()` bytes out of the front of the buffer and consumes them.
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len);
        out[..count].copy_from_slice(&self.buffer[..count]);
        self.consume_front(count)
    }

    /// Drops the content and the backing memory.
    pub fn release(&mut self) {
        self.len = 0;
        self.buffer = Vec::new();
    }

    pub fn reset(&mut self) {
        self.len = 0;
        if self.clear_with_zero {
            self.buffer.fill(0);
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.data().first().copied()
    }

    /// Logical content of the buffer.
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    pub fn available(&self) -> usize {
        self.len
    }

    pub fn available_for_write(&self) -> usize {
        self.buffer.len() - self.len
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.available_for_write() == 0
    }

    /// Zero the unused tail whenever data is removed.
    pub fn set_clear_with_zero(&mut self, flag: bool) {
        self.clear_with_zero = flag;
    }
}
