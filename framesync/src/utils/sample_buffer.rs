use std::collections::TryReserveError;

/// Fixed-capacity interleaved PCM buffer reused across decode calls.
///
/// Sized once per session from the worst-case decoded frame.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Vec<i16>,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0; capacity],
        }
    }

    /// Reallocates for `capacity` samples. A capacity of 0 releases the memory.
    pub fn resize(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        if capacity == 0 {
            self.release();
            return Ok(());
        }
        let mut samples = Vec::new();
        samples.try_reserve_exact(capacity)?;
        samples.resize(capacity, 0);
        self.samples = samples;
        Ok(())
    }

    pub fn release(&mut self) {
        self.samples = Vec::new();
    }

    /// The full buffer, for the decoder to write into.
    pub fn as_mut_slice(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    /// The first `count` samples, clamped to the capacity.
    pub fn samples(&self, count: usize) -> &[i16] {
        &self.samples[..count.min(self.samples.len())]
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.fill(0);
    }
}

#[test]
fn samples_are_clamped_to_capacity() {
    let mut buffer = SampleBuffer::new(4);
    buffer.as_mut_slice().copy_from_slice(&[1, -1, 2, -2]);

    assert_eq!(buffer.samples(2), &[1, -1]);
    assert_eq!(buffer.samples(10).len(), 4);

    buffer.clear();
    assert_eq!(buffer.samples(4), &[0, 0, 0, 0]);
}
