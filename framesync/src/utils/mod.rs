//! Utility functions and supporting infrastructure.
//!
//! Provides the stream and sample buffers, bit-level header reading, CRC
//! validation and error types.

pub mod bitstream_io;
pub mod crc;
pub mod errors;
pub mod frame_buffer;
pub mod sample_buffer;
