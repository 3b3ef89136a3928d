#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! A [`Session`](process::session::Session) owns a bounded frame buffer and a
//! sample buffer sized from its [`StreamConfig`](config::StreamConfig).
//! Each `write()` is split into chunks. Each chunk is appended to the frame
//! buffer and then the synchronization engine runs.
//!
//! ### Synchronization
//!
//! 1. **Pre-sync**: data in front of the first frame marker is discarded
//! 2. **Decode**: the decoder gets the buffered window starting at the marker
//! 3. **Success**: the frame is routed and its bytes are removed
//! 4. **Underflow**: the engine waits for the next write
//! 5. **Error**: data up to the next marker is discarded
//!
//! A decoder reporting success without consuming data is tolerated a few
//! times, then the frame is skipped. Every decode attempt either shrinks
//! the buffer or ends the loop.
//!
//! ### Output
//!
//! Decoded frames go to a per-frame callback, to a byte sink as little-endian
//! 16-bit samples, or are discarded. With a sink, a format callback is told
//! when the sample rate or channel count changes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use framesync::process::decode::Codec;
//! use framesync::process::route::Output;
//! use framesync::process::session::Session;
//!
//! let mut session = Session::for_codec(Codec::Aac);
//! session.set_output(Output::sink(std::io::stdout()));
//! session.set_format_callback(|info| eprintln!("Format: {info}"));
//! session.begin()?;
//!
//! let data = std::fs::read("stream.aac")?;
//! for chunk in data.chunks(333) {
//!     session.write(chunk)?;
//! }
//! session.flush();
//!
//! let stats = session.stats();
//! eprintln!("{} frames, {} bytes skipped", stats.frames_decoded, stats.bytes_discarded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Buffer sizes and engine policy.
pub mod config;

/// Stream processing.
///
/// 1. **Marker search** ([`process::locate`])
/// 2. **Synchronization** ([`process::engine`])
/// 3. **Decoding** ([`process::decode`])
/// 4. **Routing** ([`process::route`])
/// 5. **Write driver** ([`process::session`])
pub mod process;

/// Data structures describing stream elements.
///
/// - **MPEG Audio Header** ([`structs::mpeg`])
/// - **ADTS Header** ([`structs::adts`])
/// - **Frame Format** ([`structs::frame_info`])
/// - **Frame Window** ([`structs::window`])
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Frame Buffer** ([`utils::frame_buffer`]): Bounded compressed data buffer
/// - **Sample Buffer** ([`utils::sample_buffer`]): Decoded PCM buffer
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **CRC Validation** ([`utils::crc`]): Error detection
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
